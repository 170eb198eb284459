//! Key identifiers used by the injector: modifiers, letters, virtual key
//! codes and scan codes.

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// Virtual key codes (layout-dependent symbolic identifiers).
pub mod vk {
    /// Tab.
    pub const TAB: u16 = 0x09;
    /// Enter / Return.
    pub const RETURN: u16 = 0x0D;
    /// Either Shift key.
    pub const SHIFT: u16 = 0x10;
    /// Either Control key.
    pub const CONTROL: u16 = 0x11;
    /// Either Alt key.
    pub const MENU: u16 = 0x12;
}

/// Set-1 scan codes (physical key positions).
pub mod scan {
    /// Main Enter key. Sent with the extended flag it becomes numpad Enter.
    pub const ENTER: u16 = 0x1C;
}

/// Modifier keys that can be combined with a letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Shift.
    Shift,
    /// Control.
    Ctrl,
    /// Alt.
    Alt,
}

impl Modifier {
    /// All modifiers in canonical order.
    pub const ALL: [Self; 3] = [Self::Shift, Self::Ctrl, Self::Alt];

    /// Virtual key code for the modifier.
    pub fn vk(self) -> u16 {
        match self {
            Self::Shift => vk::SHIFT,
            Self::Ctrl => vk::CONTROL,
            Self::Alt => vk::MENU,
        }
    }

    /// Canonical upper-case name (`SHIFT`, `CTRL`, `ALT`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shift => "SHIFT",
            Self::Ctrl => "CTRL",
            Self::Alt => "ALT",
        }
    }
}

impl Display for Modifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modifier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SHIFT" => Ok(Self::Shift),
            "CTRL" => Ok(Self::Ctrl),
            "ALT" => Ok(Self::Alt),
            _ => Err(()),
        }
    }
}

/// An ASCII letter key `A`..=`Z`, stored upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Letter(u8);

impl Letter {
    /// Build from a character; case-insensitive. Returns `None` for anything
    /// that is not an ASCII letter.
    pub fn new(c: char) -> Option<Self> {
        c.is_ascii_alphabetic()
            .then(|| Self(c.to_ascii_uppercase() as u8))
    }

    /// Every letter in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (b'A'..=b'Z').map(Self)
    }

    /// The letter as an upper-case `char`.
    pub fn as_char(self) -> char {
        self.0 as char
    }

    /// Virtual key code; letters map to their upper-case ASCII value.
    pub fn vk(self) -> u16 {
        u16::from(self.0)
    }
}

impl Display for Letter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

//! Keyboard action tokens and the per-task delay between them.

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
    time::Duration,
};

use keysend::{Letter, Modifier};

use crate::{Error, Result};

/// One keyboard gesture from the fixed vocabulary.
///
/// Tokens parse case-insensitively: `enter`, `Ctrl+Enter`, `ALT+TAB`,
/// `shift+a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionToken {
    /// Placeholder for "no action"; never stored in a task.
    None,
    /// Enter.
    Enter,
    /// Ctrl held around Enter.
    CtrlEnter,
    /// Tab.
    Tab,
    /// Alt held around Tab.
    AltTab,
    /// A modifier held around a single letter.
    ModifierLetter {
        /// Held modifier.
        modifier: Modifier,
        /// Tapped letter.
        letter: Letter,
    },
}

impl ActionToken {
    /// Every valid token in display form, in picker order.
    pub fn vocabulary() -> Vec<String> {
        let fixed = [
            Self::None,
            Self::Enter,
            Self::CtrlEnter,
            Self::Tab,
            Self::AltTab,
        ];
        let chords = Modifier::ALL.into_iter().flat_map(|modifier| {
            Letter::all().map(move |letter| Self::ModifierLetter { modifier, letter })
        });
        fixed.into_iter().chain(chords).map(|t| t.to_string()).collect()
    }
}

impl Display for ActionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("NONE"),
            Self::Enter => f.write_str("ENTER"),
            Self::CtrlEnter => f.write_str("CTRL+ENTER"),
            Self::Tab => f.write_str("TAB"),
            Self::AltTab => f.write_str("ALT+TAB"),
            Self::ModifierLetter { modifier, letter } => write!(f, "{modifier}+{letter}"),
        }
    }
}

impl FromStr for ActionToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let norm = s.trim().to_ascii_uppercase();
        let unknown = || Error::UnknownToken(s.trim().to_string());
        let tok = match norm.as_str() {
            "NONE" => Self::None,
            "ENTER" => Self::Enter,
            "CTRL+ENTER" => Self::CtrlEnter,
            "TAB" => Self::Tab,
            "ALT+TAB" => Self::AltTab,
            _ => {
                let (m, k) = norm.split_once('+').ok_or_else(unknown)?;
                let modifier: Modifier = m.parse().map_err(|()| unknown())?;
                let mut chars = k.trim().chars();
                let letter = match (chars.next(), chars.next()) {
                    (Some(c), None) => Letter::new(c).ok_or_else(unknown)?,
                    _ => return Err(unknown()),
                };
                Self::ModifierLetter { modifier, letter }
            }
        };
        Ok(tok)
    }
}

/// Parse an action list for storage: `NONE` is dropped and repeated tokens
/// collapse to their first occurrence. Any unknown token rejects the whole
/// list.
pub fn parse_actions<I, S>(tokens: I) -> Result<Vec<ActionToken>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<ActionToken> = Vec::new();
    for raw in tokens {
        let tok: ActionToken = raw.as_ref().parse()?;
        if tok != ActionToken::None && !out.contains(&tok) {
            out.push(tok);
        }
    }
    Ok(out)
}

/// Seconds to pause between consecutive actions, always within
/// `[0, MAX_SECS]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ActionDelay(f64);

impl ActionDelay {
    /// Upper bound in seconds.
    pub const MAX_SECS: f64 = 5.0;
    /// Granularity of the offered choices.
    pub const STEP_SECS: f64 = 0.5;

    /// Clamp `secs` into range. NaN becomes zero.
    pub fn new(secs: f64) -> Self {
        if secs.is_nan() {
            return Self(0.0);
        }
        Self(secs.clamp(0.0, Self::MAX_SECS))
    }

    /// Offered delays: 0.5 to 5.0 in 0.5 steps.
    pub fn choices() -> Vec<Self> {
        (1..=10).map(|i| Self(f64::from(i) * Self::STEP_SECS)).collect()
    }

    /// Delay in seconds.
    pub fn secs(self) -> f64 {
        self.0
    }

    /// Delay as a duration.
    pub fn as_duration(self) -> Duration {
        Duration::from_secs_f64(self.0)
    }
}

impl Default for ActionDelay {
    fn default() -> Self {
        Self(1.0)
    }
}

impl Display for ActionDelay {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("enter".parse::<ActionToken>().unwrap(), ActionToken::Enter);
        assert_eq!(
            " Ctrl+Enter ".parse::<ActionToken>().unwrap(),
            ActionToken::CtrlEnter
        );
        assert_eq!("alt+tab".parse::<ActionToken>().unwrap(), ActionToken::AltTab);
        assert_eq!(
            "shift+q".parse::<ActionToken>().unwrap(),
            ActionToken::ModifierLetter {
                modifier: Modifier::Shift,
                letter: Letter::new('Q').unwrap(),
            }
        );
    }

    #[test]
    fn rejects_malformed_tokens() {
        for bad in ["", "RETURN", "CTRL+", "CTRL+AB", "WIN+A", "SHIFT+1", "CTRL+ENTER+A"] {
            assert!(
                matches!(bad.parse::<ActionToken>(), Err(Error::UnknownToken(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn display_round_trips_through_vocabulary() {
        let vocab = ActionToken::vocabulary();
        assert_eq!(vocab.len(), 5 + 3 * 26);
        assert_eq!(&vocab[..5], ["NONE", "ENTER", "CTRL+ENTER", "TAB", "ALT+TAB"]);
        assert!(vocab.contains(&"ALT+Z".to_string()));
        for s in &vocab {
            assert_eq!(&s.parse::<ActionToken>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn list_construction_drops_none_and_duplicates() {
        assert_eq!(parse_actions(["NONE", "TAB"]).unwrap(), vec![ActionToken::Tab]);
        assert_eq!(
            parse_actions(["enter", "TAB", "Enter", "none"]).unwrap(),
            vec![ActionToken::Enter, ActionToken::Tab]
        );
        assert!(parse_actions(Vec::<String>::new()).unwrap().is_empty());
        assert!(parse_actions(["TAB", "BOGUS"]).is_err());
    }

    #[test]
    fn delay_is_clamped() {
        assert_eq!(ActionDelay::new(-1.0).secs(), 0.0);
        assert_eq!(ActionDelay::new(7.0).secs(), 5.0);
        assert_eq!(ActionDelay::new(2.5).secs(), 2.5);
        assert_eq!(ActionDelay::new(f64::NAN).secs(), 0.0);
        assert_eq!(ActionDelay::default().secs(), 1.0);
        assert_eq!(ActionDelay::new(1.5).as_duration(), Duration::from_millis(1500));
    }

    #[test]
    fn delay_choices_step_by_half_seconds() {
        let secs: Vec<f64> = ActionDelay::choices().into_iter().map(ActionDelay::secs).collect();
        assert_eq!(secs.len(), 10);
        assert_eq!(secs.first(), Some(&0.5));
        assert_eq!(secs.last(), Some(&5.0));
    }
}

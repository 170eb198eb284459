//! Synthetic keyboard input for the focused window.
//!
//! An [`Injector`] posts raw key events (scan code, virtual key, Unicode
//! unit, or the legacy text/key path). [`KeySender`] layers the fallback
//! encodings on top: different target applications listen for different
//! physical or virtual representations of the same logical key, so typing,
//! Enter and Tab each run an ordered [`fallback::Chain`] and stop at the
//! first encoding the OS accepts.
//!
//! Events always go to whatever window owns the foreground; callers are
//! responsible for focusing the target first.
#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]
use std::{sync::Arc, thread, time::Duration};

use fallback::Chain;
use tracing::{debug, trace, warn};

mod error;
pub mod keys;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
#[cfg(windows)]
mod sys;

pub use error::{Error, Result};
pub use keys::{Letter, Modifier, scan, vk};

/// Unicode carriage return, used as a last-resort Enter encoding.
const UNICODE_CR: u16 = 0x0D;
/// Unicode horizontal tab.
const UNICODE_TAB: u16 = 0x09;

/// Raw injection primitives. Each call reports whether the OS accepted the
/// event(s).
pub trait Injector: Send + Sync {
    /// Post a physical key event by scan code.
    fn key_scan(&self, code: u16, key_up: bool, extended: bool) -> Result<()>;

    /// Post a key event by virtual key code.
    fn key_virtual(&self, vk: u16, key_up: bool) -> Result<()>;

    /// Post a down+up pair for every UTF-16 unit in `units`, as one batch.
    /// Returns the number of events the OS reports as injected.
    fn unicode_units(&self, units: &[u16]) -> Result<usize>;

    /// Legacy "send literal text" path, used only when direct injection is
    /// rejected.
    fn legacy_text(&self, text: &str) -> Result<()>;

    /// Legacy single-key press (down+up) by virtual key code.
    fn legacy_key(&self, vk: u16) -> Result<()>;
}

/// The platform injector: `SendInput` on Windows. Elsewhere there is no
/// injection backend and every primitive fails with [`Error::Unsupported`].
pub fn system_injector() -> Arc<dyn Injector> {
    #[cfg(windows)]
    let injector: Arc<dyn Injector> = Arc::new(sys::SendInputInjector);
    #[cfg(not(windows))]
    let injector: Arc<dyn Injector> = Arc::new(Unsupported);
    injector
}

/// Injector for platforms without an input backend.
#[cfg(not(windows))]
struct Unsupported;

#[cfg(not(windows))]
impl Injector for Unsupported {
    fn key_scan(&self, _code: u16, _key_up: bool, _extended: bool) -> Result<()> {
        Err(Error::Unsupported)
    }
    fn key_virtual(&self, _vk: u16, _key_up: bool) -> Result<()> {
        Err(Error::Unsupported)
    }
    fn unicode_units(&self, _units: &[u16]) -> Result<usize> {
        Err(Error::Unsupported)
    }
    fn legacy_text(&self, _text: &str) -> Result<()> {
        Err(Error::Unsupported)
    }
    fn legacy_key(&self, _vk: u16) -> Result<()> {
        Err(Error::Unsupported)
    }
}

/// Pauses used when composing taps and modifier chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTimings {
    /// Time a tapped key is held between its down and up events.
    pub tap_hold: Duration,
    /// Pause after a modifier transition so the target registers it.
    pub modifier_settle: Duration,
}

impl Default for KeyTimings {
    fn default() -> Self {
        Self {
            tap_hold: Duration::from_millis(20),
            modifier_settle: Duration::from_millis(40),
        }
    }
}

/// Primitive-level helper shared by the sender and its chains.
#[derive(Clone)]
struct Taps {
    /// Event sink.
    injector: Arc<dyn Injector>,
    /// Pause configuration.
    timings: KeyTimings,
}

impl Taps {
    /// Log and flatten a primitive result.
    fn ok(what: &'static str, r: Result<()>) -> bool {
        match r {
            Ok(()) => true,
            Err(e) => {
                debug!(what, error = %e, "inject_failed");
                false
            }
        }
    }

    /// Single scan-code event.
    fn scan(&self, code: u16, key_up: bool, extended: bool) -> bool {
        trace!(code, key_up, extended, "inject_scan");
        Self::ok("scan", self.injector.key_scan(code, key_up, extended))
    }

    /// Single virtual-key event.
    fn virtual_key(&self, vk: u16, key_up: bool) -> bool {
        trace!(vk, key_up, "inject_vk");
        Self::ok("vk", self.injector.key_virtual(vk, key_up))
    }

    /// Inject `units` and check the OS accepted exactly two events per unit.
    fn unicode(&self, units: &[u16]) -> bool {
        if units.is_empty() {
            return true;
        }
        let expected = units.len() * 2;
        match self.injector.unicode_units(units) {
            Ok(sent) if sent == expected => true,
            Ok(sent) => {
                debug!(expected, sent, "unicode_injection_short");
                false
            }
            Err(e) => {
                debug!(error = %e, "unicode_injection_failed");
                false
            }
        }
    }

    /// Scan-code tap: down, hold, up. The up event is sent even if the
    /// down was rejected so no key is left latched.
    fn tap_scan(&self, code: u16, extended: bool) -> bool {
        let down = self.scan(code, false, extended);
        thread::sleep(self.timings.tap_hold);
        let up = self.scan(code, true, extended);
        down && up
    }

    /// Virtual-key tap: down, hold, up.
    fn tap_virtual(&self, vk: u16) -> bool {
        let down = self.virtual_key(vk, false);
        thread::sleep(self.timings.tap_hold);
        let up = self.virtual_key(vk, true);
        down && up
    }

    /// Legacy single-key press.
    fn legacy_key(&self, vk: u16) -> bool {
        trace!(vk, "inject_legacy_key");
        Self::ok("legacy_key", self.injector.legacy_key(vk))
    }
}

/// Keyboard sender with layered fallbacks for text, Enter and Tab.
#[derive(Clone)]
pub struct KeySender {
    /// Primitive helper.
    taps: Taps,
    /// Unicode first, legacy text second.
    typing: Arc<Chain<str>>,
    /// Main scan, virtual key, numpad scan, Unicode CR, legacy key.
    enter: Arc<Chain<()>>,
    /// Virtual key, Unicode tab, legacy key.
    tab: Arc<Chain<()>>,
}

impl KeySender {
    /// Create a sender over an injector with the given timings.
    pub fn new(injector: Arc<dyn Injector>, timings: KeyTimings) -> Self {
        let taps = Taps { injector, timings };
        Self {
            typing: Arc::new(typing_chain(&taps)),
            enter: Arc::new(enter_chain(&taps)),
            tab: Arc::new(tab_chain(&taps)),
            taps,
        }
    }

    /// Timings in use.
    pub fn timings(&self) -> KeyTimings {
        self.taps.timings
    }

    /// Physical key event by scan code.
    pub fn inject_key(&self, code: u16, key_up: bool, extended: bool) -> bool {
        self.taps.scan(code, key_up, extended)
    }

    /// Key event by virtual key code.
    pub fn inject_virtual_key(&self, vk: u16, key_up: bool) -> bool {
        self.taps.virtual_key(vk, key_up)
    }

    /// Character-level down+up event pair(s), independent of layout.
    pub fn inject_unicode_char(&self, ch: char) -> bool {
        let mut buf = [0u16; 2];
        self.taps.unicode(ch.encode_utf16(&mut buf))
    }

    /// Type `message` into the foreground window.
    ///
    /// Tries whole-message Unicode injection first; when the OS accepts fewer
    /// events than expected, falls back to the legacy text path. Returns
    /// `false` only when both fail.
    ///
    /// The legacy path retypes the whole message, so a partially accepted
    /// Unicode batch leaves its prefix in the target twice.
    pub fn type_text(&self, message: &str) -> bool {
        match self.typing.run(message) {
            Some(path) => {
                debug!(path, chars = message.chars().count(), "typed_text");
                true
            }
            None => {
                warn!(chars = message.chars().count(), "type_text_failed");
                false
            }
        }
    }

    /// Press Enter using the first representation the OS accepts.
    pub fn press_enter_robust(&self) -> bool {
        let won = self.enter.run(&());
        if won.is_none() {
            warn!("enter_failed_all_paths");
        }
        won.is_some()
    }

    /// Press Tab: virtual-key tap, then Unicode tab, then legacy send.
    pub fn press_tab_robust(&self) -> bool {
        let won = self.tab.run(&());
        if won.is_none() {
            warn!("tab_failed_all_paths");
        }
        won.is_some()
    }

    /// Virtual-key tap (down, short hold, up).
    pub fn tap_virtual(&self, vk: u16) -> bool {
        self.taps.tap_virtual(vk)
    }

    /// Virtual-key tap falling back to the legacy single-key path. Used while
    /// a modifier is held, where a Unicode encoding would lose the chord.
    pub fn tap_or_legacy(&self, vk: u16) -> bool {
        self.taps.tap_virtual(vk) || self.taps.legacy_key(vk)
    }

    /// Tap a letter key.
    pub fn tap_letter(&self, letter: Letter) -> bool {
        self.taps.tap_virtual(letter.vk())
    }

    /// Press a modifier down.
    pub fn modifier_down(&self, m: Modifier) -> bool {
        self.taps.virtual_key(m.vk(), false)
    }

    /// Release a modifier.
    pub fn modifier_up(&self, m: Modifier) -> bool {
        self.taps.virtual_key(m.vk(), true)
    }

    /// Hold `m` around `f`, with settle pauses on both transitions.
    ///
    /// The modifier is always released, whatever `f` returns. The result is
    /// `true` only when the press, `f`, and the release all succeeded.
    pub fn with_modifier<F>(&self, m: Modifier, f: F) -> bool
    where
        F: FnOnce(&Self) -> bool,
    {
        let settle = self.taps.timings.modifier_settle;
        let down = self.modifier_down(m);
        thread::sleep(settle);
        let body = f(self);
        thread::sleep(settle);
        let up = self.modifier_up(m);
        if !(down && up) {
            debug!(modifier = %m, down, up, "modifier_transition_failed");
        }
        down && body && up
    }

    /// A no-op modifier tap. Counts as recent user input for the OS
    /// foreground-change heuristics without producing text.
    pub fn nudge(&self) -> bool {
        self.taps.tap_virtual(vk::SHIFT)
    }
}

/// Typing chain: Unicode batch, then legacy text.
fn typing_chain(taps: &Taps) -> Chain<str> {
    let unicode = taps.clone();
    let legacy = taps.clone();
    Chain::<str>::new("typing")
        .step("unicode", move |text: &str| {
            let units: Vec<u16> = text.encode_utf16().collect();
            unicode.unicode(&units)
        })
        .step("legacy_text", move |text: &str| {
            Taps::ok("legacy_text", legacy.injector.legacy_text(text))
        })
}

/// Enter chain, in the order target applications most commonly accept.
fn enter_chain(taps: &Taps) -> Chain<()> {
    let (main, virt, numpad, uni, legacy) = (
        taps.clone(),
        taps.clone(),
        taps.clone(),
        taps.clone(),
        taps.clone(),
    );
    Chain::<()>::new("enter")
        .step("scan_main", move |_| main.tap_scan(scan::ENTER, false))
        .step("virtual_key", move |_| virt.tap_virtual(vk::RETURN))
        .step("scan_numpad", move |_| numpad.tap_scan(scan::ENTER, true))
        .step("unicode_cr", move |_| uni.unicode(&[UNICODE_CR]))
        .step("legacy_key", move |_| legacy.legacy_key(vk::RETURN))
}

/// Tab chain.
fn tab_chain(taps: &Taps) -> Chain<()> {
    let (virt, uni, legacy) = (taps.clone(), taps.clone(), taps.clone());
    Chain::<()>::new("tab")
        .step("virtual_key", move |_| virt.tap_virtual(vk::TAB))
        .step("unicode_tab", move |_| uni.unicode(&[UNICODE_TAB]))
        .step("legacy_key", move |_| legacy.legacy_key(vk::TAB))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{InjectEvent, MockInjector};

    fn sender() -> (Arc<MockInjector>, KeySender) {
        let mock = Arc::new(MockInjector::new());
        let timings = KeyTimings {
            tap_hold: Duration::ZERO,
            modifier_settle: Duration::ZERO,
        };
        let ks = KeySender::new(mock.clone(), timings);
        (mock, ks)
    }

    #[test]
    fn type_text_prefers_unicode() {
        let (mock, ks) = sender();
        assert!(ks.type_text("hi"));
        assert_eq!(mock.typed_text(), "hi");
        assert!(
            mock.events()
                .iter()
                .all(|e| matches!(e, InjectEvent::Unicode { .. }))
        );
    }

    #[test]
    fn short_unicode_batch_falls_back_to_legacy() {
        let (mock, ks) = sender();
        mock.set_unicode_budget(Some(3));
        assert!(ks.type_text("hello"));
        assert!(
            mock.events()
                .contains(&InjectEvent::LegacyText("hello".into()))
        );
        // Three accepted events are "h" down, "h" up and "e" down.
        assert_eq!(mock.typed_text(), "hehello");
    }

    #[test]
    fn type_text_fails_when_both_paths_fail() {
        let (mock, ks) = sender();
        mock.set_fail_unicode(true);
        mock.set_fail_legacy(true);
        assert!(!ks.type_text("x"));
    }

    #[test]
    fn surrogate_pairs_count_two_units() {
        let (mock, ks) = sender();
        assert!(ks.inject_unicode_char('😀'));
        assert_eq!(mock.events().len(), 4);
    }

    #[test]
    fn enter_prefers_main_scan_code() {
        let (mock, ks) = sender();
        assert!(ks.press_enter_robust());
        assert_eq!(
            mock.events(),
            vec![
                InjectEvent::Scan {
                    code: scan::ENTER,
                    key_up: false,
                    extended: false
                },
                InjectEvent::Scan {
                    code: scan::ENTER,
                    key_up: true,
                    extended: false
                },
            ]
        );
    }

    #[test]
    fn enter_walks_chain_to_unicode_cr() {
        let (mock, ks) = sender();
        mock.set_fail_scan(true);
        mock.set_fail_virtual(true);
        assert!(ks.press_enter_robust());
        let events = mock.events();
        assert!(events.contains(&InjectEvent::Unicode {
            unit: UNICODE_CR,
            key_up: false
        }));
        assert!(!events.iter().any(|e| matches!(e, InjectEvent::LegacyKey(_))));
    }

    #[test]
    fn enter_last_resort_is_legacy_key() {
        let (mock, ks) = sender();
        mock.set_fail_scan(true);
        mock.set_fail_virtual(true);
        mock.set_fail_unicode(true);
        assert!(ks.press_enter_robust());
        assert_eq!(mock.events().last(), Some(&InjectEvent::LegacyKey(vk::RETURN)));

        mock.set_fail_legacy(true);
        assert!(!ks.press_enter_robust());
    }

    #[test]
    fn tab_falls_back_to_unicode() {
        let (mock, ks) = sender();
        mock.set_fail_virtual(true);
        assert!(ks.press_tab_robust());
        assert!(mock.events().contains(&InjectEvent::Unicode {
            unit: UNICODE_TAB,
            key_up: true
        }));
    }

    #[test]
    fn modifier_released_even_when_body_fails() {
        let (mock, ks) = sender();
        assert!(!ks.with_modifier(Modifier::Ctrl, |_| false));
        assert_eq!(
            mock.events(),
            vec![
                InjectEvent::Virtual {
                    vk: vk::CONTROL,
                    key_up: false
                },
                InjectEvent::Virtual {
                    vk: vk::CONTROL,
                    key_up: true
                },
            ]
        );
    }
}

//! Runs a task's action list against the key sender.

use std::{
    thread,
    time::{Duration, Instant},
};

use keysend::{KeySender, Modifier, vk};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::action::ActionToken;

/// Poll interval used by cancellable sleeps.
const CANCEL_POLL_INTERVAL_MS: u64 = 2;

/// Sleep for `d` unless `cancel` fires first. Returns `false` when cancelled.
pub(crate) fn sleep_cancellable(d: Duration, cancel: &CancellationToken) -> bool {
    let deadline = Instant::now() + d;
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(Duration::from_millis(CANCEL_POLL_INTERVAL_MS)));
    }
}

/// Result of running an action list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionsReport {
    /// Actions that ran, in order, with whether every event was accepted.
    pub results: Vec<(ActionToken, bool)>,
    /// True when the run stopped early because of cancellation.
    pub cancelled: bool,
}

impl ActionsReport {
    /// Actions whose injection was rejected.
    pub fn failed(&self) -> Vec<ActionToken> {
        self.results
            .iter()
            .filter(|(_, ok)| !ok)
            .map(|(t, _)| *t)
            .collect()
    }
}

/// Executes action tokens as keystrokes.
#[derive(Clone)]
pub struct ActionInterpreter {
    keys: KeySender,
}

impl ActionInterpreter {
    /// Interpreter over a key sender.
    pub fn new(keys: KeySender) -> Self {
        Self { keys }
    }

    /// Perform one action. Returns whether every injected event was accepted.
    pub fn perform(&self, token: ActionToken) -> bool {
        trace!(action = %token, "action_perform");
        match token {
            ActionToken::None => true,
            ActionToken::Enter => self.keys.press_enter_robust(),
            ActionToken::CtrlEnter => self
                .keys
                .with_modifier(Modifier::Ctrl, KeySender::press_enter_robust),
            ActionToken::Tab => self.keys.press_tab_robust(),
            ActionToken::AltTab => self
                .keys
                .with_modifier(Modifier::Alt, |k| k.tap_or_legacy(vk::TAB)),
            ActionToken::ModifierLetter { modifier, letter } => self
                .keys
                .with_modifier(modifier, |k| k.tap_letter(letter)),
        }
    }

    /// Run `actions` in order with `delay` between consecutive ones (not after
    /// the last). A failed action does not stop the rest.
    pub fn run(
        &self,
        actions: &[ActionToken],
        delay: Duration,
        cancel: &CancellationToken,
    ) -> ActionsReport {
        let mut report = ActionsReport::default();
        for (i, &token) in actions.iter().enumerate() {
            if i > 0 && !sleep_cancellable(delay, cancel) {
                report.cancelled = true;
                break;
            }
            let ok = self.perform(token);
            if !ok {
                warn!(action = %token, "action_failed");
            }
            report.results.push((token, ok));
        }
        debug!(
            ran = report.results.len(),
            failed = report.failed().len(),
            cancelled = report.cancelled,
            "actions_finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use keysend::{
        KeyTimings, Letter,
        mock::{InjectEvent, MockInjector},
        scan,
    };

    use super::*;

    fn setup() -> (Arc<MockInjector>, ActionInterpreter) {
        let mock = Arc::new(MockInjector::new());
        let keys = KeySender::new(
            mock.clone(),
            KeyTimings {
                tap_hold: Duration::ZERO,
                modifier_settle: Duration::ZERO,
            },
        );
        (mock, ActionInterpreter::new(keys))
    }

    fn vkey(vk: u16, key_up: bool) -> InjectEvent {
        InjectEvent::Virtual { vk, key_up }
    }

    #[test]
    fn ctrl_enter_wraps_enter_in_ctrl() {
        let (mock, it) = setup();
        assert!(it.perform(ActionToken::CtrlEnter));
        let ev = mock.events();
        assert_eq!(ev.first(), Some(&vkey(vk::CONTROL, false)));
        assert_eq!(ev.last(), Some(&vkey(vk::CONTROL, true)));
        assert!(ev.contains(&InjectEvent::Scan {
            code: scan::ENTER,
            key_up: false,
            extended: false
        }));
    }

    #[test]
    fn alt_tab_falls_back_to_legacy_inside_chord() {
        let (mock, it) = setup();
        mock.set_fail_virtual(true);
        // Modifier transitions fail too, so the whole action reports failure,
        // but the legacy Tab still went out.
        assert!(!it.perform(ActionToken::AltTab));
        assert_eq!(mock.events(), vec![InjectEvent::LegacyKey(vk::TAB)]);
    }

    #[test]
    fn modifier_letter_taps_letter() {
        let (mock, it) = setup();
        let letter = Letter::new('s').unwrap();
        assert!(it.perform(ActionToken::ModifierLetter {
            modifier: Modifier::Shift,
            letter
        }));
        assert_eq!(
            mock.events(),
            vec![
                vkey(vk::SHIFT, false),
                vkey(letter.vk(), false),
                vkey(letter.vk(), true),
                vkey(vk::SHIFT, true),
            ]
        );
    }

    #[test]
    fn delay_only_between_actions() {
        let (mock, it) = setup();
        let delay = Duration::from_millis(60);
        let start = Instant::now();
        let report = it.run(
            &[ActionToken::Enter, ActionToken::CtrlEnter],
            delay,
            &CancellationToken::new(),
        );
        let elapsed = start.elapsed();
        assert!(report.failed().is_empty());
        assert!(elapsed >= delay);
        assert!(elapsed < delay * 3, "no trailing delay: {elapsed:?}");

        let timed = mock.timed_events();
        let enter_done = timed
            .iter()
            .position(|(_, e)| *e == vkey(vk::CONTROL, false))
            .unwrap();
        let gap = timed[enter_done].0 - timed[enter_done - 1].0;
        assert!(gap >= delay, "gap {gap:?}");
    }

    #[test]
    fn failures_do_not_stop_later_actions() {
        let (mock, it) = setup();
        mock.set_fail_scan(true);
        mock.set_fail_virtual(true);
        mock.set_fail_unicode(true);
        mock.set_fail_legacy(true);
        let report = it.run(
            &[ActionToken::Enter, ActionToken::Tab],
            Duration::ZERO,
            &CancellationToken::new(),
        );
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.failed(), vec![ActionToken::Enter, ActionToken::Tab]);
    }

    #[test]
    fn cancellation_interrupts_delay() {
        let (_mock, it) = setup();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let start = Instant::now();
        let report = it.run(
            &[ActionToken::Enter, ActionToken::Tab],
            Duration::from_secs(5),
            &cancel,
        );
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(report.cancelled);
        assert_eq!(report.results.len(), 1);
    }
}

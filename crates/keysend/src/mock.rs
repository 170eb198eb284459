//! Recording injector for tests (enabled with the `test-utils` feature).
//!
//! Only events the mock "accepts" are recorded, so a rejected primitive
//! leaves no trace. Each failure knob rejects one whole encoding family.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};

use parking_lot::Mutex;

use crate::{Error, Injector, Result};

/// One accepted input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectEvent {
    /// Scan-code event.
    Scan {
        /// Scan code.
        code: u16,
        /// Key-up flag.
        key_up: bool,
        /// Extended-key flag.
        extended: bool,
    },
    /// Virtual-key event.
    Virtual {
        /// Virtual key code.
        vk: u16,
        /// Key-up flag.
        key_up: bool,
    },
    /// Unicode unit event.
    Unicode {
        /// UTF-16 unit.
        unit: u16,
        /// Key-up flag.
        key_up: bool,
    },
    /// Legacy literal text.
    LegacyText(String),
    /// Legacy single-key press.
    LegacyKey(u16),
}

/// Injector that records accepted events with their timestamps.
#[derive(Default)]
pub struct MockInjector {
    /// Accepted events in order.
    log: Mutex<Vec<(Instant, InjectEvent)>>,
    /// Reject scan-code events.
    fail_scan: AtomicBool,
    /// Reject virtual-key events.
    fail_virtual: AtomicBool,
    /// Reject all Unicode events.
    fail_unicode: AtomicBool,
    /// Reject legacy text and keys.
    fail_legacy: AtomicBool,
    /// Accept at most this many Unicode events per batch.
    unicode_budget: Mutex<Option<usize>>,
}

impl MockInjector {
    /// Create a mock that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject scan-code events.
    pub fn set_fail_scan(&self, v: bool) {
        self.fail_scan.store(v, Ordering::SeqCst);
    }

    /// Reject virtual-key events.
    pub fn set_fail_virtual(&self, v: bool) {
        self.fail_virtual.store(v, Ordering::SeqCst);
    }

    /// Reject Unicode events.
    pub fn set_fail_unicode(&self, v: bool) {
        self.fail_unicode.store(v, Ordering::SeqCst);
    }

    /// Reject legacy text and keys.
    pub fn set_fail_legacy(&self, v: bool) {
        self.fail_legacy.store(v, Ordering::SeqCst);
    }

    /// Reject every encoding.
    pub fn set_fail_all(&self, v: bool) {
        self.set_fail_scan(v);
        self.set_fail_virtual(v);
        self.set_fail_unicode(v);
        self.set_fail_legacy(v);
    }

    /// Cap the number of Unicode events accepted per batch (simulates a
    /// partially blocked injection).
    pub fn set_unicode_budget(&self, budget: Option<usize>) {
        *self.unicode_budget.lock() = budget;
    }

    /// Accepted events in order.
    pub fn events(&self) -> Vec<InjectEvent> {
        self.log.lock().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Accepted events with the instant each was recorded.
    pub fn timed_events(&self) -> Vec<(Instant, InjectEvent)> {
        self.log.lock().clone()
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        self.log.lock().clear();
    }

    /// Text reconstructed from Unicode key-downs and legacy text.
    pub fn typed_text(&self) -> String {
        let mut units = Vec::new();
        let mut out = String::new();
        for e in self.events() {
            match e {
                InjectEvent::Unicode {
                    unit,
                    key_up: false,
                } => units.push(unit),
                InjectEvent::LegacyText(s) => {
                    out.push_str(&String::from_utf16_lossy(&units));
                    units.clear();
                    out.push_str(&s);
                }
                _ => {}
            }
        }
        out.push_str(&String::from_utf16_lossy(&units));
        out
    }

    /// Append an accepted event.
    fn record(&self, e: InjectEvent) {
        self.log.lock().push((Instant::now(), e));
    }

    /// Shared rejection for single events.
    fn check(flag: &AtomicBool) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(Error::Rejected {
                expected: 1,
                sent: 0,
            })
        } else {
            Ok(())
        }
    }
}

impl Injector for MockInjector {
    fn key_scan(&self, code: u16, key_up: bool, extended: bool) -> Result<()> {
        Self::check(&self.fail_scan)?;
        self.record(InjectEvent::Scan {
            code,
            key_up,
            extended,
        });
        Ok(())
    }

    fn key_virtual(&self, vk: u16, key_up: bool) -> Result<()> {
        Self::check(&self.fail_virtual)?;
        self.record(InjectEvent::Virtual { vk, key_up });
        Ok(())
    }

    fn unicode_units(&self, units: &[u16]) -> Result<usize> {
        if self.fail_unicode.load(Ordering::SeqCst) {
            return Ok(0);
        }
        let budget = (*self.unicode_budget.lock()).unwrap_or(usize::MAX);
        let mut sent = 0;
        for &unit in units {
            for key_up in [false, true] {
                if sent == budget {
                    return Ok(sent);
                }
                self.record(InjectEvent::Unicode { unit, key_up });
                sent += 1;
            }
        }
        Ok(sent)
    }

    fn legacy_text(&self, text: &str) -> Result<()> {
        Self::check(&self.fail_legacy)?;
        self.record(InjectEvent::LegacyText(text.to_string()));
        Ok(())
    }

    fn legacy_key(&self, vk: u16) -> Result<()> {
        Self::check(&self.fail_legacy)?;
        self.record(InjectEvent::LegacyKey(vk));
        Ok(())
    }
}

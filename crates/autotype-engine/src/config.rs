//! Engine timing configuration, loaded from RON.
//!
//! Every field has a default, so `()` is a valid config file:
//!
//! ```ron
//! (tick_ms: 1000, focus_settle_ms: 250, flash_count: 5)
//! ```

use std::{fs, path::Path, time::Duration};

use keysend::KeyTimings;
use serde::{Deserialize, Serialize};
use winops::FocusTimings;

use crate::{Error, Result};

/// Timings for the driver, the pipeline and the fallback chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Scheduler tick interval.
    pub tick_ms: u64,
    /// How long after its scheduled time a task is still eligible.
    pub due_window_ms: u64,
    /// Pause between acquiring focus and typing.
    pub focus_settle_ms: u64,
    /// Pause between typing and the first action.
    pub action_lead_in_ms: u64,
    /// Key hold time for taps.
    pub key_tap_ms: u64,
    /// Pause around modifier transitions.
    pub modifier_settle_ms: u64,
    /// Pause after restoring a minimized window.
    pub restore_settle_ms: u64,
    /// Pause before verifying a foreground request.
    pub foreground_settle_ms: u64,
    /// Topmost hold during the topmost flick.
    pub topmost_hold_ms: u64,
    /// Flashes emitted when focus cannot be acquired.
    pub flash_count: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            due_window_ms: 2000,
            focus_settle_ms: 200,
            action_lead_in_ms: 300,
            key_tap_ms: 20,
            modifier_settle_ms: 40,
            restore_settle_ms: 150,
            foreground_settle_ms: 60,
            topmost_hold_ms: 40,
            flash_count: 3,
        }
    }
}

impl EngineConfig {
    /// Parse a RON document.
    pub fn from_ron(s: &str) -> Result<Self> {
        ron::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a RON file.
    pub fn load(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        Self::from_ron(&s)
    }

    /// Config with every pause at zero and a fast tick. Useful for tests.
    pub fn immediate() -> Self {
        Self {
            tick_ms: 10,
            focus_settle_ms: 0,
            action_lead_in_ms: 0,
            key_tap_ms: 0,
            modifier_settle_ms: 0,
            restore_settle_ms: 0,
            foreground_settle_ms: 0,
            topmost_hold_ms: 0,
            ..Self::default()
        }
    }

    /// Scheduler tick interval.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Due window.
    pub fn due_window(&self) -> Duration {
        Duration::from_millis(self.due_window_ms)
    }

    /// Pause between focus and typing.
    pub fn focus_settle(&self) -> Duration {
        Duration::from_millis(self.focus_settle_ms)
    }

    /// Pause between typing and the first action.
    pub fn action_lead_in(&self) -> Duration {
        Duration::from_millis(self.action_lead_in_ms)
    }

    /// Key sender timings.
    pub fn key_timings(&self) -> KeyTimings {
        KeyTimings {
            tap_hold: Duration::from_millis(self.key_tap_ms),
            modifier_settle: Duration::from_millis(self.modifier_settle_ms),
        }
    }

    /// Focus chain timings.
    pub fn focus_timings(&self) -> FocusTimings {
        FocusTimings {
            restore_settle: Duration::from_millis(self.restore_settle_ms),
            foreground_settle: Duration::from_millis(self.foreground_settle_ms),
            topmost_hold: Duration::from_millis(self.topmost_hold_ms),
            flash_count: self.flash_count,
        }
    }
}

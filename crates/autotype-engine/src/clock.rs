use std::time::Duration;

use parking_lot::Mutex;
use time::{OffsetDateTime, UtcOffset};

/// Source of the current wall-clock time for due checks and alarms.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> OffsetDateTime;
}

/// The system clock at a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    /// Offset applied to every reading.
    offset: UtcOffset,
}

impl SystemClock {
    /// Clock in the local offset, falling back to UTC when it cannot be
    /// determined. The offset is captured once; on Unix this only succeeds
    /// while the process is still single-threaded.
    pub fn local() -> Self {
        Self {
            offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }

    /// Offset the clock reports in.
    pub fn offset(&self) -> UtcOffset {
        self.offset
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::local()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// Clock that only moves when told to. Used by tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    /// Clock stopped at `start`.
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jump to `t`.
    pub fn set(&self, t: OffsetDateTime) {
        *self.now.lock() = t;
    }

    /// Move forward by `d`.
    pub fn advance(&self, d: Duration) {
        let mut g = self.now.lock();
        *g += d;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock()
    }
}

//! Countdown alarms. Alarms have no side effects beyond a one-time
//! notification when they reach zero, and persist until removed.

use std::fmt::{self, Display, Formatter};

use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{Error, Result};

/// Remaining time under which an active alarm counts as urgent.
const URGENT_SECS: i64 = 10;

/// Stable identifier of an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlarmId(pub u64);

impl Display for AlarmId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A countdown to a fixed time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    /// Identifier.
    pub id: AlarmId,
    /// When the alarm finishes.
    pub time: OffsetDateTime,
    /// Text shown with the alarm.
    pub message: String,
}

/// Derived display state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    /// Time left, always positive.
    Active(Duration),
    /// Remaining time reached zero.
    Finished,
}

impl AlarmState {
    /// State of an alarm at `time` as seen at `now`.
    pub fn at(time: OffsetDateTime, now: OffsetDateTime) -> Self {
        let remaining = time - now;
        if remaining.is_positive() {
            Self::Active(remaining)
        } else {
            Self::Finished
        }
    }

    /// Active with less than ten seconds left.
    pub fn is_urgent(self) -> bool {
        matches!(self, Self::Active(d) if d < Duration::seconds(URGENT_SECS))
    }
}

/// Formats as `d.hh:mm:ss`, or `Finished`.
impl Display for AlarmState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finished => f.write_str("Finished"),
            Self::Active(d) => {
                let total = d.whole_seconds();
                let (days, rem) = (total / 86_400, total % 86_400);
                write!(
                    f,
                    "{days}.{:02}:{:02}:{:02}",
                    rem / 3600,
                    rem % 3600 / 60,
                    rem % 60
                )
            }
        }
    }
}

/// An alarm together with its state at the last tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmView {
    /// The alarm.
    pub alarm: Alarm,
    /// State at the last tick.
    pub state: AlarmState,
}

struct Entry {
    alarm: Alarm,
    state: AlarmState,
    announced: bool,
}

/// Owns the alarm list and recomputes every countdown on each tick.
#[derive(Default)]
pub struct AlarmTracker {
    next_id: u64,
    entries: Vec<Entry>,
}

impl AlarmTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alarm. Blank messages are rejected.
    pub fn add(
        &mut self,
        time: OffsetDateTime,
        message: impl Into<String>,
        now: OffsetDateTime,
    ) -> Result<AlarmId> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }
        self.next_id += 1;
        let id = AlarmId(self.next_id);
        debug!(alarm = %id, at = %time, "alarm_added");
        self.entries.push(Entry {
            alarm: Alarm { id, time, message },
            state: AlarmState::at(time, now),
            announced: false,
        });
        Ok(id)
    }

    /// Delete an alarm.
    pub fn remove(&mut self, id: AlarmId) -> Result<Alarm> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.alarm.id == id)
            .ok_or(Error::AlarmNotFound(id))?;
        Ok(self.entries.remove(pos).alarm)
    }

    /// Recompute every countdown. Returns the alarms that finished for the
    /// first time on this tick.
    pub fn tick(&mut self, now: OffsetDateTime) -> Vec<Alarm> {
        let mut finished = Vec::new();
        for e in &mut self.entries {
            e.state = AlarmState::at(e.alarm.time, now);
            if e.state == AlarmState::Finished && !e.announced {
                e.announced = true;
                finished.push(e.alarm.clone());
            }
        }
        finished
    }

    /// Every alarm with its last computed state.
    pub fn snapshot(&self) -> Vec<AlarmView> {
        self.entries
            .iter()
            .map(|e| AlarmView {
                alarm: e.alarm.clone(),
                state: e.state,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    const T0: OffsetDateTime = datetime!(2026-03-01 12:00 UTC);

    #[test]
    fn countdown_formatting() {
        let s = |secs| AlarmState::at(T0 + Duration::seconds(secs), T0).to_string();
        assert_eq!(s(303), "0.00:05:03");
        assert_eq!(s(90_061), "1.01:01:01");
        assert_eq!(s(0), "Finished");
        assert_eq!(s(-5), "Finished");
    }

    #[test]
    fn urgency_threshold() {
        assert!(AlarmState::Active(Duration::seconds(9)).is_urgent());
        assert!(!AlarmState::Active(Duration::seconds(10)).is_urgent());
        assert!(!AlarmState::Finished.is_urgent());
    }

    #[test]
    fn finish_is_announced_once_and_alarm_persists() {
        let mut t = AlarmTracker::new();
        let id = t.add(T0 + Duration::seconds(2), "tea", T0).unwrap();
        assert!(t.tick(T0 + Duration::seconds(1)).is_empty());
        let done = t.tick(T0 + Duration::seconds(2));
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, id);
        assert!(t.tick(T0 + Duration::seconds(3)).is_empty());
        assert_eq!(t.snapshot()[0].state, AlarmState::Finished);
        t.remove(id).unwrap();
        assert!(t.snapshot().is_empty());
        assert!(matches!(t.remove(id), Err(Error::AlarmNotFound(_))));
    }

    #[test]
    fn blank_alarm_message_is_rejected() {
        let mut t = AlarmTracker::new();
        assert!(matches!(t.add(T0, "  ", T0), Err(Error::EmptyMessage)));
    }
}

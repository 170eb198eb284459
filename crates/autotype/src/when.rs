//! Time arguments: clock times, relative durations and alarm specs.

use std::{str::FromStr, time::Duration};

use time::{OffsetDateTime, Time, macros::format_description};

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(s: &str) -> Result<Time, String> {
    let s = s.trim();
    Time::parse(s, format_description!("[hour padding:none]:[minute]:[second]"))
        .or_else(|_| Time::parse(s, format_description!("[hour padding:none]:[minute]")))
        .map_err(|_| format!("expected HH:MM or HH:MM:SS, got {s:?}"))
}

/// Next instant at clock time `t`: today if it has not passed yet, otherwise
/// tomorrow.
pub fn next_occurrence(now: OffsetDateTime, t: Time) -> OffsetDateTime {
    let today = now.replace_time(t);
    if today < now {
        today + time::Duration::DAY
    } else {
        today
    }
}

/// A point in time given either as a clock time or relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    /// Next occurrence of a wall-clock time.
    At(Time),
    /// Offset from now.
    In(Duration),
}

impl When {
    /// Absolute time relative to `now`.
    pub fn resolve(self, now: OffsetDateTime) -> OffsetDateTime {
        match self {
            Self::At(t) => next_occurrence(now, t),
            Self::In(d) => now + d,
        }
    }
}

impl FromStr for When {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(t) = parse_clock(s) {
            return Ok(Self::At(t));
        }
        humantime::parse_duration(s.trim())
            .map(Self::In)
            .map_err(|_| format!("expected HH:MM[:SS] or a duration like 5m, got {s:?}"))
    }
}

/// `--alarm TIME=MESSAGE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmArg {
    /// When the alarm finishes.
    pub when: When,
    /// Alarm text.
    pub message: String,
}

impl FromStr for AlarmArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (when, message) = s
            .split_once('=')
            .ok_or_else(|| format!("expected TIME=MESSAGE, got {s:?}"))?;
        Ok(Self {
            when: when.parse()?,
            message: message.to_string(),
        })
    }
}

use std::fmt::{self, Display, Formatter};

use time::OffsetDateTime;
use winops::WindowTarget;

use crate::{
    Error, Result,
    action::{ActionDelay, ActionToken, parse_actions},
};

/// Stable identifier of a pending task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A validated, pending unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask {
    /// Identifier assigned by the store.
    pub id: TaskId,
    /// When the task becomes due.
    pub scheduled_time: OffsetDateTime,
    /// Text to type; never blank.
    pub message: String,
    /// Window to type into.
    pub target: WindowTarget,
    /// Gestures to run after typing; never contains `NONE` or repeats.
    pub actions: Vec<ActionToken>,
    /// Pause between consecutive actions.
    pub action_delay: ActionDelay,
}

/// Unvalidated task input as it arrives from a user surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    /// When the task should run. Past times are accepted.
    pub scheduled_time: OffsetDateTime,
    /// Text to type.
    pub message: String,
    /// Window to type into.
    pub target: WindowTarget,
    /// Raw action tokens.
    pub actions: Vec<String>,
    /// Requested delay in seconds; clamped on validation.
    pub delay_secs: f64,
}

impl TaskDraft {
    /// Draft with no actions and the default delay.
    pub fn new(
        scheduled_time: OffsetDateTime,
        message: impl Into<String>,
        target: WindowTarget,
    ) -> Self {
        Self {
            scheduled_time,
            message: message.into(),
            target,
            actions: Vec::new(),
            delay_secs: ActionDelay::default().secs(),
        }
    }

    /// Replace the action tokens.
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the delay between actions.
    pub fn with_delay(mut self, secs: f64) -> Self {
        self.delay_secs = secs;
        self
    }

    /// Validate into a task with the given id.
    pub(crate) fn validate(self, id: TaskId) -> Result<ScheduledTask> {
        if self.message.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }
        Ok(ScheduledTask {
            id,
            scheduled_time: self.scheduled_time,
            message: self.message,
            target: self.target,
            actions: parse_actions(&self.actions)?,
            action_delay: ActionDelay::new(self.delay_secs),
        })
    }
}

use std::fmt::{self, Display, Formatter};

use time::OffsetDateTime;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::{
    Error, Result,
    alarm::AlarmId,
    pipeline::ExecutionReport,
    task::TaskId,
};

/// Why the scheduler stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last pending task finished.
    Drained,
    /// A caller asked to stop.
    User,
}

/// Status updates emitted by the engine. `Display` gives the human-readable
/// status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// A task was scheduled.
    TaskAdded {
        /// New task id.
        id: TaskId,
        /// Due time.
        at: OffsetDateTime,
        /// Target title.
        title: String,
    },
    /// A pending task was edited.
    TaskEdited(TaskId),
    /// A task was removed by a caller.
    TaskRemoved(TaskId),
    /// A task reached a terminal state. Sent exactly once per execution.
    Executed(ExecutionReport),
    /// The scheduler started.
    Started {
        /// Tasks pending at start.
        pending: usize,
    },
    /// Start was refused because nothing is pending.
    StartRefused,
    /// The scheduler stopped.
    Stopped(StopReason),
    /// An alarm's countdown reached zero.
    AlarmFinished {
        /// Alarm id.
        id: AlarmId,
        /// Alarm message.
        message: String,
    },
}

impl Display for StatusEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaskAdded { id, at, title } => {
                write!(f, "Added schedule {id} for {at} -> '{title}'")
            }
            Self::TaskEdited(id) => write!(f, "Updated schedule {id}"),
            Self::TaskRemoved(id) => write!(f, "Removed schedule {id}"),
            Self::Executed(r) => write!(f, "{r}"),
            Self::Started { pending } => {
                write!(f, "Scheduler started with {pending} pending task(s).")
            }
            Self::StartRefused => f.write_str("Cannot start. The schedule is empty."),
            Self::Stopped(StopReason::Drained) => {
                f.write_str("All scheduled tasks complete. Scheduler stopped.")
            }
            Self::Stopped(StopReason::User) => f.write_str("Scheduler stopped."),
            Self::AlarmFinished { id, message } => write!(f, "Alarm {id} finished: {message}"),
        }
    }
}

/// Sends status events to whoever drives the engine.
#[derive(Clone)]
pub struct StatusDispatcher {
    tx: UnboundedSender<StatusEvent>,
}

impl StatusDispatcher {
    /// Create a dispatcher over an event channel.
    pub fn new(tx: UnboundedSender<StatusEvent>) -> Self {
        Self { tx }
    }

    /// Log and send one event.
    pub fn send(&self, event: StatusEvent) -> Result<()> {
        info!(status = %event, "status");
        self.tx.send(event).map_err(|_| Error::ChannelClosed)
    }

    /// Send, ignoring a closed receiver. Used on paths with no caller to
    /// report to (worker completions, ticks).
    pub fn notify(&self, event: StatusEvent) {
        if self.send(event).is_err() {
            debug!("status_receiver_closed");
        }
    }
}

use std::{io, result::Result as StdResult};

use thiserror::Error;

use crate::{alarm::AlarmId, task::TaskId};

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Errors returned by the engine's public operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An action token outside the fixed vocabulary.
    #[error("unknown action token: '{0}'")]
    UnknownToken(String),

    /// Message is empty or whitespace only.
    #[error("message cannot be empty")]
    EmptyMessage,

    /// No pending task with this id.
    #[error("no such task: {0}")]
    TaskNotFound(TaskId),

    /// The task is executing and cannot be edited.
    #[error("task {0} is executing")]
    TaskBusy(TaskId),

    /// Start requested with nothing pending.
    #[error("Cannot start. The schedule is empty.")]
    EmptySchedule,

    /// No alarm with this id.
    #[error("no such alarm: {0}")]
    AlarmNotFound(AlarmId),

    /// The work queue or status channel has been closed.
    #[error("engine channel closed")]
    ChannelClosed,

    /// Malformed configuration.
    #[error("config error: {0}")]
    Config(String),

    /// I/O failure while loading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Window enumeration failed.
    #[error("window error: {0}")]
    Resolve(#[from] winops::Error),
}

/// Why a single execution did not complete. Every variant is caught at the
/// pipeline boundary and turned into an [`crate::Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// Stale handle and no visible window with the title.
    #[error("window '{title}' not found")]
    NotFound {
        /// Title searched for.
        title: String,
    },

    /// The target runs at a higher privilege level than this process.
    #[error("window '{title}' belongs to an elevated process")]
    PermissionDenied {
        /// Target title.
        title: String,
    },

    /// Every foreground strategy failed.
    #[error("could not bring '{title}' to the foreground")]
    FocusUnattainable {
        /// Target title.
        title: String,
    },

    /// Both typing paths were rejected.
    #[error("text injection rejected")]
    InjectionFailed,

    /// The task was removed while executing.
    #[error("cancelled")]
    Cancelled,

    /// The pipeline panicked.
    #[error("execution panicked: {0}")]
    Panicked(String),
}

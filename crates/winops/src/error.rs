use thiserror::Error;

/// Errors that can occur during window operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The stored handle is stale and no visible window has the exact title.
    #[error("window not found: '{title}'")]
    NotFound {
        /// Title that was searched for.
        title: String,
    },

    /// Window operations are not available on this platform.
    #[error("window operations unsupported on this platform")]
    Unsupported,

    /// An OS call failed.
    #[error("OS error: {0}")]
    Os(String),
}

pub type Result<T> = std::result::Result<T, Error>;

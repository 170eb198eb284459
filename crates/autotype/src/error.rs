//! Error handling for the autotype binary.

use std::{io, result};

use thiserror::Error;

/// Convenient result type for autotype commands.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrapper for standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Errors surfaced by the scheduling engine.
    #[error("{0}")]
    Engine(#[from] autotype_engine::Error),
    /// Window enumeration failed.
    #[error("Window error: {0}")]
    WinOps(#[from] winops::Error),
}

//! Error types and result alias for the keysend crate.
use std::result::Result as StdResult;

use thiserror::Error;

/// Crate-local `Result` alias using the injection error type.
pub type Result<T> = StdResult<T, Error>;

/// Errors that can occur while synthesizing or posting input events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The OS accepted fewer events than were submitted. This is how a
    /// higher-integrity target or a blocking hook shows up.
    #[error("input rejected: {sent} of {expected} events injected")]
    Rejected {
        /// Number of events submitted.
        expected: usize,
        /// Number of events the OS reported as injected.
        sent: usize,
    },
    /// The character has no key mapping in the active keyboard layout.
    #[error("no key mapping for {0:?}")]
    Unmappable(char),
    /// Input injection is not available on this platform.
    #[error("input injection unsupported on this platform")]
    Unsupported,
}

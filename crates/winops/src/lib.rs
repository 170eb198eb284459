//! winops: window resolution and foreground acquisition.
//!
//! A [`WindowTarget`] remembers a window by title and last-known handle;
//! [`resolve`] turns it back into a live handle, re-discovering the window
//! by exact title when the handle went stale. [`FocusAcquirer`] then tries
//! to bring the window to the foreground so injected input lands there.
//!
//! OS primitives sit behind the [`WinOps`] trait. The Win32 backend is only
//! compiled on Windows; elsewhere [`SystemWinOps`] reports nothing.

mod error;
pub mod focus;
mod ops;
mod resolve;
#[cfg(windows)]
mod sys;
mod window;

pub use error::{Error, Result};
pub use focus::{FocusAcquirer, FocusTimings};
#[cfg(any(test, feature = "test-utils"))]
pub use ops::{MOCK_SELF_THREAD, MockWinOps};
pub use ops::{SystemWinOps, WinOps};
pub use resolve::{Resolution, resolve, visible_windows};
pub use window::{WindowHandle, WindowInfo, WindowTarget};

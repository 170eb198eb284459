//! Mapping a remembered [`WindowTarget`] to a live window handle.

use tracing::{debug, trace};

use crate::{Error, Result, WinOps, WindowHandle, WindowInfo, WindowTarget};

/// Outcome of a successful resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Live handle for the target.
    pub handle: WindowHandle,
    /// True when the stored handle was stale and the window was found again
    /// by title.
    pub rediscovered: bool,
}

/// Resolve `target` without touching it.
///
/// A non-null handle that still names a live window wins. Otherwise the
/// visible windows are scanned for an exact, case-sensitive title match and
/// the first match is returned.
pub fn resolve(ops: &dyn WinOps, target: &WindowTarget) -> Result<Resolution> {
    if !target.handle.is_null() && ops.is_window_alive(target.handle) {
        trace!(handle = %target.handle, "resolve_handle_live");
        return Ok(Resolution {
            handle: target.handle,
            rediscovered: false,
        });
    }
    let found = ops
        .list_windows()?
        .into_iter()
        .find(|w| w.title == target.title);
    match found {
        Some(w) => {
            debug!(title = %target.title, stale = %target.handle, fresh = %w.handle, "resolve_rediscovered");
            Ok(Resolution {
                handle: w.handle,
                rediscovered: true,
            })
        }
        None => {
            debug!(title = %target.title, "resolve_not_found");
            Err(Error::NotFound {
                title: target.title.clone(),
            })
        }
    }
}

impl WindowTarget {
    /// Resolve and write a re-discovered handle back into this target.
    pub fn resolve(&mut self, ops: &dyn WinOps) -> Result<WindowHandle> {
        let r = resolve(ops, self)?;
        if r.rediscovered {
            self.heal(r.handle);
        }
        Ok(r.handle)
    }
}

/// Visible windows a user could pick as a target: titled, and not owned by
/// this process.
pub fn visible_windows(ops: &dyn WinOps) -> Result<Vec<WindowInfo>> {
    let me = std::process::id();
    Ok(ops
        .list_windows()?
        .into_iter()
        .filter(|w| w.pid != me && !w.title.trim().is_empty())
        .collect())
}

//! Win32 window primitives.

use std::{ffi::c_void, mem};

use tracing::debug;
use windows::Win32::{
    Foundation::{BOOL, CloseHandle, FALSE, HANDLE, HWND, LPARAM, TRUE},
    Security::{GetTokenInformation, TOKEN_ELEVATION, TOKEN_QUERY, TokenElevation},
    System::Threading::{
        AttachThreadInput, GetCurrentProcess, GetCurrentThreadId, OpenProcess, OpenProcessToken,
        PROCESS_QUERY_LIMITED_INFORMATION,
    },
    UI::WindowsAndMessaging::{
        EnumWindows, FLASHW_ALL, FLASHWINFO, FlashWindowEx, GetForegroundWindow, GetWindowTextW,
        GetWindowThreadProcessId, HWND_NOTOPMOST, HWND_TOPMOST, IsIconic, IsWindow,
        IsWindowVisible, SW_RESTORE, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SetForegroundWindow,
        SetWindowPos, ShowWindow,
    },
};

use crate::{Error, Result, WindowHandle, WindowInfo};

/// Longest title read back from a window.
const TITLE_MAX: usize = 512;

fn hwnd(h: WindowHandle) -> HWND {
    HWND(h.0 as *mut c_void)
}

fn handle(h: HWND) -> WindowHandle {
    WindowHandle(h.0 as isize)
}

unsafe extern "system" fn collect(h: HWND, lparam: LPARAM) -> BOOL {
    // SAFETY: `lparam` carries the `Vec` passed by `list_windows`, which
    // outlives the enumeration.
    let out = unsafe { &mut *(lparam.0 as *mut Vec<HWND>) };
    out.push(h);
    TRUE
}

fn title_of(h: HWND) -> String {
    let mut buf = [0u16; TITLE_MAX];
    // SAFETY: the buffer is valid for its whole length.
    let len = unsafe { GetWindowTextW(h, &mut buf) };
    let len = usize::try_from(len).unwrap_or(0).min(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

fn pid_of(h: HWND) -> u32 {
    let mut pid = 0u32;
    // SAFETY: `pid` is a valid out pointer.
    unsafe { GetWindowThreadProcessId(h, Some(&mut pid)) };
    pid
}

pub(crate) fn list_windows() -> Result<Vec<WindowInfo>> {
    let mut hwnds: Vec<HWND> = Vec::new();
    // SAFETY: the callback only pushes into `hwnds`, which lives for the call.
    unsafe { EnumWindows(Some(collect), LPARAM(&mut hwnds as *mut Vec<HWND> as isize)) }
        .map_err(|e| Error::Os(e.to_string()))?;
    let mut out = Vec::new();
    for h in hwnds {
        // SAFETY: plain handle query.
        if !unsafe { IsWindowVisible(h) }.as_bool() {
            continue;
        }
        let title = title_of(h);
        if title.trim().is_empty() {
            continue;
        }
        out.push(WindowInfo {
            title,
            handle: handle(h),
            pid: pid_of(h),
        });
    }
    Ok(out)
}

pub(crate) fn is_window_alive(h: WindowHandle) -> bool {
    // SAFETY: plain handle query; stale handles return false.
    !h.is_null() && unsafe { IsWindow(hwnd(h)) }.as_bool()
}

pub(crate) fn is_minimized(h: WindowHandle) -> bool {
    // SAFETY: plain handle query.
    unsafe { IsIconic(hwnd(h)) }.as_bool()
}

pub(crate) fn foreground_window() -> WindowHandle {
    // SAFETY: no arguments.
    handle(unsafe { GetForegroundWindow() })
}

/// Elevation of a process token.
fn token_elevated(process: HANDLE) -> Option<bool> {
    let mut token = HANDLE::default();
    // SAFETY: `token` is a valid out pointer.
    unsafe { OpenProcessToken(process, TOKEN_QUERY, &mut token) }.ok()?;
    let mut elevation = TOKEN_ELEVATION::default();
    let mut len = 0u32;
    // SAFETY: the buffer is a `TOKEN_ELEVATION` and its size is passed.
    let r = unsafe {
        GetTokenInformation(
            token,
            TokenElevation,
            Some(&mut elevation as *mut TOKEN_ELEVATION as *mut c_void),
            mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut len,
        )
    };
    // SAFETY: `token` was opened above.
    let _ = unsafe { CloseHandle(token) };
    r.ok().map(|()| elevation.TokenIsElevated != 0)
}

/// A process whose token cannot be queried is treated as elevated: access is
/// denied exactly when it runs at a higher integrity level.
pub(crate) fn is_elevated(h: WindowHandle) -> bool {
    let pid = pid_of(hwnd(h));
    // SAFETY: plain value arguments.
    let process = match unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, FALSE, pid) } {
        Ok(p) => p,
        Err(e) => {
            debug!(pid, error = %e, "open_process_denied");
            return true;
        }
    };
    let elevated = token_elevated(process).unwrap_or(true);
    // SAFETY: `process` was opened above.
    let _ = unsafe { CloseHandle(process) };
    elevated
}

pub(crate) fn is_self_elevated() -> bool {
    // SAFETY: the pseudo handle needs no closing.
    token_elevated(unsafe { GetCurrentProcess() }).unwrap_or(false)
}

pub(crate) fn restore(h: WindowHandle) -> bool {
    // SAFETY: plain handle call.
    unsafe { ShowWindow(hwnd(h), SW_RESTORE) }.as_bool()
}

pub(crate) fn set_foreground(h: WindowHandle) -> bool {
    // SAFETY: plain handle call.
    unsafe { SetForegroundWindow(hwnd(h)) }.as_bool()
}

pub(crate) fn window_thread(h: WindowHandle) -> Option<u32> {
    // SAFETY: the pid out pointer is optional.
    let tid = unsafe { GetWindowThreadProcessId(hwnd(h), None) };
    (tid != 0).then_some(tid)
}

pub(crate) fn current_thread() -> u32 {
    // SAFETY: no arguments.
    unsafe { GetCurrentThreadId() }
}

pub(crate) fn attach_thread_input(from: u32, to: u32, attach: bool) -> bool {
    // SAFETY: plain value arguments.
    unsafe { AttachThreadInput(from, to, BOOL::from(attach)) }.as_bool()
}

pub(crate) fn set_topmost(h: WindowHandle, on: bool) -> bool {
    let after = if on { HWND_TOPMOST } else { HWND_NOTOPMOST };
    // SAFETY: plain handle call.
    unsafe {
        SetWindowPos(
            hwnd(h),
            after,
            0,
            0,
            0,
            0,
            SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
        )
    }
    .is_ok()
}

pub(crate) fn flash(h: WindowHandle, count: u32) {
    let info = FLASHWINFO {
        cbSize: mem::size_of::<FLASHWINFO>() as u32,
        hwnd: hwnd(h),
        dwFlags: FLASHW_ALL,
        uCount: count,
        dwTimeout: 0,
    };
    // SAFETY: `info` is fully initialized and sized.
    let _ = unsafe { FlashWindowEx(&info) };
}

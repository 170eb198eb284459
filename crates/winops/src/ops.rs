use crate::{Result, WindowHandle, WindowInfo};

/// Trait abstraction over the OS window primitives the resolver and the focus
/// chain consume. Implemented by [`SystemWinOps`] and, for tests, by
/// `MockWinOps`.
pub trait WinOps: Send + Sync {
    /// Visible top-level windows with a non-empty title, in z-order.
    fn list_windows(&self) -> Result<Vec<WindowInfo>>;
    /// Whether `h` still names a live window.
    fn is_window_alive(&self, h: WindowHandle) -> bool;
    /// Whether `h` is minimized.
    fn is_minimized(&self, h: WindowHandle) -> bool;
    /// Current foreground window (null when none).
    fn foreground_window(&self) -> WindowHandle;
    /// Whether the process owning `h` runs elevated.
    fn is_elevated(&self, h: WindowHandle) -> bool;
    /// Whether this process runs elevated.
    fn is_self_elevated(&self) -> bool;
    /// Restore a minimized window.
    fn restore(&self, h: WindowHandle) -> bool;
    /// Ask the OS to make `h` the foreground window.
    fn set_foreground(&self, h: WindowHandle) -> bool;
    /// Thread that owns `h`.
    fn window_thread(&self, h: WindowHandle) -> Option<u32>;
    /// Calling thread id.
    fn current_thread(&self) -> u32;
    /// Attach or detach the input queues of two threads.
    fn attach_thread_input(&self, from: u32, to: u32, attach: bool) -> bool;
    /// Set or clear the topmost z-order band for `h`.
    fn set_topmost(&self, h: WindowHandle, on: bool) -> bool;
    /// Flash the caption and taskbar button of `h`.
    fn flash(&self, h: WindowHandle, count: u32);
}

/// Platform window operations. On non-Windows targets every query reports
/// nothing and listing fails with [`crate::Error::Unsupported`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWinOps;

#[cfg(windows)]
impl WinOps for SystemWinOps {
    fn list_windows(&self) -> Result<Vec<WindowInfo>> {
        crate::sys::list_windows()
    }
    fn is_window_alive(&self, h: WindowHandle) -> bool {
        crate::sys::is_window_alive(h)
    }
    fn is_minimized(&self, h: WindowHandle) -> bool {
        crate::sys::is_minimized(h)
    }
    fn foreground_window(&self) -> WindowHandle {
        crate::sys::foreground_window()
    }
    fn is_elevated(&self, h: WindowHandle) -> bool {
        crate::sys::is_elevated(h)
    }
    fn is_self_elevated(&self) -> bool {
        crate::sys::is_self_elevated()
    }
    fn restore(&self, h: WindowHandle) -> bool {
        crate::sys::restore(h)
    }
    fn set_foreground(&self, h: WindowHandle) -> bool {
        crate::sys::set_foreground(h)
    }
    fn window_thread(&self, h: WindowHandle) -> Option<u32> {
        crate::sys::window_thread(h)
    }
    fn current_thread(&self) -> u32 {
        crate::sys::current_thread()
    }
    fn attach_thread_input(&self, from: u32, to: u32, attach: bool) -> bool {
        crate::sys::attach_thread_input(from, to, attach)
    }
    fn set_topmost(&self, h: WindowHandle, on: bool) -> bool {
        crate::sys::set_topmost(h, on)
    }
    fn flash(&self, h: WindowHandle, count: u32) {
        crate::sys::flash(h, count)
    }
}

#[cfg(not(windows))]
impl WinOps for SystemWinOps {
    fn list_windows(&self) -> Result<Vec<WindowInfo>> {
        Err(crate::Error::Unsupported)
    }
    fn is_window_alive(&self, _h: WindowHandle) -> bool {
        false
    }
    fn is_minimized(&self, _h: WindowHandle) -> bool {
        false
    }
    fn foreground_window(&self) -> WindowHandle {
        WindowHandle::NULL
    }
    fn is_elevated(&self, _h: WindowHandle) -> bool {
        false
    }
    fn is_self_elevated(&self) -> bool {
        false
    }
    fn restore(&self, _h: WindowHandle) -> bool {
        false
    }
    fn set_foreground(&self, _h: WindowHandle) -> bool {
        false
    }
    fn window_thread(&self, _h: WindowHandle) -> Option<u32> {
        None
    }
    fn current_thread(&self) -> u32 {
        0
    }
    fn attach_thread_input(&self, _from: u32, _to: u32, _attach: bool) -> bool {
        false
    }
    fn set_topmost(&self, _h: WindowHandle, _on: bool) -> bool {
        false
    }
    fn flash(&self, _h: WindowHandle, _count: u32) {}
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MOCK_SELF_THREAD, MockWinOps};

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use std::{
        collections::HashSet,
        sync::{
            Arc,
            atomic::{AtomicBool, AtomicUsize, Ordering},
        },
    };

    use parking_lot::Mutex;

    use super::WinOps;
    use crate::{Error, Result, WindowHandle, WindowInfo};

    /// Thread id the mock reports for the calling thread.
    pub const MOCK_SELF_THREAD: u32 = 1;

    /// In-memory desktop for tests.
    ///
    /// A handle is alive while a window with that handle is in the list. The
    /// owning thread of a window is its pid. `set_foreground` succeeds unless
    /// refusals are queued or the foreground is locked.
    #[derive(Clone, Default)]
    pub struct MockWinOps {
        calls: Arc<Mutex<Vec<String>>>,
        windows: Arc<Mutex<Vec<WindowInfo>>>,
        foreground: Arc<Mutex<WindowHandle>>,
        minimized: Arc<Mutex<HashSet<WindowHandle>>>,
        elevated: Arc<Mutex<HashSet<WindowHandle>>>,
        self_elevated: Arc<AtomicBool>,
        foreground_refusals: Arc<AtomicUsize>,
        foreground_locked: Arc<AtomicBool>,
        fail_list: Arc<AtomicBool>,
        flashes: Arc<AtomicUsize>,
    }

    impl MockWinOps {
        pub fn new() -> Self {
            Self::default()
        }
        /// Replace the desktop's window list.
        pub fn set_windows(&self, wins: Vec<WindowInfo>) {
            *self.windows.lock() = wins;
        }
        /// Add one window and return its info.
        pub fn add_window(&self, title: &str, handle: isize, pid: u32) -> WindowInfo {
            let info = WindowInfo {
                title: title.to_string(),
                handle: WindowHandle(handle),
                pid,
            };
            self.windows.lock().push(info.clone());
            info
        }
        /// Remove the window with this handle (closing it).
        pub fn close_window(&self, h: WindowHandle) {
            self.windows.lock().retain(|w| w.handle != h);
        }
        pub fn set_foreground_window(&self, h: WindowHandle) {
            *self.foreground.lock() = h;
        }
        pub fn set_minimized(&self, h: WindowHandle, v: bool) {
            let mut g = self.minimized.lock();
            if v {
                g.insert(h);
            } else {
                g.remove(&h);
            }
        }
        pub fn set_elevated(&self, h: WindowHandle, v: bool) {
            let mut g = self.elevated.lock();
            if v {
                g.insert(h);
            } else {
                g.remove(&h);
            }
        }
        pub fn set_self_elevated(&self, v: bool) {
            self.self_elevated.store(v, Ordering::SeqCst);
        }
        /// Refuse the next `n` foreground requests.
        pub fn refuse_foreground(&self, n: usize) {
            self.foreground_refusals.store(n, Ordering::SeqCst);
        }
        /// Refuse every foreground request.
        pub fn set_foreground_locked(&self, v: bool) {
            self.foreground_locked.store(v, Ordering::SeqCst);
        }
        pub fn set_fail_list(&self, v: bool) {
            self.fail_list.store(v, Ordering::SeqCst);
        }
        /// Number of flash requests.
        pub fn flashes(&self) -> usize {
            self.flashes.load(Ordering::SeqCst)
        }
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
        pub fn calls_contains(&self, s: &str) -> bool {
            self.calls.lock().iter().any(|x| x == s)
        }
        /// Number of recorded calls with this exact name.
        pub fn call_count(&self, s: &str) -> usize {
            self.calls.lock().iter().filter(|x| *x == s).count()
        }
        fn note(&self, s: impl Into<String>) {
            self.calls.lock().push(s.into());
        }
        fn pid_of(&self, h: WindowHandle) -> Option<u32> {
            self.windows
                .lock()
                .iter()
                .find(|w| w.handle == h)
                .map(|w| w.pid)
        }
    }

    impl WinOps for MockWinOps {
        fn list_windows(&self) -> Result<Vec<WindowInfo>> {
            self.note("list_windows");
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(Error::Os("enumeration failed".into()));
            }
            Ok(self.windows.lock().clone())
        }
        fn is_window_alive(&self, h: WindowHandle) -> bool {
            self.pid_of(h).is_some()
        }
        fn is_minimized(&self, h: WindowHandle) -> bool {
            self.minimized.lock().contains(&h)
        }
        fn foreground_window(&self) -> WindowHandle {
            *self.foreground.lock()
        }
        fn is_elevated(&self, h: WindowHandle) -> bool {
            self.elevated.lock().contains(&h)
        }
        fn is_self_elevated(&self) -> bool {
            self.self_elevated.load(Ordering::SeqCst)
        }
        fn restore(&self, h: WindowHandle) -> bool {
            self.note("restore");
            self.minimized.lock().remove(&h)
        }
        fn set_foreground(&self, h: WindowHandle) -> bool {
            self.note("set_foreground");
            if self.foreground_locked.load(Ordering::SeqCst) || self.pid_of(h).is_none() {
                return false;
            }
            let refused = self
                .foreground_refusals
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if refused {
                return false;
            }
            *self.foreground.lock() = h;
            true
        }
        fn window_thread(&self, h: WindowHandle) -> Option<u32> {
            self.pid_of(h)
        }
        fn current_thread(&self) -> u32 {
            MOCK_SELF_THREAD
        }
        fn attach_thread_input(&self, from: u32, to: u32, attach: bool) -> bool {
            let verb = if attach { "attach" } else { "detach" };
            self.note(format!("{verb}:{from}->{to}"));
            true
        }
        fn set_topmost(&self, _h: WindowHandle, on: bool) -> bool {
            self.note(if on { "topmost_on" } else { "topmost_off" });
            true
        }
        fn flash(&self, _h: WindowHandle, count: u32) {
            self.note(format!("flash:{count}"));
            self.flashes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

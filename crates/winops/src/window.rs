use std::fmt::{self, Display, Formatter};

/// Opaque OS window handle.
///
/// The OS owns the window; this is an observed value that may go stale when
/// the window closes or is recreated. Zero is the null handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    /// The null handle.
    pub const NULL: Self = Self(0);

    /// True for the null handle.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Display for WindowHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// A visible, titled top-level window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Window title at enumeration time.
    pub title: String,
    /// OS handle.
    pub handle: WindowHandle,
    /// Owning process id.
    pub pid: u32,
}

/// Remembered reference to a window: the title shown when it was picked and
/// the last handle it was seen with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowTarget {
    /// Display title at capture time; used to re-discover a stale handle.
    pub title: String,
    /// Last-known handle; may be stale or null.
    pub handle: WindowHandle,
}

impl WindowTarget {
    /// Target with a known handle.
    pub fn new(title: impl Into<String>, handle: WindowHandle) -> Self {
        Self {
            title: title.into(),
            handle,
        }
    }

    /// Target known only by title; resolution always searches.
    pub fn by_title(title: impl Into<String>) -> Self {
        Self::new(title, WindowHandle::NULL)
    }

    /// Record a freshly resolved handle.
    pub fn heal(&mut self, handle: WindowHandle) {
        self.handle = handle;
    }
}

impl From<&WindowInfo> for WindowTarget {
    fn from(w: &WindowInfo) -> Self {
        Self::new(w.title.clone(), w.handle)
    }
}

impl Display for WindowTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.title, self.handle)
    }
}

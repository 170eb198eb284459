use std::sync::Arc;

use keysend::Injector;
use winops::{SystemWinOps, WinOps};

use crate::clock::{Clock, SystemClock};

/// Groups the OS-facing collaborators the engine is built over, so tests can
/// swap every one of them for a double.
#[derive(Clone)]
pub struct Services {
    /// Window primitives.
    pub winops: Arc<dyn WinOps>,
    /// Keyboard primitives.
    pub injector: Arc<dyn Injector>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

impl Services {
    /// The real platform collaborators. Call before spawning threads so the
    /// clock can capture the local offset.
    pub fn system() -> Self {
        Self {
            winops: Arc::new(SystemWinOps),
            injector: keysend::system_injector(),
            clock: Arc::new(SystemClock::local()),
        }
    }
}

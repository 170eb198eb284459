//! Foreground acquisition.
//!
//! Foreground changes are guarded by OS heuristics, so a single request is
//! often refused. [`FocusAcquirer`] runs an ordered chain of strategies and
//! stops at the first one after which the target owns the foreground.

use std::{sync::Arc, thread, time::Duration};

use fallback::Chain;
use keysend::KeySender;
use tracing::{debug, info, warn};

use crate::{WinOps, WindowHandle};

/// Pauses and counts used by the focus chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTimings {
    /// Pause after restoring a minimized window.
    pub restore_settle: Duration,
    /// Pause between a foreground request and checking its effect.
    pub foreground_settle: Duration,
    /// How long the target stays topmost during the topmost flick.
    pub topmost_hold: Duration,
    /// Flashes emitted when every strategy failed.
    pub flash_count: u32,
}

impl Default for FocusTimings {
    fn default() -> Self {
        Self {
            restore_settle: Duration::from_millis(150),
            foreground_settle: Duration::from_millis(60),
            topmost_hold: Duration::from_millis(40),
            flash_count: 3,
        }
    }
}

/// Shared state captured by every focus step.
#[derive(Clone)]
struct Focus {
    ops: Arc<dyn WinOps>,
    keys: KeySender,
    timings: FocusTimings,
}

impl Focus {
    /// True once `h` owns the foreground.
    fn holds(&self, h: WindowHandle) -> bool {
        self.ops.foreground_window() == h
    }

    /// Request the foreground, let it settle, then verify.
    fn request(&self, h: WindowHandle) -> bool {
        let accepted = self.ops.set_foreground(h);
        thread::sleep(self.timings.foreground_settle);
        if !accepted {
            debug!(handle = %h, "set_foreground_refused");
        }
        self.holds(h)
    }

    /// Un-minimize, then check whether the window already has the foreground.
    fn restore(&self, h: WindowHandle) -> bool {
        if self.ops.is_minimized(h) {
            self.ops.restore(h);
            thread::sleep(self.timings.restore_settle);
        }
        self.holds(h)
    }

    /// Register recent input with a modifier tap, then ask directly.
    fn nudge_and_request(&self, h: WindowHandle) -> bool {
        self.keys.nudge();
        self.request(h)
    }

    /// Join the input queues of this thread, the foreground owner and the
    /// target, request the foreground, and always detach afterwards.
    fn attach_and_request(&self, h: WindowHandle) -> bool {
        let me = self.ops.current_thread();
        let fg = self.ops.foreground_window();
        let mut peers = Vec::with_capacity(2);
        if !fg.is_null() {
            peers.extend(self.ops.window_thread(fg));
        }
        peers.extend(self.ops.window_thread(h));
        peers.retain(|&t| t != me);
        peers.dedup();

        let attached: Vec<u32> = peers
            .into_iter()
            .filter(|&t| self.ops.attach_thread_input(me, t, true))
            .collect();
        let ok = self.request(h);
        for t in attached {
            self.ops.attach_thread_input(me, t, false);
        }
        ok
    }

    /// Briefly raise the window into the topmost band, drop it back, and ask
    /// once more.
    fn topmost_flick(&self, h: WindowHandle) -> bool {
        self.ops.set_topmost(h, true);
        thread::sleep(self.timings.topmost_hold);
        self.ops.set_topmost(h, false);
        self.request(h)
    }
}

/// Ordered foreground strategies with a terminal attention cue.
pub struct FocusAcquirer {
    focus: Focus,
    chain: Chain<WindowHandle>,
}

impl FocusAcquirer {
    /// Build the chain over window primitives and a key sender (used for the
    /// recent-input nudge).
    pub fn new(ops: Arc<dyn WinOps>, keys: KeySender, timings: FocusTimings) -> Self {
        let focus = Focus { ops, keys, timings };
        let (a, b, c, d) = (focus.clone(), focus.clone(), focus.clone(), focus.clone());
        let chain = Chain::<WindowHandle>::new("focus")
            .step("restore", move |h: &WindowHandle| a.restore(*h))
            .step("nudge_foreground", move |h: &WindowHandle| {
                b.nudge_and_request(*h)
            })
            .step("attach_thread_input", move |h: &WindowHandle| {
                c.attach_and_request(*h)
            })
            .step("topmost_flick", move |h: &WindowHandle| d.topmost_flick(*h));
        Self { focus, chain }
    }

    /// Timings in use.
    pub fn timings(&self) -> FocusTimings {
        self.focus.timings
    }

    /// Try to bring `h` to the foreground. On total failure, flash the window
    /// once and return `false`.
    pub fn acquire(&self, h: WindowHandle) -> bool {
        match self.chain.run(&h) {
            Some(step) => {
                info!(handle = %h, step, "focus_acquired");
                true
            }
            None => {
                warn!(handle = %h, "focus_unattainable");
                self.focus.ops.flash(h, self.focus.timings.flash_count);
                false
            }
        }
    }
}

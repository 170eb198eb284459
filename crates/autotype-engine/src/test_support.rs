//! Test support utilities for autotype-engine unit and integration tests.
//! These helpers are public to avoid dead_code warnings and are lightweight.
//! They are intended for use by the test suite only.

use std::{sync::Arc, time::Duration};

use keysend::Injector;
use time::OffsetDateTime;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use winops::{WinOps, WindowTarget};

use crate::{
    Engine, Result,
    clock::ManualClock,
    config::EngineConfig,
    notification::StatusEvent,
    pipeline::ExecutionReport,
    services::Services,
    task::TaskDraft,
};

/// Build an engine over test doubles with every pause at zero.
pub fn engine_with(
    winops: Arc<dyn WinOps>,
    injector: Arc<dyn Injector>,
    clock: Arc<ManualClock>,
) -> Result<(Engine, UnboundedReceiver<StatusEvent>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let services = Services {
        winops,
        injector,
        clock,
    };
    let engine = Engine::new(services, EngineConfig::immediate(), tx)?;
    Ok((engine, rx))
}

/// Draft targeting a window by title only.
pub fn draft(at: OffsetDateTime, title: &str, message: &str) -> TaskDraft {
    TaskDraft::new(at, message, WindowTarget::by_title(title))
}

/// Receive status events until `pred` matches or `timeout_ms` elapses.
pub async fn recv_until<F>(
    rx: &mut UnboundedReceiver<StatusEvent>,
    timeout_ms: u64,
    mut pred: F,
) -> bool
where
    F: FnMut(&StatusEvent) -> bool,
{
    tokio::time::timeout(Duration::from_millis(timeout_ms), async {
        while let Some(ev) = rx.recv().await {
            if pred(&ev) {
                return true;
            }
        }
        false
    })
    .await
    .unwrap_or(false)
}

/// Wait for the next execution report.
pub async fn recv_report(
    rx: &mut UnboundedReceiver<StatusEvent>,
    timeout_ms: u64,
) -> Option<ExecutionReport> {
    let mut out = None;
    recv_until(rx, timeout_ms, |ev| match ev {
        StatusEvent::Executed(r) => {
            out = Some(r.clone());
            true
        }
        _ => false,
    })
    .await;
    out
}

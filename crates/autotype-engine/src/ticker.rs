//! Periodic callbacks with cancellation.
//!
//! Each ticker runs as a tokio task that fires its closure after an initial
//! delay and then on every interval, skipping missed ticks rather than
//! bursting to catch up. Cancellation always wins over a due tick.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Running tickers keyed by id.
#[derive(Clone, Default)]
pub struct Ticker {
    entries: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

impl Ticker {
    /// No tickers running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a ticker is active for the given id.
    pub fn is_active(&self, id: &str) -> bool {
        self.entries.lock().contains_key(id)
    }

    /// Start or replace the ticker for `id`. Must be called inside a tokio
    /// runtime.
    pub fn start<F>(&self, id: &str, initial: Duration, interval: Duration, mut on_tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.stop(id);

        let token = CancellationToken::new();
        let cancel = token.clone();
        let name = id.to_string();

        tokio::spawn(async move {
            trace!(
                ticker = %name,
                init_ms = initial.as_millis(),
                int_ms = interval.as_millis(),
                "ticker_start"
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    trace!(ticker = %name, "ticker_cancelled_initial");
                    return;
                }
                _ = time::sleep(initial) => {}
            }

            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        trace!(ticker = %name, "ticker_cancelled");
                        return;
                    }
                    _ = ticker.tick() => on_tick(),
                }
            }
        });
        self.entries.lock().insert(id.to_string(), token);
    }

    /// Stop a ticker if present (non-blocking).
    pub fn stop(&self, id: &str) {
        if let Some(token) = self.entries.lock().remove(id) {
            token.cancel();
            trace!(ticker = %id, "ticker_stop");
        }
    }

    /// Stop every ticker.
    pub fn clear(&self) {
        for (_, token) in self.entries.lock().drain() {
            token.cancel();
        }
    }
}

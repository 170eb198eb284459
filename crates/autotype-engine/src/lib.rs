//! autotype engine
//!
//! Types scheduled messages into other applications' windows:
//! - keeps the pending-task list and decides when a task is due
//! - resolves and focuses the target window, types the message and runs
//!   the task's keyboard actions on a dedicated worker thread
//! - tracks countdown alarms on the same tick
//! - reports every state change as a [`StatusEvent`]
//!
//! [`Engine`] is the entry point. Build it over [`Services`] (the OS-facing
//! collaborators), then either call [`Engine::tick`] yourself or let
//! [`Engine::spawn_driver`] tick it from a tokio runtime.
use std::{sync::Arc, time::Duration};

use keysend::KeySender;
use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use winops::{WinOps, WindowInfo};

pub mod action;
pub mod alarm;
pub mod clock;
pub mod config;
mod error;
pub mod interpreter;
pub mod notification;
pub mod pipeline;
pub mod scheduler;
pub mod services;
pub mod store;
pub mod task;
pub mod test_support;
pub mod ticker;
pub mod worker;

pub use action::{ActionDelay, ActionToken, parse_actions};
pub use alarm::{Alarm, AlarmId, AlarmState, AlarmView};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use error::{Error, ExecError, Result};
pub use notification::{StatusDispatcher, StatusEvent, StopReason};
pub use pipeline::{ExecutionReport, Outcome, Pipeline, Stage};
pub use scheduler::SchedulerState;
pub use services::Services;
pub use task::{ScheduledTask, TaskDraft, TaskId};

use alarm::AlarmTracker;
use scheduler::Scheduler;
use store::TaskStore;
use ticker::Ticker;
use worker::Worker;

/// Ticker id of the scheduler driver.
const DRIVER_TICKER: &str = "scheduler";

struct Inner {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    winops: Arc<dyn WinOps>,
    store: TaskStore,
    scheduler: Scheduler,
    alarms: Mutex<AlarmTracker>,
    notifier: StatusDispatcher,
    ticker: Ticker,
    worker: Mutex<Option<Worker>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // The worker's completion hook holds a scheduler clone, so the queue
        // sender must be dropped explicitly for the thread to exit.
        self.scheduler.close();
    }
}

/// Engine coordinates the task store, scheduler, worker and alarms.
///
/// Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl Engine {
    /// Create an engine and start its worker thread. Status events go to
    /// `events`.
    pub fn new(
        services: Services,
        config: EngineConfig,
        events: UnboundedSender<StatusEvent>,
    ) -> Result<Self> {
        let notifier = StatusDispatcher::new(events);
        let store = TaskStore::new();
        let (queue_tx, queue_rx) = crossbeam_channel::unbounded();
        let scheduler = Scheduler::new(
            store.clone(),
            queue_tx,
            notifier.clone(),
            config.due_window(),
        );

        let keys = KeySender::new(services.injector, config.key_timings());
        let pipeline = Arc::new(Pipeline::new(services.winops.clone(), keys, &config));
        let done = scheduler.clone();
        let worker = Worker::spawn(pipeline, queue_rx, move |report| done.complete(report))?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                clock: services.clock,
                winops: services.winops,
                store,
                scheduler,
                alarms: Mutex::new(AlarmTracker::new()),
                notifier,
                ticker: Ticker::new(),
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Current time according to the engine's clock.
    pub fn now(&self) -> OffsetDateTime {
        self.inner.clock.now()
    }

    /// Schedule a task. The draft's message must not be blank and every action
    /// token must be in the vocabulary.
    pub fn add_task(&self, draft: TaskDraft) -> Result<TaskId> {
        let at = draft.scheduled_time;
        let title = draft.target.title.clone();
        let id = self.inner.store.add(draft)?;
        self.inner
            .notifier
            .notify(StatusEvent::TaskAdded { id, at, title });
        Ok(id)
    }

    /// Remove a task. A task that is executing is cancelled.
    pub fn remove_task(&self, id: TaskId) -> Result<ScheduledTask> {
        let task = self.inner.store.remove(id)?;
        self.inner.notifier.notify(StatusEvent::TaskRemoved(id));
        Ok(task)
    }

    /// Replace a pending task. Rejected with [`Error::TaskBusy`] while it
    /// executes.
    pub fn edit_task(&self, id: TaskId, draft: TaskDraft) -> Result<()> {
        self.inner.store.edit(id, draft)?;
        self.inner.notifier.notify(StatusEvent::TaskEdited(id));
        Ok(())
    }

    /// Copy of every pending task, in insertion order.
    pub fn tasks(&self) -> Vec<ScheduledTask> {
        self.inner.store.snapshot()
    }

    /// Start dispatching due tasks.
    pub fn start(&self) -> Result<()> {
        self.inner.scheduler.start()
    }

    /// Stop dispatching. Tasks already executing finish.
    pub fn stop(&self) {
        self.inner.scheduler.stop();
    }

    /// Scheduler run state.
    pub fn state(&self) -> SchedulerState {
        self.inner.scheduler.state()
    }

    /// One tick at `now`: update alarms, then dispatch due tasks. Returns the
    /// ids handed to the worker.
    pub fn tick(&self, now: OffsetDateTime) -> Result<Vec<TaskId>> {
        let finished = self.inner.alarms.lock().tick(now);
        for alarm in finished {
            self.inner.notifier.notify(StatusEvent::AlarmFinished {
                id: alarm.id,
                message: alarm.message,
            });
        }
        self.inner.scheduler.tick(now)
    }

    /// Tick at the clock's current time.
    pub fn tick_now(&self) -> Result<Vec<TaskId>> {
        self.tick(self.now())
    }

    /// Tick every `tick_ms` from the current tokio runtime until
    /// [`Engine::shutdown`].
    pub fn spawn_driver(&self) {
        let engine = self.clone();
        self.inner.ticker.start(
            DRIVER_TICKER,
            Duration::ZERO,
            self.inner.config.tick(),
            move || {
                if let Err(e) = engine.tick_now() {
                    warn!(error = %e, "tick_failed");
                }
            },
        );
    }

    /// Whether the driver is ticking.
    pub fn driver_running(&self) -> bool {
        self.inner.ticker.is_active(DRIVER_TICKER)
    }

    /// Add a countdown alarm.
    pub fn add_alarm(&self, time: OffsetDateTime, message: impl Into<String>) -> Result<AlarmId> {
        let now = self.now();
        self.inner.alarms.lock().add(time, message, now)
    }

    /// Delete an alarm.
    pub fn remove_alarm(&self, id: AlarmId) -> Result<Alarm> {
        self.inner.alarms.lock().remove(id)
    }

    /// Every alarm with its state at the last tick.
    pub fn alarms(&self) -> Vec<AlarmView> {
        self.inner.alarms.lock().snapshot()
    }

    /// Windows a task could target.
    pub fn windows(&self) -> Result<Vec<WindowInfo>> {
        Ok(winops::visible_windows(self.inner.winops.as_ref())?)
    }

    /// Stop the driver, close the work queue and wait for the worker to
    /// finish any job in progress. Idempotent.
    pub fn shutdown(&self) {
        self.inner.ticker.clear();
        let Some(worker) = self.inner.worker.lock().take() else {
            return;
        };
        self.inner.scheduler.close();
        worker.join();
        debug!("engine_shutdown");
    }
}

//! Tick-driven dispatch of due tasks.
//!
//! `tick` never executes anything itself: it snapshots the store, claims the
//! due tasks and pushes them onto the worker queue. Completion comes back
//! through [`Scheduler::complete`], which removes the task and stops the
//! scheduler once nothing is left.

use std::{mem, sync::Arc, time::Duration};

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::{
    Error, Result,
    notification::{StatusDispatcher, StatusEvent, StopReason},
    pipeline::ExecutionReport,
    store::TaskStore,
    task::{ScheduledTask, TaskId},
};

/// Two-state run flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Ticks dispatch due tasks.
    Running,
    /// Ticks are ignored.
    Stopped,
}

/// A claimed task handed to the worker.
pub struct Job {
    /// Point-in-time copy of the task.
    pub task: ScheduledTask,
    /// Cancelled when the task is removed mid-run.
    pub cancel: CancellationToken,
}

/// True when `scheduled` lies within `[now - window, now]`, excluding the
/// lower edge.
pub fn is_due(scheduled: OffsetDateTime, now: OffsetDateTime, window: Duration) -> bool {
    now >= scheduled && now - scheduled < window
}

/// Owns the run state and dispatches due tasks from the store.
#[derive(Clone)]
pub struct Scheduler {
    store: TaskStore,
    state: Arc<Mutex<SchedulerState>>,
    queue: Arc<Mutex<Option<Sender<Job>>>>,
    notifier: StatusDispatcher,
    due_window: Duration,
}

impl Scheduler {
    /// Scheduler over a store, pushing jobs onto `queue`. Starts stopped.
    pub fn new(
        store: TaskStore,
        queue: Sender<Job>,
        notifier: StatusDispatcher,
        due_window: Duration,
    ) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(SchedulerState::Stopped)),
            queue: Arc::new(Mutex::new(Some(queue))),
            notifier,
            due_window,
        }
    }

    /// Current run state.
    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    /// Start dispatching. Refused when nothing is pending.
    pub fn start(&self) -> Result<()> {
        let pending = self.store.len();
        if pending == 0 {
            self.notifier.notify(StatusEvent::StartRefused);
            return Err(Error::EmptySchedule);
        }
        *self.state.lock() = SchedulerState::Running;
        self.notifier.notify(StatusEvent::Started { pending });
        Ok(())
    }

    /// Stop dispatching. In-flight tasks run to completion.
    pub fn stop(&self) {
        self.halt(StopReason::User);
    }

    fn halt(&self, reason: StopReason) {
        let was = mem::replace(&mut *self.state.lock(), SchedulerState::Stopped);
        if was == SchedulerState::Running {
            info!(reason = ?reason, "scheduler_stopped");
            self.notifier.notify(StatusEvent::Stopped(reason));
        }
    }

    /// Dispatch every task due at `now`. Returns the ids handed to the
    /// worker.
    pub fn tick(&self, now: OffsetDateTime) -> Result<Vec<TaskId>> {
        if self.state() != SchedulerState::Running {
            return Ok(Vec::new());
        }
        if self.store.is_empty() {
            self.halt(StopReason::Drained);
            return Ok(Vec::new());
        }
        let due: Vec<TaskId> = self
            .store
            .snapshot()
            .into_iter()
            .filter(|t| is_due(t.scheduled_time, now, self.due_window))
            .map(|t| t.id)
            .collect();
        trace!(due = due.len(), "tick");

        let queue = self.queue.lock().clone().ok_or(Error::ChannelClosed)?;
        let mut dispatched = Vec::with_capacity(due.len());
        for id in due {
            // Gone or already in flight since the snapshot.
            let Some((task, cancel)) = self.store.claim(id) else {
                continue;
            };
            queue
                .send(Job { task, cancel })
                .map_err(|_| Error::ChannelClosed)?;
            debug!(task = %id, "task_dispatched");
            dispatched.push(id);
        }
        Ok(dispatched)
    }

    /// Record a terminal state: remove the task, report it, and stop once the
    /// store has drained.
    pub fn complete(&self, report: ExecutionReport) {
        if !self.store.finish(report.task) {
            debug!(task = %report.task, "completed_task_already_removed");
        }
        self.notifier.notify(StatusEvent::Executed(report));
        if self.store.is_empty() {
            self.halt(StopReason::Drained);
        }
    }

    /// Drop the queue sender so the worker exits once it drains. Idempotent.
    pub fn close(&self) {
        if self.queue.lock().take().is_some() {
            debug!("work_queue_closed");
        }
    }
}

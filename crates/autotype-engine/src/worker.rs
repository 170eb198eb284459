//! Dedicated execution thread.
//!
//! Jobs arrive over a crossbeam channel and run one at a time, so the tick
//! driver never blocks on window or keyboard work. A panic inside one job is
//! caught and reported as a failure; the thread keeps serving the queue.

use std::{
    any::Any,
    io,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle},
};

use crossbeam_channel::Receiver;
use tracing::{debug, error, trace};

use crate::{
    error::ExecError,
    pipeline::{ExecutionReport, Outcome, Pipeline, Stage},
    scheduler::Job,
};

/// Execution entry point; implemented by [`Pipeline`] and by test doubles.
pub trait Executor: Send + Sync {
    /// Run one job to a terminal report.
    fn execute_job(&self, job: &mut Job) -> ExecutionReport;
}

impl Executor for Pipeline {
    fn execute_job(&self, job: &mut Job) -> ExecutionReport {
        self.execute(&mut job.task, &job.cancel)
    }
}

fn panic_text(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one job, converting a panic or a pre-cancelled token into a report.
fn run_job(exec: &dyn Executor, mut job: Job) -> ExecutionReport {
    trace!(task = %job.task.id, stage = ?Stage::Pending, "stage_enter");
    if job.cancel.is_cancelled() {
        return ExecutionReport::terminal(&job.task, Outcome::Cancelled);
    }
    match panic::catch_unwind(AssertUnwindSafe(|| exec.execute_job(&mut job))) {
        Ok(report) => report,
        Err(payload) => {
            let msg = panic_text(payload.as_ref());
            error!(task = %job.task.id, panic = %msg, "task_panicked");
            ExecutionReport::terminal(&job.task, Outcome::Failed(ExecError::Panicked(msg)))
        }
    }
}

/// Handle to the worker thread.
pub struct Worker {
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn the worker. `on_done` is called exactly once per job with its
    /// terminal report. The thread exits when every queue sender is dropped.
    pub fn spawn<F>(exec: Arc<dyn Executor>, jobs: Receiver<Job>, on_done: F) -> io::Result<Self>
    where
        F: Fn(ExecutionReport) + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("autotype-worker".into())
            .spawn(move || {
                debug!("worker_started");
                for job in jobs.iter() {
                    on_done(run_job(exec.as_ref(), job));
                }
                debug!("worker_exited");
            })?;
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the thread to exit. The queue must have been closed first.
    pub fn join(mut self) {
        if let Some(h) = self.handle.take()
            && h.join().is_err()
        {
            error!("worker_thread_panicked");
        }
    }
}

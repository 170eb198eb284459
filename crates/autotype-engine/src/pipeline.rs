//! Per-task execution: resolve, check privileges, focus, type, run actions.
//!
//! Internally every stage returns `Result<_, ExecError>`; [`Pipeline::execute`]
//! is the boundary where the error becomes a terminal [`Outcome`].

use std::{
    fmt::{self, Display, Formatter},
    sync::Arc,
    time::Duration,
};

use keysend::KeySender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use winops::{FocusAcquirer, WinOps, WindowHandle};

use crate::{
    action::ActionToken,
    config::EngineConfig,
    error::ExecError,
    interpreter::{ActionInterpreter, sleep_cancellable},
    task::{ScheduledTask, TaskId},
};

/// Non-terminal pipeline states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Queued, not started.
    Pending,
    /// Mapping the target to a live window.
    Resolving,
    /// Bringing the window to the foreground.
    Focusing,
    /// Injecting the message.
    Typing,
    /// Running the action list.
    RunningActions,
}

/// Terminal state of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Message typed and actions run.
    Completed,
    /// Nothing was injected: window missing, elevated or unfocusable.
    Skipped(ExecError),
    /// Injection was attempted and rejected, or the run panicked.
    Failed(ExecError),
    /// The task was removed while executing.
    Cancelled,
}

impl Outcome {
    /// Map a stage error to its terminal state.
    pub fn from_error(e: ExecError) -> Self {
        match e {
            ExecError::NotFound { .. }
            | ExecError::PermissionDenied { .. }
            | ExecError::FocusUnattainable { .. } => Self::Skipped(e),
            ExecError::InjectionFailed | ExecError::Panicked(_) => Self::Failed(e),
            ExecError::Cancelled => Self::Cancelled,
        }
    }

    /// Upper-case label used in status lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "EXECUTED",
            Self::Skipped(_) => "SKIPPED",
            Self::Failed(_) => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// What happened to one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Task that ran.
    pub task: TaskId,
    /// Message that was (or would have been) typed.
    pub message: String,
    /// Target title.
    pub title: String,
    /// Handle the target resolved to, if it did.
    pub handle: Option<WindowHandle>,
    /// Terminal state.
    pub outcome: Outcome,
    /// Actions whose injection was rejected.
    pub failed_actions: Vec<ActionToken>,
}

impl ExecutionReport {
    /// Report for a task that never reached the pipeline body.
    pub fn terminal(task: &ScheduledTask, outcome: Outcome) -> Self {
        Self {
            task: task.id,
            message: task.message.clone(),
            title: task.target.title.clone(),
            handle: None,
            outcome,
            failed_actions: Vec::new(),
        }
    }
}

impl Display for ExecutionReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Completed => {
                write!(f, "EXECUTED: '{}' -> '{}'", self.message, self.title)?;
                if !self.failed_actions.is_empty() {
                    let names: Vec<String> =
                        self.failed_actions.iter().map(ToString::to_string).collect();
                    write!(f, " (actions rejected: {})", names.join(", "))?;
                }
                Ok(())
            }
            Outcome::Skipped(e) | Outcome::Failed(e) => {
                write!(f, "{}: task {}: {e}", self.outcome.label(), self.task)
            }
            Outcome::Cancelled => write!(f, "CANCELLED: task {}", self.task),
        }
    }
}

/// Pauses owned by the pipeline itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineTimings {
    /// Between focus and typing.
    pub focus_settle: Duration,
    /// Between typing and the first action.
    pub action_lead_in: Duration,
}

impl From<&EngineConfig> for PipelineTimings {
    fn from(c: &EngineConfig) -> Self {
        Self {
            focus_settle: c.focus_settle(),
            action_lead_in: c.action_lead_in(),
        }
    }
}

/// Executes one task at a time against the OS collaborators.
pub struct Pipeline {
    ops: Arc<dyn WinOps>,
    focus: FocusAcquirer,
    keys: KeySender,
    interpreter: ActionInterpreter,
    timings: PipelineTimings,
}

impl Pipeline {
    /// Assemble a pipeline from window primitives and a key sender.
    pub fn new(ops: Arc<dyn WinOps>, keys: KeySender, config: &EngineConfig) -> Self {
        Self {
            focus: FocusAcquirer::new(ops.clone(), keys.clone(), config.focus_timings()),
            interpreter: ActionInterpreter::new(keys.clone()),
            ops,
            keys,
            timings: PipelineTimings::from(config),
        }
    }

    /// Run `task` to a terminal state. A re-discovered window handle is
    /// written back into `task.target`.
    pub fn execute(&self, task: &mut ScheduledTask, cancel: &CancellationToken) -> ExecutionReport {
        let mut report = ExecutionReport::terminal(task, Outcome::Completed);
        let outcome = match self.run(task, cancel, &mut report) {
            Ok(()) => Outcome::Completed,
            Err(e) => Outcome::from_error(e),
        };
        match &outcome {
            Outcome::Completed => info!(task = %task.id, "task_completed"),
            Outcome::Cancelled => info!(task = %task.id, "task_cancelled"),
            other => warn!(task = %task.id, outcome = ?other, "task_not_completed"),
        }
        report.outcome = outcome;
        report
    }

    fn enter(&self, task: TaskId, stage: Stage, cancel: &CancellationToken) -> Result<(), ExecError> {
        if cancel.is_cancelled() {
            debug!(task = %task, stage = ?stage, "cancelled_before_stage");
            return Err(ExecError::Cancelled);
        }
        trace!(task = %task, stage = ?stage, "stage_enter");
        Ok(())
    }

    fn pause(d: Duration, cancel: &CancellationToken) -> Result<(), ExecError> {
        if sleep_cancellable(d, cancel) {
            Ok(())
        } else {
            Err(ExecError::Cancelled)
        }
    }

    fn run(
        &self,
        task: &mut ScheduledTask,
        cancel: &CancellationToken,
        report: &mut ExecutionReport,
    ) -> Result<(), ExecError> {
        let title = task.target.title.clone();

        self.enter(task.id, Stage::Resolving, cancel)?;
        let handle = task.target.resolve(self.ops.as_ref()).map_err(|e| {
            debug!(task = %task.id, error = %e, "resolve_failed");
            ExecError::NotFound {
                title: title.clone(),
            }
        })?;
        report.handle = Some(handle);

        if self.ops.is_elevated(handle) && !self.ops.is_self_elevated() {
            return Err(ExecError::PermissionDenied { title });
        }

        self.enter(task.id, Stage::Focusing, cancel)?;
        if !self.focus.acquire(handle) {
            return Err(ExecError::FocusUnattainable { title });
        }
        Self::pause(self.timings.focus_settle, cancel)?;

        self.enter(task.id, Stage::Typing, cancel)?;
        if !self.keys.type_text(&task.message) {
            return Err(ExecError::InjectionFailed);
        }

        if task.actions.is_empty() {
            return Ok(());
        }
        Self::pause(self.timings.action_lead_in, cancel)?;
        self.enter(task.id, Stage::RunningActions, cancel)?;
        let actions = self.interpreter.run(
            &task.actions,
            task.action_delay.as_duration(),
            cancel,
        );
        report.failed_actions = actions.failed();
        if actions.cancelled {
            return Err(ExecError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Instant};

    use keysend::{
        mock::{InjectEvent, MockInjector},
        scan, vk,
    };
    use time::macros::datetime;
    use winops::{MockWinOps, WindowTarget};

    use super::*;
    use crate::action::ActionDelay;

    struct Rig {
        ops: MockWinOps,
        inj: Arc<MockInjector>,
        pipeline: Pipeline,
    }

    fn rig() -> Rig {
        let ops = MockWinOps::new();
        ops.add_window("Notes", 10, 100);
        let inj = Arc::new(MockInjector::new());
        let config = EngineConfig::immediate();
        let keys = KeySender::new(inj.clone(), config.key_timings());
        let pipeline = Pipeline::new(Arc::new(ops.clone()), keys, &config);
        Rig { ops, inj, pipeline }
    }

    fn task(target: WindowTarget, actions: Vec<ActionToken>) -> ScheduledTask {
        ScheduledTask {
            id: TaskId(1),
            scheduled_time: datetime!(2026-01-01 09:00 UTC),
            message: "hello".into(),
            target,
            actions,
            action_delay: ActionDelay::new(0.0),
        }
    }

    #[test]
    fn happy_path_completes_and_types() {
        let r = rig();
        let mut t = task(WindowTarget::new("Notes", WindowHandle(10)), vec![]);
        let rep = r.pipeline.execute(&mut t, &CancellationToken::new());
        assert_eq!(rep.outcome, Outcome::Completed);
        assert_eq!(rep.handle, Some(WindowHandle(10)));
        assert_eq!(r.inj.typed_text(), "hello");
        assert_eq!(rep.to_string(), "EXECUTED: 'hello' -> 'Notes'");
    }

    #[test]
    fn missing_window_skips_without_input() {
        let r = rig();
        let mut t = task(WindowTarget::new("Gone", WindowHandle(99)), vec![ActionToken::Enter]);
        let rep = r.pipeline.execute(&mut t, &CancellationToken::new());
        assert_eq!(
            rep.outcome,
            Outcome::Skipped(ExecError::NotFound {
                title: "Gone".into()
            })
        );
        assert!(r.inj.events().is_empty());
    }

    #[test]
    fn stale_handle_is_healed() {
        let r = rig();
        let mut t = task(WindowTarget::new("Notes", WindowHandle(3)), vec![]);
        let rep = r.pipeline.execute(&mut t, &CancellationToken::new());
        assert_eq!(rep.outcome, Outcome::Completed);
        assert_eq!(t.target.handle, WindowHandle(10));
    }

    #[test]
    fn elevated_target_is_never_injected() {
        let r = rig();
        r.ops.set_elevated(WindowHandle(10), true);
        let mut t = task(WindowTarget::by_title("Notes"), vec![]);
        let rep = r.pipeline.execute(&mut t, &CancellationToken::new());
        assert!(matches!(
            rep.outcome,
            Outcome::Skipped(ExecError::PermissionDenied { .. })
        ));
        assert!(r.inj.events().is_empty());
        assert!(!r.ops.calls_contains("set_foreground"));

        r.ops.set_self_elevated(true);
        let rep = r.pipeline.execute(&mut t, &CancellationToken::new());
        assert_eq!(rep.outcome, Outcome::Completed);
    }

    #[test]
    fn unfocusable_window_is_skipped() {
        let r = rig();
        r.ops.set_foreground_locked(true);
        let mut t = task(WindowTarget::by_title("Notes"), vec![]);
        let rep = r.pipeline.execute(&mut t, &CancellationToken::new());
        assert!(matches!(
            rep.outcome,
            Outcome::Skipped(ExecError::FocusUnattainable { .. })
        ));
        assert_eq!(r.ops.flashes(), 1);
        assert_eq!(r.inj.typed_text(), "");
    }

    #[test]
    fn rejected_typing_fails() {
        let r = rig();
        r.inj.set_fail_unicode(true);
        r.inj.set_fail_legacy(true);
        let mut t = task(WindowTarget::by_title("Notes"), vec![ActionToken::Enter]);
        let rep = r.pipeline.execute(&mut t, &CancellationToken::new());
        assert_eq!(rep.outcome, Outcome::Failed(ExecError::InjectionFailed));
        assert!(
            !r.inj
                .events()
                .iter()
                .any(|e| matches!(e, InjectEvent::Scan { .. })),
            "actions must not run after a typing failure"
        );
    }

    #[test]
    fn action_failures_still_complete() {
        let r = rig();
        r.inj.set_fail_scan(true);
        r.inj.set_fail_virtual(true);
        r.inj.set_fail_legacy(true);
        let mut t = task(WindowTarget::by_title("Notes"), vec![ActionToken::AltTab]);
        let rep = r.pipeline.execute(&mut t, &CancellationToken::new());
        assert_eq!(rep.outcome, Outcome::Completed);
        assert_eq!(rep.failed_actions, vec![ActionToken::AltTab]);
    }

    #[test]
    fn cancel_during_action_delay_stops_remaining_actions() {
        let r = rig();
        let mut t = task(
            WindowTarget::by_title("Notes"),
            vec![ActionToken::Enter, ActionToken::Tab],
        );
        t.action_delay = ActionDelay::new(5.0);
        let cancel = CancellationToken::new();
        let remote = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            remote.cancel();
        });

        let start = Instant::now();
        let rep = r.pipeline.execute(&mut t, &cancel);
        canceller.join().unwrap();

        assert_eq!(rep.outcome, Outcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(2));
        let events = r.inj.events();
        assert!(events.contains(&InjectEvent::Scan {
            code: scan::ENTER,
            key_up: false,
            extended: false
        }));
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, InjectEvent::Virtual { vk: v, .. } if *v == vk::TAB)),
            "tab must not run after cancellation"
        );
    }

    #[test]
    fn cancelled_before_start() {
        let r = rig();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut t = task(WindowTarget::by_title("Notes"), vec![]);
        let rep = r.pipeline.execute(&mut t, &cancel);
        assert_eq!(rep.outcome, Outcome::Cancelled);
        assert!(r.inj.events().is_empty());
    }
}

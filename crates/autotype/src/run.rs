//! The `run` command: schedule, drive the engine, print status until done.

use std::time::Duration;

use autotype_engine::{
    AlarmState, Engine, EngineConfig, SchedulerState, Services, StatusEvent, TaskDraft,
};
use time::{OffsetDateTime, macros::format_description};
use tokio::{runtime::Runtime, signal, sync::mpsc, time as ttime};
use tracing::{debug, info};
use winops::WindowTarget;

use crate::{
    cli::RunArgs,
    error::Result,
    when::{When, next_occurrence},
};

/// Countdown refresh interval.
const COUNTDOWN_EVERY: Duration = Duration::from_secs(1);

/// Run the command to completion.
pub fn run(args: &RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    // Before any thread exists, so the clock can read the local offset.
    let services = Services::system();
    let (tx, rx) = mpsc::unbounded_channel();
    let engine = Engine::new(services, config, tx)?;

    let result = schedule(&engine, args).and_then(|()| {
        let runtime = Runtime::new()?;
        runtime.block_on(watch(&engine, rx, args.countdown));
        Ok(())
    });
    engine.shutdown();
    result
}

/// Add the task and alarms from `args` and start the scheduler if a task was
/// added.
fn schedule(engine: &Engine, args: &RunArgs) -> Result<()> {
    let now = engine.now();
    for alarm in &args.alarm {
        let at = alarm.when.resolve(now);
        let id = engine.add_alarm(at, alarm.message.clone())?;
        println!("Alarm {id} set for {}", stamp(at));
    }

    let (Some(window), Some(message)) = (&args.window, &args.message) else {
        return Ok(());
    };
    let at = match (args.at, args.after) {
        (Some(t), _) => next_occurrence(now, t),
        (None, Some(d)) => When::In(d).resolve(now),
        (None, None) => now,
    };
    let draft = TaskDraft::new(at, message.clone(), WindowTarget::by_title(window.clone()))
        .with_actions(args.actions.iter().cloned())
        .with_delay(args.delay);
    engine.add_task(draft)?;
    engine.start()?;
    Ok(())
}

/// Whether nothing is left to wait for.
fn finished(engine: &Engine) -> bool {
    engine.state() == SchedulerState::Stopped
        && engine
            .alarms()
            .iter()
            .all(|a| a.state == AlarmState::Finished)
}

/// Print status events until the schedule drains and every alarm finishes,
/// or until Ctrl-C.
async fn watch(
    engine: &Engine,
    mut rx: mpsc::UnboundedReceiver<StatusEvent>,
    countdown: bool,
) {
    engine.spawn_driver();
    let mut refresh = ttime::interval(COUNTDOWN_EVERY);
    let interrupt = signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            ev = rx.recv() => {
                let Some(ev) = ev else { break };
                println!("[{}] {ev}", stamp(engine.now()));
            }
            _ = refresh.tick() => {
                if countdown {
                    for a in engine.alarms() {
                        let left = a.state.to_string();
                        println!("  alarm {} {left:>14}  {}", a.alarm.id, a.alarm.message);
                    }
                }
            }
            _ = &mut interrupt => {
                info!("interrupted");
                engine.stop();
                break;
            }
        }
        if finished(engine) {
            debug!("run_finished");
            break;
        }
    }
    while let Ok(ev) = rx.try_recv() {
        println!("[{}] {ev}", stamp(engine.now()));
    }
}

/// `HH:MM:SS`.
fn stamp(t: OffsetDateTime) -> String {
    t.format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| t.to_string())
}

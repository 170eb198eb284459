//! End-to-end scheduling scenarios over mock window and keyboard backends.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use autotype_engine::{
    ActionToken, AlarmState, Engine, Error, ExecError, ManualClock, Outcome, SchedulerState,
    StatusEvent, StopReason,
    test_support::{draft, engine_with, recv_report, recv_until},
};
use keysend::{
    mock::{InjectEvent, MockInjector},
    vk,
};
use time::{OffsetDateTime, macros::datetime};
use tokio::sync::mpsc::UnboundedReceiver;
use winops::{MockWinOps, WindowHandle};

const NOW: OffsetDateTime = datetime!(2026-05-05 10:00:00 UTC);
const WAIT_MS: u64 = 3_000;

struct Rig {
    ops: MockWinOps,
    inj: Arc<MockInjector>,
    clock: Arc<ManualClock>,
    engine: Engine,
    rx: UnboundedReceiver<StatusEvent>,
}

fn rig() -> Rig {
    let ops = MockWinOps::new();
    ops.add_window("Notes", 10, 100);
    let inj = Arc::new(MockInjector::new());
    let clock = Arc::new(ManualClock::new(NOW));
    let (engine, rx) = engine_with(Arc::new(ops.clone()), inj.clone(), clock.clone()).unwrap();
    Rig {
        ops,
        inj,
        clock,
        engine,
        rx,
    }
}

fn drain(rx: &mut UnboundedReceiver<StatusEvent>) -> Vec<StatusEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

#[tokio::test(flavor = "multi_thread")]
async fn due_task_types_message_and_drains() {
    let mut r = rig();
    let id = r.engine.add_task(draft(NOW, "Notes", "hello")).unwrap();
    r.engine.start().unwrap();
    assert_eq!(r.engine.tick(NOW).unwrap(), vec![id]);

    let rep = recv_report(&mut r.rx, WAIT_MS).await.unwrap();
    assert_eq!(rep.task, id);
    assert_eq!(rep.outcome, Outcome::Completed);
    assert_eq!(rep.to_string(), "EXECUTED: 'hello' -> 'Notes'");
    assert_eq!(r.inj.typed_text(), "hello");
    assert!(r.engine.tasks().is_empty());

    assert!(
        recv_until(&mut r.rx, WAIT_MS, |e| *e == StatusEvent::Stopped(StopReason::Drained)).await
    );
    assert_eq!(r.engine.state(), SchedulerState::Stopped);
    r.engine.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn actions_run_in_order_with_delay_between() {
    let mut r = rig();
    let d = draft(NOW, "Notes", "hi")
        .with_actions(["ENTER", "CTRL+ENTER"])
        .with_delay(1.0);
    r.engine.add_task(d).unwrap();
    r.engine.start().unwrap();
    r.engine.tick(NOW).unwrap();

    let rep = recv_report(&mut r.rx, WAIT_MS).await.unwrap();
    assert_eq!(rep.outcome, Outcome::Completed);
    assert!(rep.failed_actions.is_empty());

    let timed = r.inj.timed_events();
    let ctrl_down = timed
        .iter()
        .position(|(_, e)| {
            *e == InjectEvent::Virtual {
                vk: vk::CONTROL,
                key_up: false,
            }
        })
        .unwrap();
    let gap = timed[ctrl_down].0 - timed[ctrl_down - 1].0;
    assert!(gap >= Duration::from_secs(1), "gap {gap:?}");
    // The message precedes every action event.
    assert!(r.inj.typed_text().starts_with("hi"));
    r.engine.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn closed_window_is_skipped_and_removed() {
    let mut r = rig();
    let id = r
        .engine
        .add_task(draft(NOW, "Notes", "hello").with_actions(["ENTER"]))
        .unwrap();
    r.ops.close_window(WindowHandle(10));
    r.engine.start().unwrap();
    r.engine.tick(NOW).unwrap();

    let rep = recv_report(&mut r.rx, WAIT_MS).await.unwrap();
    assert_eq!(rep.task, id);
    assert_eq!(
        rep.outcome,
        Outcome::Skipped(ExecError::NotFound {
            title: "Notes".into()
        })
    );
    assert!(r.inj.events().is_empty());
    assert!(r.engine.tasks().is_empty());
    r.engine.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn elevated_window_is_skipped() {
    let mut r = rig();
    r.ops.set_elevated(WindowHandle(10), true);
    r.engine.add_task(draft(NOW, "Notes", "hello")).unwrap();
    r.engine.start().unwrap();
    r.engine.tick(NOW).unwrap();

    let rep = recv_report(&mut r.rx, WAIT_MS).await.unwrap();
    assert!(matches!(
        rep.outcome,
        Outcome::Skipped(ExecError::PermissionDenied { .. })
    ));
    assert!(r.inj.events().is_empty());
    r.engine.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn scheduler_keeps_running_until_last_task() {
    let mut r = rig();
    let later = NOW + Duration::from_secs(60);
    let first = r.engine.add_task(draft(NOW, "Notes", "one")).unwrap();
    let second = r.engine.add_task(draft(later, "Notes", "two")).unwrap();
    r.engine.start().unwrap();

    assert_eq!(r.engine.tick_now().unwrap(), vec![first]);
    let rep = recv_report(&mut r.rx, WAIT_MS).await.unwrap();
    assert_eq!(rep.task, first);
    assert_eq!(r.engine.state(), SchedulerState::Running);
    assert_eq!(r.engine.tasks().len(), 1);

    r.clock.set(later);
    assert_eq!(r.engine.tick_now().unwrap(), vec![second]);
    let rep = recv_report(&mut r.rx, WAIT_MS).await.unwrap();
    assert_eq!(rep.task, second);
    assert!(
        recv_until(&mut r.rx, WAIT_MS, |e| *e == StatusEvent::Stopped(StopReason::Drained)).await
    );
    assert_eq!(r.inj.typed_text(), "onetwo");
    r.engine.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn missed_task_stays_pending() {
    let r = rig();
    r.engine.add_task(draft(NOW, "Notes", "late")).unwrap();
    r.engine.start().unwrap();
    assert!(
        r.engine
            .tick(NOW + Duration::from_secs(2))
            .unwrap()
            .is_empty()
    );
    assert_eq!(r.engine.tasks().len(), 1);
    assert_eq!(r.engine.state(), SchedulerState::Running);
    r.engine.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn start_on_empty_schedule_is_refused() {
    let mut r = rig();
    assert!(matches!(r.engine.start(), Err(Error::EmptySchedule)));
    assert_eq!(r.engine.state(), SchedulerState::Stopped);
    assert!(recv_until(&mut r.rx, WAIT_MS, |e| *e == StatusEvent::StartRefused).await);
    r.engine.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn removing_in_flight_task_cancels_it() {
    let mut r = rig();
    let d = draft(NOW, "Notes", "x")
        .with_actions(["TAB", "ENTER"])
        .with_delay(5.0);
    let id = r.engine.add_task(d.clone()).unwrap();
    r.engine.start().unwrap();
    r.engine.tick(NOW).unwrap();

    // Claimed by the tick, so edits are refused until it settles.
    assert!(matches!(
        r.engine.edit_task(id, d),
        Err(Error::TaskBusy(busy)) if busy == id
    ));

    let started = Instant::now();
    let removed = r.engine.remove_task(id).unwrap();
    assert_eq!(removed.actions, vec![ActionToken::Tab, ActionToken::Enter]);

    let rep = recv_report(&mut r.rx, WAIT_MS).await.unwrap();
    assert_eq!(rep.outcome, Outcome::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(r.engine.tasks().is_empty());
    r.engine.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn pending_task_can_be_edited() {
    let mut r = rig();
    let id = r.engine.add_task(draft(NOW, "Notes", "old")).unwrap();
    r.engine
        .edit_task(id, draft(NOW, "Notes", "new").with_actions(["TAB"]))
        .unwrap();
    assert_eq!(r.engine.tasks()[0].message, "new");

    r.engine.start().unwrap();
    r.engine.tick(NOW).unwrap();
    let rep = recv_report(&mut r.rx, WAIT_MS).await.unwrap();
    assert_eq!(rep.message, "new");
    assert_eq!(r.inj.typed_text(), "new");
    r.engine.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn task_added_while_running_waits_for_next_tick() {
    let mut r = rig();
    let first = r.engine.add_task(draft(NOW, "Notes", "a")).unwrap();
    r.engine.start().unwrap();
    assert_eq!(r.engine.tick(NOW).unwrap(), vec![first]);
    let second = r.engine.add_task(draft(NOW, "Notes", "b")).unwrap();
    assert_eq!(recv_report(&mut r.rx, WAIT_MS).await.unwrap().task, first);

    assert_eq!(r.engine.tick(NOW).unwrap(), vec![second]);
    assert_eq!(recv_report(&mut r.rx, WAIT_MS).await.unwrap().task, second);
    r.engine.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn alarm_finishes_once() {
    let mut r = rig();
    let id = r
        .engine
        .add_alarm(NOW + Duration::from_secs(5), "tea")
        .unwrap();
    r.engine.tick(NOW).unwrap();
    assert!(drain(&mut r.rx).is_empty());

    r.engine.tick(NOW + Duration::from_secs(5)).unwrap();
    r.engine.tick(NOW + Duration::from_secs(6)).unwrap();
    let events = drain(&mut r.rx);
    assert_eq!(
        events,
        vec![StatusEvent::AlarmFinished {
            id,
            message: "tea".into()
        }]
    );
    assert_eq!(r.engine.alarms()[0].state, AlarmState::Finished);
    r.engine.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn driver_ticks_until_shutdown() {
    let mut r = rig();
    r.engine.add_task(draft(NOW, "Notes", "auto")).unwrap();
    r.engine.start().unwrap();
    r.engine.spawn_driver();
    assert!(r.engine.driver_running());

    let rep = recv_report(&mut r.rx, WAIT_MS).await.unwrap();
    assert_eq!(rep.outcome, Outcome::Completed);
    r.engine.shutdown();
    assert!(!r.engine.driver_running());
    // Idempotent.
    r.engine.shutdown();
}

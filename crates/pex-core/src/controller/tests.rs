use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, UNIX_EPOCH},
};

use pex_model::EventKind;

use super::*;
use crate::fake::{EventRecorder, FakeCommand};

/// Clock that advances one second per reading.
fn ticking_clock() -> Clock {
    let ticks = Arc::new(AtomicU64::new(0));
    Arc::new(move || UNIX_EPOCH + Duration::from_secs(ticks.fetch_add(1, Ordering::SeqCst)))
}

fn controller(cmd: Arc<FakeCommand>) -> (Arc<CmdController>, EventRecorder) {
    let rec = EventRecorder::new();
    let ctl = CmdController::new(cmd, Arc::new(rec.clone()), ticking_clock());
    (Arc::new(ctl), rec)
}

async fn until_started(cmd: &FakeCommand) {
    while !cmd.was_started() {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn success_emits_started_then_finished() {
    let cmd = FakeCommand::new("ok").into_ref();
    let (ctl, rec) = controller(Arc::clone(&cmd));

    assert_eq!(ctl.state(), ControllerState::Idle);
    assert!(ctl.run().await);
    assert_eq!(ctl.state(), ControllerState::Finished);

    let kinds: Vec<EventKind> = rec.events().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec![EventKind::CmdStarted, EventKind::CmdFinished]);
    assert_eq!(rec.successes(EventKind::CmdFinished), 1);
    assert_eq!(cmd.start_calls(), 1);
}

#[tokio::test]
async fn finish_event_carries_description_and_duration() {
    let cmd = FakeCommand::new("sleep 1").into_ref();
    let (ctl, rec) = controller(cmd);

    ctl.run().await;

    let finished = rec.of_kind(EventKind::CmdFinished);
    assert_eq!(finished[0].cmd(), Some("sleep 1"));
    // started at tick 0, finished at tick 1
    assert_eq!(finished[0].duration(), Some(Duration::from_secs(1)));
    assert_eq!(finished[0].at(), UNIX_EPOCH + Duration::from_secs(1));
}

#[tokio::test]
async fn non_zero_exit_reports_failure() {
    let cmd = FakeCommand::new("false").with_exit_code(1).into_ref();
    let (ctl, rec) = controller(cmd);

    assert!(!ctl.run().await);

    let finished = rec.of_kind(EventKind::CmdFinished);
    assert_eq!(finished.len(), 1);
    assert_eq!(
        finished[0].error(),
        Some("command had error: false: exit code: 1")
    );
}

#[tokio::test]
async fn start_failure_reports_failure() {
    let cmd = FakeCommand::new("missing")
        .with_start_error("No such file or directory")
        .into_ref();
    let (ctl, rec) = controller(cmd);

    assert!(!ctl.run().await);
    assert_eq!(ctl.state(), ControllerState::Finished);

    assert_eq!(rec.of_kind(EventKind::CmdStarted).len(), 1);
    let finished = rec.of_kind(EventKind::CmdFinished);
    assert_eq!(finished.len(), 1);
    assert!(
        finished[0]
            .error()
            .unwrap()
            .starts_with("command could not start: missing: spawn failed")
    );
}

#[tokio::test]
async fn kill_before_run_never_starts() {
    let cmd = FakeCommand::new("never").into_ref();
    let (ctl, rec) = controller(Arc::clone(&cmd));

    ctl.kill();
    assert_eq!(ctl.state(), ControllerState::Finished);

    assert!(ctl.run().await);
    assert_eq!(cmd.start_calls(), 0);
    assert_eq!(cmd.kill_calls(), 0);
    assert!(rec.events().is_empty());
}

#[tokio::test]
async fn kill_while_running_reports_once() {
    let cmd = FakeCommand::new("forever").until_killed().into_ref();
    let (ctl, rec) = controller(Arc::clone(&cmd));

    let handle = {
        let ctl = Arc::clone(&ctl);
        tokio::spawn(async move { ctl.run().await })
    };
    until_started(&cmd).await;
    assert_eq!(ctl.state(), ControllerState::Running);

    ctl.kill();
    assert!(handle.await.unwrap(), "a kill-won race is not a failure");

    let finished = rec.of_kind(EventKind::CmdFinished);
    assert_eq!(finished.len(), 1);
    assert!(finished[0].is_success());
    assert_eq!(cmd.kill_calls(), 1);
}

#[tokio::test]
async fn kill_error_is_reported_in_event() {
    let cmd = FakeCommand::new("stubborn")
        .until_killed()
        .with_kill_error("operation not permitted")
        .into_ref();
    let (ctl, rec) = controller(Arc::clone(&cmd));

    let handle = {
        let ctl = Arc::clone(&ctl);
        tokio::spawn(async move { ctl.run().await })
    };
    until_started(&cmd).await;

    ctl.kill();
    handle.await.unwrap();

    let finished = rec.of_kind(EventKind::CmdFinished);
    assert_eq!(finished.len(), 1);
    assert_eq!(
        finished[0].error(),
        Some("command had error on kill: stubborn: kill failed: operation not permitted")
    );
}

#[tokio::test]
async fn repeated_run_and_kill_are_noops() {
    let cmd = FakeCommand::new("once").into_ref();
    let (ctl, rec) = controller(Arc::clone(&cmd));

    assert!(ctl.run().await);
    assert!(ctl.run().await);
    ctl.kill();
    ctl.kill();

    assert_eq!(cmd.start_calls(), 1);
    assert_eq!(cmd.kill_calls(), 0);
    assert_eq!(rec.of_kind(EventKind::CmdStarted).len(), 1);
    assert_eq!(rec.of_kind(EventKind::CmdFinished).len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_kills_emit_a_single_finish() {
    for _ in 0..50 {
        let cmd = FakeCommand::new("race")
            .with_run_time(Duration::from_micros(50))
            .into_ref();
        let (ctl, rec) = controller(Arc::clone(&cmd));

        let runner = {
            let ctl = Arc::clone(&ctl);
            tokio::spawn(async move { ctl.run().await })
        };
        let killers: Vec<_> = (0..3)
            .map(|_| {
                let ctl = Arc::clone(&ctl);
                tokio::spawn(async move { ctl.kill() })
            })
            .collect();

        runner.await.unwrap();
        for k in killers {
            k.await.unwrap();
        }

        assert!(ctl.is_finished());
        assert!(rec.of_kind(EventKind::CmdStarted).len() <= 1);
        assert!(rec.of_kind(EventKind::CmdFinished).len() <= 1);
        assert_eq!(
            rec.of_kind(EventKind::CmdStarted).len(),
            rec.of_kind(EventKind::CmdFinished).len()
        );
        assert!(cmd.start_calls() <= 1);
    }
}

#[test]
fn debug_shows_description_and_state() {
    let cmd = FakeCommand::new("echo hi").into_ref();
    let (ctl, _) = controller(cmd);
    let dbg = format!("{ctl:?}");
    assert!(dbg.contains("echo hi"));
    assert!(dbg.contains("Idle"));
}

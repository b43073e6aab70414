mod common;

use common::{chain, Harness};
use relaunch::engine::CycleOutcome;
use relaunch::errors::RelaunchError;
use relaunch::types::Termination;
use relaunch_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn setup_commands_run_in_order_before_the_application() {
    init_tracing();
    let mut h = Harness::in_cwd();
    let mode = chain(&["make clean", "make", "./app"]);

    with_timeout(h.reloader.start(&mode)).await.unwrap();

    assert_eq!(h.backend.spawned_lines(), vec!["make clean", "make", "./app"]);
    assert!(h.app_pid().is_some());
}

#[tokio::test]
async fn failing_first_setup_step_is_fatal_and_nothing_else_runs() {
    init_tracing();
    let mut h = Harness::in_cwd();
    h.backend.exit_with("make clean", 2);
    let mode = chain(&["make clean", "make", "./app"]);

    let err = with_timeout(h.reloader.start(&mode)).await.unwrap_err();

    assert!(matches!(err, RelaunchError::BuildFailed { code: 2, .. }));
    assert_eq!(h.backend.spawned_lines(), vec!["make clean"]);
    assert!(h.app_pid().is_none());
}

#[tokio::test]
async fn rebuild_failure_after_a_change_leaves_the_application_stopped() {
    init_tracing();
    let mut h = Harness::in_cwd();
    let mode = chain(&["make clean", "make", "./app"]);
    with_timeout(h.reloader.start(&mode)).await.unwrap();
    let first_app = h.app_pid().unwrap();

    h.backend.exit_with("make", 1);
    h.changes.push_change();
    let outcome = with_timeout(h.reloader.tick(&mode)).await;

    assert_eq!(outcome, CycleOutcome::BuildFailed);
    assert_eq!(h.backend.signals(), vec![(first_app, Termination::Graceful)]);
    assert!(h.app_pid().is_none());
    assert!(h.backend.running().is_empty());
    assert_eq!(
        h.backend.spawned_lines(),
        vec!["make clean", "make", "./app", "make clean", "make"]
    );

    // The next successful cycle brings it back.
    h.changes.push_change();
    let outcome = with_timeout(h.reloader.tick(&mode)).await;
    assert!(matches!(outcome, CycleOutcome::Restarted { .. }));
    assert!(h.app_pid().is_some());
}

#[tokio::test]
async fn quiet_poll_does_nothing() {
    init_tracing();
    let mut h = Harness::in_cwd();
    let mode = chain(&["cargo build", "./app"]);
    with_timeout(h.reloader.start(&mode)).await.unwrap();
    let spawned = h.backend.spawned_lines().len();

    h.changes.push_quiet();
    assert_eq!(with_timeout(h.reloader.tick(&mode)).await, CycleOutcome::Idle);
    assert_eq!(with_timeout(h.reloader.tick(&mode)).await, CycleOutcome::Idle);
    assert_eq!(h.backend.spawned_lines().len(), spawned);
    assert!(h.backend.signals().is_empty());
}

#[tokio::test]
async fn each_change_replaces_the_application_with_a_new_process() {
    init_tracing();
    let mut h = Harness::in_cwd();
    let mode = chain(&["npm run dev"]);
    with_timeout(h.reloader.start(&mode)).await.unwrap();
    let old = h.app_pid().unwrap();

    h.changes.push_change();
    let CycleOutcome::Restarted { pid } = with_timeout(h.reloader.tick(&mode)).await else {
        panic!("expected a restart");
    };

    assert_ne!(pid, old);
    assert_eq!(h.backend.running(), vec![pid]);
    assert_eq!(h.app_pid(), Some(pid));
}

#[tokio::test]
async fn metacharacters_are_rejected_before_anything_spawns() {
    init_tracing();
    let mut h = Harness::in_cwd();

    let err = with_timeout(h.reloader.start(&chain(&["make && rm -rf /", "./app"])))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = with_timeout(h.reloader.start(&chain(&["make", "./app; rm -rf /"])))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    // The second chain's setup ran; its run command never did.
    assert_eq!(h.backend.spawned_lines(), vec!["make"]);
}

#[tokio::test]
async fn setup_outside_the_allow_list_is_rejected_without_escalation() {
    init_tracing();
    let mut h = Harness::in_cwd();

    let err = with_timeout(h.reloader.start(&chain(&["rm -rf build", "./app"])))
        .await
        .unwrap_err();

    assert!(matches!(err, RelaunchError::UnsafeCommand { .. }));
    assert!(h.backend.spawned().is_empty());
}

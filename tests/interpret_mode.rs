mod common;

use common::{interpret, Harness};
use relaunch::engine::CycleOutcome;
use relaunch::errors::RelaunchError;
use relaunch_test_utils::{argv, init_tracing, with_timeout};

#[tokio::test]
async fn runs_the_script_and_watches_it_explicitly() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("main.py");
    std::fs::write(&script, "print('hi')").unwrap();
    let mut h = Harness::in_dir(dir.path());

    with_timeout(h.reloader.start(&interpret("python3", &script)))
        .await
        .unwrap();

    let script_arg = script.to_string_lossy().into_owned();
    assert_eq!(h.backend.spawned(), vec![argv(&["python3", &script_arg])]);
    assert_eq!(h.changes.tracked(), vec![script]);
}

#[tokio::test]
async fn script_outside_the_working_directory_is_rejected() {
    init_tracing();
    let base = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let script = elsewhere.path().join("evil.py");
    std::fs::write(&script, "").unwrap();
    let mut h = Harness::in_dir(base.path());

    let err = with_timeout(h.reloader.start(&interpret("python3", &script)))
        .await
        .unwrap_err();

    assert!(matches!(err, RelaunchError::UnsafePath(_)));
    assert!(h.backend.spawned().is_empty());
}

#[tokio::test]
async fn change_restarts_without_any_build_step() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("server.js");
    std::fs::write(&script, "").unwrap();
    let mut h = Harness::in_dir(dir.path());
    let mode = interpret("node", &script);
    with_timeout(h.reloader.start(&mode)).await.unwrap();

    h.changes.push_change();
    let outcome = with_timeout(h.reloader.tick(&mode)).await;

    assert!(matches!(outcome, CycleOutcome::Restarted { .. }));
    assert_eq!(h.backend.spawned().len(), 2);
    assert_eq!(h.backend.running().len(), 1);
}

#[tokio::test]
async fn failed_restart_is_reported_and_the_next_cycle_recovers() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("main.rb");
    std::fs::write(&script, "").unwrap();
    let mut h = Harness::in_dir(dir.path());
    let mode = interpret("ruby", &script);
    with_timeout(h.reloader.start(&mode)).await.unwrap();

    h.backend.refuse_spawn("ruby");
    assert_eq!(
        with_timeout(h.reloader.restart(&mode)).await,
        CycleOutcome::RestartFailed
    );
    assert!(h.app_pid().is_none());

    h.backend.allow_spawn("ruby");
    assert!(matches!(
        with_timeout(h.reloader.restart(&mode)).await,
        CycleOutcome::Restarted { .. }
    ));
}

#[tokio::test]
async fn interpreter_with_shell_syntax_is_never_spawned() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("main.py");
    std::fs::write(&script, "").unwrap();
    let mut h = Harness::in_dir(dir.path());

    for interpreter in ["python3;rm", "python3 -c", "$(id)", ""] {
        let err = with_timeout(h.reloader.start(&interpret(interpreter, &script)))
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{interpreter:?} gave {err:?}");
    }
    assert!(h.backend.spawned().is_empty());
}

// tests/runtime_fake_runner.rs

mod common;
use crate::common::builders::UnitBuilder;
use crate::common::{ids, init_tracing, mock_store, no_delay, record, with_timeout};

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use sessiondag::checkpoint::ResolutionSource;
use sessiondag::engine::{DriverEvent, JobReport, OpenMode, Runtime, SessionManager};
use sessiondag::session::FLAG_INCOMPLETE;
use sessiondag::types::Outcome;
use sessiondag::unit::{Unit, UnitRegistry};
use sessiondag_test_utils::fake_runner::FakeRunner;

type TestResult = Result<(), Box<dyn Error>>;

fn registry(units: Vec<Unit>) -> UnitRegistry {
    let mut registry = UnitRegistry::new();
    for unit in units {
        registry.add_unit(unit);
    }
    registry
}

fn open_fresh(units: Vec<Unit>, desired: &[&str]) -> (SessionManager, sessiondag::fs::mock::MockFileSystem) {
    let (store, fs) = mock_store();
    let (mut manager, resolution) = SessionManager::open(
        store,
        no_delay(2),
        OpenMode::Fresh {
            registry: registry(units),
            title: Some("runtime test".to_string()),
        },
    )
    .unwrap();
    assert!(resolution.is_none());
    manager.update_desired_job_list(&ids(desired));
    (manager, fs)
}

#[tokio::test]
async fn test_runs_plan_in_order_and_checkpoints() -> TestResult {
    init_tracing();
    let (manager, _fs) = open_fresh(
        vec![
            UnitBuilder::new("A").build(),
            UnitBuilder::new("B").depends("A").build(),
            UnitBuilder::new("C").depends("B").build(),
        ],
        &["C"],
    );
    let id = manager.session_id().to_string();

    let executed = Arc::new(Mutex::new(Vec::new()));
    let (_tx, rx) = mpsc::channel::<DriverEvent>(4);
    let runtime = Runtime::new(manager, FakeRunner::new(Arc::clone(&executed)), rx);

    let (manager, summary) = with_timeout(runtime.run()).await?;

    assert_eq!(*executed.lock().unwrap(), ids(&["A", "B", "C"]));
    assert_eq!(summary.executed, ids(&["A", "B", "C"]));
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.outcomes.get(&Outcome::Pass), Some(&3));

    let stored = manager.store().load(&id)?;
    assert_eq!(stored.results.len(), 3);
    assert_eq!(stored.running_job, None);

    let store = manager.store().clone();
    let warnings = manager.close(false)?;
    assert!(warnings.is_empty());
    assert!(!store.load(&id)?.session.flags.contains(FLAG_INCOMPLETE));
    Ok(())
}

#[tokio::test]
async fn test_jobs_that_cannot_start_are_skipped() -> TestResult {
    let (manager, _fs) = open_fresh(
        vec![
            UnitBuilder::new("A").build(),
            UnitBuilder::new("B").depends("A").build(),
            UnitBuilder::new("C").build(),
        ],
        &["B", "C"],
    );

    let executed = Arc::new(Mutex::new(Vec::new()));
    let runner = FakeRunner::new(Arc::clone(&executed)).outcome("A", Outcome::Fail);
    let (_tx, rx) = mpsc::channel::<DriverEvent>(4);

    let (manager, summary) = with_timeout(Runtime::new(manager, runner, rx).run()).await?;

    assert_eq!(*executed.lock().unwrap(), ids(&["A", "C"]));
    assert_eq!(summary.skipped, ids(&["B"]));

    let b = manager.state().job_state("B").unwrap();
    assert_eq!(b.outcome(), Some(Outcome::Skip));
    let comments = b.result().and_then(|r| r.comments.clone()).unwrap();
    assert!(comments.contains("required dependency A has failed"));
    Ok(())
}

#[tokio::test]
async fn test_abort_skips_the_rest() -> TestResult {
    let (manager, _fs) = open_fresh(
        vec![
            UnitBuilder::new("A").build(),
            UnitBuilder::new("B").build(),
            UnitBuilder::new("C").build(),
        ],
        &["A", "B", "C"],
    );
    let id = manager.session_id().to_string();

    let executed = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = mpsc::channel::<DriverEvent>(4);
    let runner = FakeRunner::new(Arc::clone(&executed)).abort_after("A", tx.clone());

    let (manager, summary) = with_timeout(Runtime::new(manager, runner, rx).run()).await?;

    assert!(summary.aborted);
    assert_eq!(summary.executed, ids(&["A"]));
    assert_eq!(summary.skipped, ids(&["B", "C"]));

    // The abort is on disk too.
    let stored = manager.store().load(&id)?;
    assert_eq!(stored.results.get("C").map(|r| r.outcome), Some(Outcome::Skip));
    Ok(())
}

#[tokio::test]
async fn test_runner_failure_is_recorded_as_crash() -> TestResult {
    let (manager, _fs) = open_fresh(
        vec![UnitBuilder::new("A").build(), UnitBuilder::new("B").build()],
        &["A", "B"],
    );

    let executed = Arc::new(Mutex::new(Vec::new()));
    let runner = FakeRunner::new(Arc::clone(&executed)).broken("A");
    let (_tx, rx) = mpsc::channel::<DriverEvent>(4);

    let (manager, summary) = with_timeout(Runtime::new(manager, runner, rx).run()).await?;

    assert_eq!(summary.executed, ids(&["A", "B"]));
    let a = manager.state().job_state("A").unwrap();
    assert_eq!(a.outcome(), Some(Outcome::Crash));
    assert!(
        a.result()
            .and_then(|r| r.comments.as_deref())
            .is_some_and(|c| c.contains("runner exploded"))
    );
    Ok(())
}

#[tokio::test]
async fn test_resource_records_gate_later_jobs() -> TestResult {
    let (manager, _fs) = open_fresh(
        vec![
            UnitBuilder::resource("R").build(),
            UnitBuilder::new("yes").requires("R.ok == 'yes'").build(),
            UnitBuilder::new("no").requires("R.ok == 'no'").build(),
        ],
        &["R", "yes", "no"],
    );

    let executed = Arc::new(Mutex::new(Vec::new()));
    let runner = FakeRunner::new(Arc::clone(&executed)).script(
        "R",
        JobReport::outcome(Outcome::Pass).with_records(vec![record(&[("ok", "yes")])]),
    );
    let (_tx, rx) = mpsc::channel::<DriverEvent>(4);

    let (_manager, summary) = with_timeout(Runtime::new(manager, runner, rx).run()).await?;

    assert_eq!(summary.executed, ids(&["R", "yes"]));
    assert_eq!(summary.skipped, ids(&["no"]));
    Ok(())
}

#[tokio::test]
async fn test_local_job_output_is_run_in_the_same_session() -> TestResult {
    let (manager, _fs) = open_fresh(
        vec![UnitBuilder::local("gen").build()],
        &["gen"],
    );

    let executed = Arc::new(Mutex::new(Vec::new()));
    let runner = FakeRunner::new(Arc::clone(&executed)).script(
        "gen",
        JobReport::outcome(Outcome::Pass).with_units(vec![
            UnitBuilder::new("gen/a").build(),
            UnitBuilder::new("gen/b").depends("gen/a").build(),
        ]),
    );
    let (_tx, rx) = mpsc::channel::<DriverEvent>(4);

    let (manager, _summary) = with_timeout(Runtime::new(manager, runner, rx).run()).await?;

    assert_eq!(*executed.lock().unwrap(), ids(&["gen", "gen/a", "gen/b"]));
    assert_eq!(manager.run_list(), ids(&["gen", "gen/a", "gen/b"]).as_slice());
    Ok(())
}

#[tokio::test]
async fn test_failed_checkpoints_do_not_stop_the_session() -> TestResult {
    let (manager, fs) = open_fresh(
        vec![UnitBuilder::new("A").build(), UnitBuilder::new("B").build()],
        &["A", "B"],
    );
    fs.fail_next_writes(1000);

    let executed = Arc::new(Mutex::new(Vec::new()));
    let (_tx, rx) = mpsc::channel::<DriverEvent>(4);
    let runtime = Runtime::new(manager, FakeRunner::new(Arc::clone(&executed)), rx);

    let (manager, summary) = with_timeout(runtime.run()).await?;

    assert_eq!(summary.executed, ids(&["A", "B"]));
    assert!(!manager.warnings().is_empty());
    assert!(manager.warnings().iter().all(|w| w.attempts == 2));
    Ok(())
}

#[tokio::test]
async fn test_resume_after_interruption_continues_the_plan() -> TestResult {
    let (mut manager, _fs) = open_fresh(
        vec![
            UnitBuilder::new("A").build(),
            UnitBuilder::new("B").depends("A").build(),
        ],
        &["B"],
    );
    let id = manager.session_id().to_string();

    // Simulate a reboot while A was running.
    manager.start_job("A")?;
    let store = manager.store().clone();
    drop(manager);

    let (manager, resolution) = SessionManager::open(
        store,
        no_delay(2),
        OpenMode::Resume {
            session_id: id.clone(),
        },
    )?;
    let resolution = resolution.unwrap();
    assert_eq!(resolution.job, "A");
    assert_eq!(resolution.source, ResolutionSource::Crash);

    let executed = Arc::new(Mutex::new(Vec::new()));
    let (_tx, rx) = mpsc::channel::<DriverEvent>(4);
    let (_manager, summary) =
        with_timeout(Runtime::new(manager, FakeRunner::new(Arc::clone(&executed)), rx).run())
            .await?;

    assert!(executed.lock().unwrap().is_empty());
    assert_eq!(summary.skipped, ids(&["B"]));
    Ok(())
}

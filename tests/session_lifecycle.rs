// tests/session_lifecycle.rs

mod common;
use crate::common::builders::UnitBuilder;
use crate::common::{ids, init_tracing, planned_session, record};

use sessiondag::session::{
    InhibitionCause, JobResult, JobStatus, Readiness, SessionError, SessionMetadata, SessionState,
};
use sessiondag::solver::DependencyProblem;
use sessiondag::types::{Outcome, Plugin};

fn chain() -> SessionState {
    planned_session(
        vec![
            UnitBuilder::new("A").build(),
            UnitBuilder::new("B").depends("A").build(),
            UnitBuilder::new("C").after("B").build(),
            UnitBuilder::new("D").build(),
        ],
        &["C"],
    )
}

#[test]
fn test_initial_readiness_follows_the_plan() {
    init_tracing();
    let state = chain();

    assert_eq!(state.run_list(), ids(&["A", "B", "C"]).as_slice());
    assert_eq!(state.readiness("A"), Some(Readiness::CanStart));
    assert_eq!(state.readiness("B"), Some(Readiness::BlockedByDependency));
    assert_eq!(state.readiness("C"), Some(Readiness::BlockedByDependency));
    assert_eq!(state.readiness("D"), Some(Readiness::Undesired));
    assert_eq!(state.next_job().map(String::as_str), Some("A"));
}

#[test]
fn test_pass_unblocks_dependents() {
    let mut state = chain();

    state.mark_running("A").unwrap();
    assert_eq!(state.job_state("A").unwrap().status(), JobStatus::Running);

    let change = state
        .update_job_result("A", JobResult::new(Outcome::Pass))
        .unwrap();

    assert_eq!(change.job, "A");
    assert!(change.changed.contains("B"));
    assert!(change.affected.contains("B") && change.affected.contains("C"));
    assert_eq!(state.readiness("B"), Some(Readiness::CanStart));
    assert_eq!(state.readiness("C"), Some(Readiness::BlockedByDependency));
    assert_eq!(state.running_job(), None);
}

#[test]
fn test_failed_direct_dependency_blocks_but_ordering_only_waits() {
    let mut state = chain();

    state
        .update_job_result("A", JobResult::new(Outcome::Fail))
        .unwrap();
    let b = state.job_state("B").unwrap();
    assert_eq!(b.readiness(), Readiness::BlockedByDependency);
    assert_eq!(b.inhibitors()[0].cause, InhibitionCause::FailedDependency);

    state
        .update_job_result("B", JobResult::new(Outcome::Skip))
        .unwrap();
    assert_eq!(state.readiness("C"), Some(Readiness::CanStart));
}

#[test]
fn test_same_outcome_twice_is_idempotent() {
    let mut once = chain();
    let mut twice = chain();

    let first = once
        .update_job_result("A", JobResult::new(Outcome::Pass))
        .unwrap();
    twice
        .update_job_result("A", JobResult::new(Outcome::Pass))
        .unwrap();
    let second = twice
        .update_job_result("A", JobResult::new(Outcome::Pass))
        .unwrap();

    assert!(second.changed.is_empty());
    assert_eq!(first.affected, second.affected);
    for id in ["A", "B", "C", "D"] {
        assert_eq!(once.readiness(id), twice.readiness(id));
    }
}

#[test]
fn test_conflicting_outcome_is_rejected() {
    let mut state = chain();
    state
        .update_job_result("A", JobResult::new(Outcome::Pass))
        .unwrap();

    let err = state
        .update_job_result("A", JobResult::new(Outcome::Fail))
        .unwrap_err();

    assert_eq!(
        err,
        SessionError::OutcomeConflict {
            id: "A".to_string(),
            recorded: Outcome::Pass,
            requested: Outcome::Fail,
        }
    );
    assert_eq!(state.job_state("A").unwrap().outcome(), Some(Outcome::Pass));
}

#[test]
fn test_results_only_for_run_list_jobs() {
    let mut state = chain();

    assert_eq!(
        state.update_job_result("D", JobResult::new(Outcome::Pass)),
        Err(SessionError::NotInRunList("D".to_string()))
    );
    assert_eq!(
        state.update_job_result("Z", JobResult::new(Outcome::Pass)),
        Err(SessionError::UnknownJob("Z".to_string()))
    );
}

#[test]
fn test_blocked_job_cannot_be_started() {
    let mut state = chain();

    assert!(matches!(
        state.mark_running("B"),
        Err(SessionError::NotRunnable { .. })
    ));

    state.mark_running("A").unwrap();
    assert!(matches!(
        state.mark_running("C"),
        Err(SessionError::AlreadyRunning { .. })
    ));
}

#[test]
fn test_resource_records_drive_requirements() {
    let mut state = planned_session(
        vec![
            UnitBuilder::resource("ns::device").build(),
            UnitBuilder::new("ns::wifi")
                .requires("device.category == 'WIRELESS'")
                .build(),
            UnitBuilder::new("ns::eth")
                .requires("device.category == 'ETHERNET'")
                .build(),
        ],
        &["ns::device", "ns::wifi", "ns::eth"],
    );

    assert_eq!(
        state.readiness("ns::wifi"),
        Some(Readiness::BlockedByMissingData)
    );

    let change = state
        .update_resource_job_result(
            "ns::device",
            JobResult::new(Outcome::Pass),
            vec![
                record(&[("category", "WIRELESS")]),
                record(&[("category", "AUDIO")]),
            ],
        )
        .unwrap();

    assert!(change.changed.contains("ns::wifi") && change.changed.contains("ns::eth"));
    assert_eq!(state.readiness("ns::wifi"), Some(Readiness::CanStart));
    assert_eq!(state.readiness("ns::eth"), Some(Readiness::BlockedByResource));
    assert_eq!(state.resources().get("ns::device").map(<[_]>::len), Some(2));
}

#[test]
fn test_failed_resource_job_stores_no_records() {
    let mut state = planned_session(
        vec![
            UnitBuilder::resource("R").build(),
            UnitBuilder::new("A").requires("R.x == '1'").build(),
        ],
        &["R", "A"],
    );

    state
        .update_resource_job_result(
            "R",
            JobResult::new(Outcome::Fail),
            vec![record(&[("x", "1")])],
        )
        .unwrap();

    assert!(!state.resources().contains("R"));
    assert_eq!(state.readiness("A"), Some(Readiness::BlockedByMissingData));
}

#[test]
fn test_salvage_job_runs_only_after_failure() {
    let mut state = planned_session(
        vec![
            UnitBuilder::new("A").build(),
            UnitBuilder::new("recover").salvages("A").build(),
        ],
        &["A", "recover"],
    );

    assert_eq!(state.readiness("recover"), Some(Readiness::BlockedByDependency));

    state
        .update_job_result("A", JobResult::new(Outcome::Crash))
        .unwrap();
    assert_eq!(state.readiness("recover"), Some(Readiness::CanStart));
}

#[test]
fn test_generated_units_extend_the_plan_suffix() {
    let mut state = planned_session(
        vec![
            UnitBuilder::local("gen").build(),
            UnitBuilder::new("first").build(),
        ],
        &["gen", "first"],
    );

    state
        .update_job_result("gen", JobResult::new(Outcome::Pass))
        .unwrap();
    state
        .update_job_result("first", JobResult::new(Outcome::Pass))
        .unwrap();

    let plan = state
        .add_generated_units(
            "gen",
            vec![
                UnitBuilder::new("gen/one").build(),
                UnitBuilder::new("gen/two").depends("gen/one").build(),
                UnitBuilder::local("gen/nested").build(),
            ],
        )
        .unwrap();

    assert_eq!(plan.run_list, ids(&["gen", "first", "gen/one", "gen/two"]));
    assert!(plan.problems.iter().any(|p| matches!(
        p,
        DependencyProblem::Unsupported { id, .. } if id == "gen/nested"
    )));
    assert_eq!(
        state.graph().get("gen/one").and_then(|u| u.via.as_deref()),
        Some("gen")
    );
    assert_eq!(state.job_state("gen").unwrap().outcome(), Some(Outcome::Pass));
}

#[test]
fn test_only_local_jobs_generate_units() {
    let mut state = chain();
    assert_eq!(
        state.add_generated_units("A", vec![UnitBuilder::new("X").build()]),
        Err(SessionError::NotLocal("A".to_string()))
    );
}

#[test]
fn test_abort_skips_every_unfinished_job() {
    let mut state = chain();
    state
        .update_job_result("A", JobResult::new(Outcome::Pass))
        .unwrap();

    let skipped = state.mark_remaining_skipped("operator abort");

    assert_eq!(skipped, ids(&["B", "C"]));
    assert_eq!(state.next_job(), None);
    assert_eq!(
        state
            .job_state("B")
            .and_then(|s| s.result())
            .and_then(|r| r.comments.as_deref()),
        Some("operator abort")
    );
    assert_eq!(state.outcome_stats().get(&Outcome::Skip), Some(&2));
}

#[test]
fn test_mandatory_jobs_come_first() {
    let mut state = SessionState::new(
        vec![
            UnitBuilder::new("A").build(),
            UnitBuilder::new("boot").build(),
        ],
        SessionMetadata::new(None),
    );
    state.update_mandatory_job_list(&ids(&["boot"]));
    let plan = state.update_desired_job_list(&ids(&["A", "boot"]));

    assert_eq!(plan.run_list, ids(&["boot", "A"]));
    assert_eq!(plan.version, 1);
}

#[test]
fn test_replanning_keeps_executed_prefix() {
    let mut state = chain();
    state
        .update_job_result("A", JobResult::new(Outcome::Pass))
        .unwrap();

    let plan = state.update_desired_job_list(&ids(&["D"]));

    assert_eq!(plan.run_list, ids(&["A", "D"]));
    assert_eq!(state.readiness("B"), Some(Readiness::Undesired));
    assert_eq!(state.job_state("A").unwrap().outcome(), Some(Outcome::Pass));
}

#[test]
fn test_estimated_duration_splits_manual_and_automated() {
    let state = planned_session(
        vec![
            UnitBuilder::new("auto").estimated_duration(10.0).build(),
            UnitBuilder::new("human")
                .plugin(Plugin::UserVerify)
                .build(),
        ],
        &["auto", "human"],
    );

    let estimate = state.estimated_duration();
    assert_eq!(estimate.automated, Some(10.0));
    assert_eq!(estimate.manual, None);
}

// tests/solver_scenarios.rs

mod common;
use crate::common::builders::UnitBuilder;
use crate::common::{ids, init_tracing};

use sessiondag::solver::{DependencyKind, DependencyProblem, UnitGraph, solve};

#[test]
fn test_diamond_dependencies_are_ordered() {
    init_tracing();
    let graph = UnitGraph::build(vec![
        UnitBuilder::new("A").build(),
        UnitBuilder::new("B").depends("A").build(),
        UnitBuilder::new("C").depends("B").depends("A").build(),
    ]);

    let solution = solve(&graph, &ids(&["C"]));

    assert_eq!(solution.run_list, ids(&["A", "B", "C"]));
    assert!(solution.problems.is_empty());
}

#[test]
fn test_two_job_cycle_yields_empty_plan() {
    init_tracing();
    let graph = UnitGraph::build(vec![
        UnitBuilder::new("A").depends("B").build(),
        UnitBuilder::new("B").depends("A").build(),
    ]);

    let solution = solve(&graph, &ids(&["A", "B"]));

    assert!(solution.run_list.is_empty());
    assert_eq!(
        solution.problems,
        vec![DependencyProblem::Cycle {
            path: ids(&["A", "B", "A"])
        }]
    );
}

#[test]
fn test_self_dependency_is_a_one_cycle() {
    let graph = UnitGraph::build(vec![
        UnitBuilder::new("A").depends("A").build(),
        UnitBuilder::new("B").build(),
    ]);

    let solution = solve(&graph, &ids(&["A", "B"]));

    assert_eq!(solution.run_list, ids(&["B"]));
    assert_eq!(
        solution.problems,
        vec![DependencyProblem::Cycle {
            path: ids(&["A", "A"])
        }]
    );
}

#[test]
fn test_missing_dependency_excludes_referencing_job_only() {
    let graph = UnitGraph::build(vec![
        UnitBuilder::new("A").depends("ghost").build(),
        UnitBuilder::new("B").build(),
    ]);

    let solution = solve(&graph, &ids(&["A", "B"]));

    assert_eq!(solution.run_list, ids(&["B"]));
    assert_eq!(
        solution.problems,
        vec![DependencyProblem::Missing {
            id: "ghost".to_string(),
            referenced_by: "A".to_string(),
            dependency: DependencyKind::Direct,
        }]
    );
}

#[test]
fn test_dependents_of_excluded_jobs_are_reported_missing() {
    let graph = UnitGraph::build(vec![
        UnitBuilder::new("A").depends("B").build(),
        UnitBuilder::new("B").depends("A").build(),
        UnitBuilder::new("C").depends("A").build(),
        UnitBuilder::new("D").build(),
    ]);

    let solution = solve(&graph, &ids(&["C", "D"]));

    assert_eq!(solution.run_list, ids(&["D"]));
    assert_eq!(solution.problems.len(), 2);
    assert!(matches!(solution.problems[0], DependencyProblem::Cycle { .. }));
    assert_eq!(
        solution.problems[1],
        DependencyProblem::Missing {
            id: "A".to_string(),
            referenced_by: "C".to_string(),
            dependency: DependencyKind::Direct,
        }
    );
}

#[test]
fn test_differing_duplicate_is_reported_and_first_kept() {
    let graph = UnitGraph::build(vec![
        UnitBuilder::new("A").command("echo first").build(),
        UnitBuilder::new("A").command("echo second").build(),
    ]);

    assert_eq!(graph.len(), 1);
    assert_eq!(
        graph.get("A").and_then(|u| u.command.as_deref()),
        Some("echo first")
    );
    assert!(matches!(
        graph.problems(),
        [DependencyProblem::Duplicate { id, .. }] if id == "A"
    ));
}

#[test]
fn test_identical_duplicate_is_merged_silently() {
    let graph = UnitGraph::build(vec![
        UnitBuilder::new("A").command("echo").build(),
        UnitBuilder::new("A").command("echo").build(),
    ]);

    assert_eq!(graph.len(), 1);
    assert!(graph.problems().is_empty());
}

#[test]
fn test_unknown_desired_job_is_reported_and_ignored() {
    let graph = UnitGraph::build(vec![UnitBuilder::new("A").build()]);

    let solution = solve(&graph, &ids(&["nope", "A"]));

    assert_eq!(solution.run_list, ids(&["A"]));
    assert_eq!(
        solution.problems,
        vec![DependencyProblem::Unknown {
            id: "nope".to_string()
        }]
    );
}

#[test]
fn test_after_dependencies_are_expanded_after_depends() {
    let graph = UnitGraph::build(vec![
        UnitBuilder::new("X").build(),
        UnitBuilder::new("Y").build(),
        UnitBuilder::new("Z").after("X").depends("Y").build(),
    ]);

    let solution = solve(&graph, &ids(&["Z"]));

    assert_eq!(solution.run_list, ids(&["Y", "X", "Z"]));
}

#[test]
fn test_salvage_target_is_not_pulled_in_but_must_exist() {
    let graph = UnitGraph::build(vec![
        UnitBuilder::new("A").build(),
        UnitBuilder::new("fix").salvages("A").build(),
        UnitBuilder::new("fix-ghost").salvages("ghost").build(),
    ]);

    let solution = solve(&graph, &ids(&["fix", "fix-ghost"]));

    assert_eq!(solution.run_list, ids(&["fix"]));
    assert!(matches!(
        solution.problems.as_slice(),
        [DependencyProblem::Missing { dependency: DependencyKind::Salvage, .. }]
    ));
}

#[test]
fn test_resource_reference_is_not_an_expansion_edge() {
    let graph = UnitGraph::build(vec![
        UnitBuilder::resource("ns::devices").build(),
        UnitBuilder::new("ns::net").requires("devices.category == 'NETWORK'").build(),
    ]);

    let solution = solve(&graph, &ids(&["ns::net"]));

    assert_eq!(solution.run_list, ids(&["ns::net"]));
    assert!(solution.problems.is_empty());
}

#[test]
fn test_unknown_resource_is_missing() {
    let graph = UnitGraph::build(vec![
        UnitBuilder::new("ns::net").requires("devices.category == 'NETWORK'").build(),
    ]);

    let solution = solve(&graph, &ids(&["ns::net"]));

    assert!(solution.run_list.is_empty());
    assert_eq!(
        solution.problems,
        vec![DependencyProblem::Missing {
            id: "ns::devices".to_string(),
            referenced_by: "ns::net".to_string(),
            dependency: DependencyKind::Resource,
        }]
    );
}

#[test]
fn test_broken_requirement_excludes_job_and_is_reported_once() {
    let graph = UnitGraph::build(vec![
        UnitBuilder::resource("R").build(),
        UnitBuilder::new("A").requires("R.x ==").build(),
        UnitBuilder::new("B").build(),
    ]);

    let solution = solve(&graph, &ids(&["A", "B"]));

    assert_eq!(solution.run_list, ids(&["B"]));
    assert!(solution.problems.is_empty());
    assert!(matches!(
        graph.problems(),
        [DependencyProblem::Expression { id, .. }] if id == "A"
    ));
}

#[test]
fn test_desired_order_is_the_tie_break() {
    let graph = UnitGraph::build(vec![
        UnitBuilder::new("A").build(),
        UnitBuilder::new("B").build(),
        UnitBuilder::new("C").build(),
    ]);

    assert_eq!(solve(&graph, &ids(&["C", "A", "B"])).run_list, ids(&["C", "A", "B"]));
    assert_eq!(solve(&graph, &ids(&["B", "C", "A"])).run_list, ids(&["B", "C", "A"]));
}

#[test]
fn test_influence_graph_reaches_transitive_consumers() {
    let graph = UnitGraph::build(vec![
        UnitBuilder::resource("R").build(),
        UnitBuilder::new("A").requires("R.ok == 'yes'").build(),
        UnitBuilder::new("B").depends("A").build(),
        UnitBuilder::new("C").build(),
    ]);

    assert_eq!(graph.dependents_of("R"), ids(&["A"]));
    let affected: Vec<String> = graph.affected_by("R").into_iter().collect();
    assert_eq!(affected, ids(&["A", "B"]));
    assert!(graph.affected_by("C").is_empty());
}

fn chain(len: usize) -> Vec<sessiondag::unit::Unit> {
    (0..len)
        .map(|i| {
            let unit = UnitBuilder::new(&format!("job-{i}"));
            if i == 0 {
                unit.build()
            } else {
                unit.depends(&format!("job-{}", i - 1)).build()
            }
        })
        .collect()
}

#[test]
fn test_long_dependency_chain_is_solved() {
    let len = 100_000;
    let graph = UnitGraph::build(chain(len));

    let last = format!("job-{}", len - 1);
    let solution = solve(&graph, &ids(&[last.as_str()]));

    assert!(solution.problems.is_empty());
    assert_eq!(solution.run_list.len(), len);
    assert_eq!(solution.run_list[0], "job-0");
    assert_eq!(solution.run_list[len - 1], last);
}

#[test]
fn test_long_cycle_is_reported_with_its_full_path() {
    let len = 20_000;
    let mut units = chain(len);
    units[0] = UnitBuilder::new("job-0")
        .depends(&format!("job-{}", len - 1))
        .build();
    let graph = UnitGraph::build(units);

    let solution = solve(&graph, &ids(&["job-0"]));

    assert!(solution.run_list.is_empty());
    let [DependencyProblem::Cycle { path }] = solution.problems.as_slice() else {
        panic!("expected a single cycle, got {:?}", solution.problems);
    };
    assert_eq!(path.len(), len + 1);
    assert_eq!(path.first(), path.last());
}

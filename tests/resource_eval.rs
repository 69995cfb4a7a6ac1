// tests/resource_eval.rs

mod common;
use crate::common::record;

use sessiondag::resource::expr::{CmpOp, Expr, ExpressionError, Value, parse};
use sessiondag::resource::{
    RequirementProgram, ResourceMap, Satisfaction, is_satisfied, records_from_text,
};
use sessiondag::unit::Import;

fn interfaces() -> ResourceMap {
    let mut map = ResourceMap::new();
    map.set("R", vec![record(&[("iface", "a")]), record(&[("iface", "b")])]);
    map
}

#[test]
fn test_existential_match_over_records() {
    let map = interfaces();

    assert_eq!(is_satisfied("R.iface == 'b'", &map), Ok(Satisfaction::Satisfied));
    assert_eq!(is_satisfied("R.iface == \"c\"", &map), Ok(Satisfaction::Unsatisfied));
}

#[test]
fn test_absent_resource_is_indeterminate() {
    let map = ResourceMap::new();
    assert_eq!(is_satisfied("R.iface == 'b'", &map), Ok(Satisfaction::Indeterminate));
}

#[test]
fn test_empty_record_list_is_unsatisfied() {
    let mut map = ResourceMap::new();
    map.set("R", Vec::new());
    assert_eq!(is_satisfied("R.iface == 'b'", &map), Ok(Satisfaction::Unsatisfied));
}

#[test]
fn test_missing_field_is_no_match_not_an_error() {
    let mut map = ResourceMap::new();
    map.set(
        "R",
        vec![record(&[("other", "x")]), record(&[("iface", "b")])],
    );

    assert_eq!(is_satisfied("R.iface == 'b'", &map), Ok(Satisfaction::Satisfied));
    assert_eq!(is_satisfied("R.nope == 'b'", &map), Ok(Satisfaction::Unsatisfied));
}

#[test]
fn test_type_errors_count_as_no_match() {
    let mut map = ResourceMap::new();
    map.set("R", vec![record(&[("count", "many")]), record(&[("count", "8")])]);

    assert_eq!(is_satisfied("int(R.count) >= 4", &map), Ok(Satisfaction::Satisfied));
    assert_eq!(is_satisfied("R.count > 4", &map), Ok(Satisfaction::Unsatisfied));
}

#[test]
fn test_each_resource_binds_one_record_at_a_time() {
    let mut map = ResourceMap::new();
    map.set(
        "cpu",
        vec![
            record(&[("arch", "amd64"), ("cores", "2")]),
            record(&[("arch", "arm64"), ("cores", "8")]),
        ],
    );
    map.set("mem", vec![record(&[("size", "4096")])]);

    // No single record is arm64 with 2 cores.
    assert_eq!(
        is_satisfied("cpu.arch == 'arm64' and cpu.cores == '2'", &map),
        Ok(Satisfaction::Unsatisfied)
    );
    assert_eq!(
        is_satisfied("cpu.arch == 'arm64' and int(mem.size) > 1024", &map),
        Ok(Satisfaction::Satisfied)
    );
}

#[test]
fn test_membership_and_connectives() {
    let mut map = ResourceMap::new();
    map.set(
        "pkg",
        vec![record(&[("name", "network-manager"), ("version", "1.42")])],
    );

    assert_eq!(
        is_satisfied("pkg.name in ['network-manager', 'netplan']", &map),
        Ok(Satisfaction::Satisfied)
    );
    assert_eq!(
        is_satisfied("'manager' in pkg.name", &map),
        Ok(Satisfaction::Satisfied)
    );
    assert_eq!(
        is_satisfied("pkg.name not in ['ifupdown']", &map),
        Ok(Satisfaction::Satisfied)
    );
    assert_eq!(
        is_satisfied("not pkg.name == 'network-manager' or float(pkg.version) < 1.0", &map),
        Ok(Satisfaction::Unsatisfied)
    );
}

#[test]
fn test_parse_field_comparison() {
    let expr = parse("device.category == 'WIRELESS'").unwrap();
    assert_eq!(
        expr,
        Expr::Compare {
            op: CmpOp::Eq,
            lhs: Box::new(Expr::Field {
                alias: "device".to_string(),
                field: "category".to_string(),
            }),
            rhs: Box::new(Expr::Literal(Value::Str("WIRELESS".to_string()))),
        }
    );
}

#[test]
fn test_parse_not_in_is_a_single_operator() {
    let expr = parse("R.a not in ['x']").unwrap();
    assert!(matches!(expr, Expr::Compare { op: CmpOp::NotIn, .. }));
}

#[test]
fn test_parse_chained_comparison_becomes_and() {
    let expr = parse("1 < int(R.n) < 5").unwrap();
    assert!(matches!(expr, Expr::And(_, _)));
}

#[test]
fn test_parse_rejects_arbitrary_calls() {
    assert_eq!(
        parse("__import__('os').system('reboot')"),
        Err(ExpressionError::CallNotAllowed {
            name: "__import__".to_string()
        })
    );
}

#[test]
fn test_parse_rejects_bare_names_and_resource_free_expressions() {
    assert!(matches!(
        parse("iface == 'a'"),
        Err(ExpressionError::BareName { .. })
    ));
    assert_eq!(parse("1 == 1"), Err(ExpressionError::NoResources));
    assert_eq!(parse("   "), Err(ExpressionError::Empty));
}

#[test]
fn test_parse_rejects_trailing_tokens() {
    assert!(matches!(
        parse("R.a == 'x' 'y'"),
        Err(ExpressionError::UnexpectedToken { .. })
    ));
    assert!(matches!(
        parse("R.a == 'x"),
        Err(ExpressionError::UnterminatedString { .. })
    ));
}

#[test]
fn test_program_resolves_aliases_through_imports_and_namespace() {
    let imports = vec![Import {
        namespace: "com.other".to_string(),
        partial_id: "device".to_string(),
        alias: "dev".to_string(),
    }];
    let program = RequirementProgram::compile(
        &["dev.category == 'NETWORK'".to_string(), "cpuinfo.count > '1'".to_string()],
        Some("com.example"),
        &imports,
    )
    .unwrap();

    assert_eq!(
        program.required_resources(),
        vec![
            "com.other::device".to_string(),
            "com.example::cpuinfo".to_string()
        ]
    );
}

#[test]
fn test_program_unsatisfied_dominates_indeterminate() {
    let program = RequirementProgram::compile(
        &["a.x == '1'".to_string(), "b.y == '2'".to_string()],
        None,
        &[],
    )
    .unwrap();

    let mut map = ResourceMap::new();
    map.set("a", vec![record(&[("x", "0")])]);
    assert_eq!(program.satisfaction(&map), Satisfaction::Unsatisfied);

    map.set("a", vec![record(&[("x", "1")])]);
    assert_eq!(program.satisfaction(&map), Satisfaction::Indeterminate);

    map.set("b", vec![record(&[("y", "2")])]);
    assert_eq!(program.satisfaction(&map), Satisfaction::Satisfied);
}

#[test]
fn test_records_from_resource_job_output() {
    let text = "name: eth0\ncategory: NETWORK\n\nname: wlan0\ncategory: WIRELESS\n";
    let records = records_from_text(text);

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].get("name").map(String::as_str), Some("wlan0"));
}

#[test]
fn test_parse_accepts_moderate_nesting() {
    let text = format!("{}R.x == 'a'{}", "(".repeat(40), ")".repeat(40));
    assert!(parse(&text).is_ok());
    assert!(parse(&format!("{}R.x == 'a'", "not ".repeat(40))).is_ok());
}

#[test]
fn test_parse_rejects_runaway_nesting() {
    let parens = format!("{}R.x == 'a'{}", "(".repeat(10_000), ")".repeat(10_000));
    assert!(matches!(parse(&parens), Err(ExpressionError::TooDeep { .. })));

    let negations = format!("{}R.x == 'a'", "not ".repeat(10_000));
    assert!(matches!(parse(&negations), Err(ExpressionError::TooDeep { .. })));
}

// tests/logging_filter.rs

use sessiondag::cli::LogLevel;
use sessiondag::logging::filter_directive;

#[test]
fn test_cli_level_wins_over_environment() {
    assert_eq!(
        filter_directive(Some(LogLevel::Debug), Some("sessiondag=trace")),
        "debug"
    );
}

#[test]
fn test_environment_directive_is_used_verbatim() {
    assert_eq!(
        filter_directive(None, Some(" info,sessiondag::solver=trace ")),
        "info,sessiondag::solver=trace"
    );
}

#[test]
fn test_default_is_info() {
    assert_eq!(filter_directive(None, None), "info");
    assert_eq!(filter_directive(None, Some("   ")), "info");
    assert_eq!(filter_directive(None, Some("sessiondag=loud")), "info");
}

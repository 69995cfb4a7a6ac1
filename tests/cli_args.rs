// tests/cli_args.rs

use clap::Parser;
use clap::error::ErrorKind;
use tempfile::NamedTempFile;

use sessiondag::cli::CliArgs;

#[test]
fn test_an_action_is_required() {
    let err = CliArgs::try_parse_from(["sessiondag"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

    let err = CliArgs::try_parse_from(["sessiondag", "--job", "a"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
}

#[test]
fn test_actions_are_mutually_exclusive() {
    let err = CliArgs::try_parse_from(["sessiondag", "--dry-run", "--list-sessions"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

    let err =
        CliArgs::try_parse_from(["sessiondag", "--inspect", "s1", "--discard", "s1"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
}

#[test]
fn test_dry_run_is_parsed() {
    let args =
        CliArgs::try_parse_from(["sessiondag", "--dry-run", "--job", "a", "--job", "b"]).unwrap();
    assert!(args.dry_run);
    assert_eq!(args.jobs, vec!["a".to_string(), "b".to_string()]);
    assert!(!args.list_sessions);
}

#[tokio::test]
async fn test_run_without_an_action_is_an_error() {
    let plan = NamedTempFile::new().unwrap();
    let args = CliArgs {
        config: plan.path().to_string_lossy().into_owned(),
        jobs: Vec::new(),
        log_level: None,
        dry_run: false,
        list_sessions: false,
        inspect: None,
        discard: None,
    };

    let err = sessiondag::run(args.clone()).await.unwrap_err();
    assert!(err.to_string().contains("--dry-run"));

    let dry = CliArgs {
        dry_run: true,
        ..args
    };
    assert!(sessiondag::run(dry).await.is_ok());
}

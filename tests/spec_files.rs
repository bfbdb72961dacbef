//! Specification file parsing tests
//!
//! Parses the markdown fixtures the way the CLI does.

use spectest::spec::{parse_spec_file, CheckType};
use spectest::SpecTestError;
use tokio_test::{assert_err, assert_ok};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[tokio::test]
async fn test_login_spec_fixture() {
    let spec = assert_ok!(parse_spec_file(fixture("login-spec.md")).await);

    assert_eq!(spec.name, "Login");
    assert_eq!(spec.directory.as_deref(), Some("app/(app)/auth/behaviors/login/"));
    assert_eq!(spec.examples.len(), 1);

    let example = &spec.examples[0];
    assert_eq!(example.name, "Login with valid credentials");
    assert_eq!(example.steps.len(), 5);
    assert!(example.steps[0].is_act());
    assert!(example.steps[3].is_check());
    assert_eq!(example.steps[3].check_type(), Some(CheckType::Deterministic));
    assert_eq!(example.steps[4].check_type(), Some(CheckType::Deterministic));
    assert_eq!(example.steps[0].line(), 13);
    assert_eq!(example.steps[4].line(), 17);
}

#[tokio::test]
async fn test_failure_spec_fixture() {
    let spec = assert_ok!(parse_spec_file(fixture("login-failure-spec.md")).await);

    assert_eq!(spec.name, "Login Failure");
    let example = &spec.examples[0];
    assert_eq!(example.name, "Click non-existent element");
    assert_eq!(example.steps.len(), 2);
    assert!(example.steps[0].instruction().contains("Submit Application"));
    assert_eq!(example.steps[1].check_type(), Some(CheckType::Semantic));
}

#[test]
fn test_missing_file_reports_path() {
    let path = fixture("does-not-exist.md");
    let err = assert_err!(tokio_test::block_on(parse_spec_file(&path)));
    assert!(matches!(err, SpecTestError::WithContext { .. }));
    assert!(err.to_string().contains("does-not-exist.md"));
}

//! Runner protocol tests
//!
//! Drives `SpecRunner` end to end over the scripted driver and asserter.

use std::path::PathBuf;
use std::sync::Arc;

use spectest::assert::ScriptedAsserter;
use spectest::browser::{PageEffect, RawElement, ScriptedDriver};
use spectest::core::StepOutcome;
use spectest::runner::{RunnerState, ScriptedSessionFactory};
use spectest::{parse_spec, Config, SpecRunner, SpecTestError};

const LOGIN_URL: &str = "http://app.test/login";
const DASHBOARD_URL: &str = "http://app.test/dashboard";

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn login_driver() -> ScriptedDriver {
    ScriptedDriver::new()
        .with_page(LOGIN_URL, "Login", "Sign in\nEmail\nPassword")
        .with_page(DASHBOARD_URL, "Dashboard", "Welcome back, Ada\nSign out")
        .on_act(
            "Fill the email field with ada@example.com",
            vec![PageEffect::Value {
                selector: "#email".to_string(),
                value: "ada@example.com".to_string(),
            }],
        )
        .on_act("Fill the password field with correct-horse", vec![])
        .on_act(
            "Click the Sign in button",
            vec![PageEffect::Navigate(DASHBOARD_URL.to_string())],
        )
        .on_act("Click Sign out", vec![PageEffect::Navigate(LOGIN_URL.to_string())])
        .with_elements(vec![
            RawElement::new("input").with_id("email").with_attr("type", "email"),
            RawElement::new("button").with_id("sign-in").with_text("Sign in"),
            RawElement::new("a").with_class("forgot").with_attr("href", "/forgot"),
        ])
}

fn config() -> Config {
    let mut config = Config::default();
    config.runner.base_url = LOGIN_URL.to_string();
    config.runner.cache_dir = None;
    config.runner.cache_per_spec = false;
    config
}

fn runner_with(
    config: Config,
    driver: ScriptedDriver,
    asserter: ScriptedAsserter,
) -> (SpecRunner, ScriptedSessionFactory) {
    let factory = ScriptedSessionFactory::new(driver, asserter);
    let runner = SpecRunner::with_factory(config, Arc::new(factory.clone()));
    (runner, factory)
}

#[tokio::test]
async fn test_login_fixture_passes() {
    let (mut runner, factory) = runner_with(config(), login_driver(), ScriptedAsserter::new());

    let result = runner.run_file(fixture("login-spec.md"), None).await.unwrap();

    assert!(result.success);
    assert_eq!(result.example_results.len(), 1);
    let example = &result.example_results[0];
    assert_eq!(example.example.name, "Login with valid credentials");
    assert_eq!(example.steps.len(), 5);
    assert!(example.steps.iter().all(|s| s.success));
    assert!(example.failed_at.is_none());
    assert_eq!(factory.open_count(), 1);
    assert_eq!(result.passed_count(), 1);
}

#[tokio::test]
async fn test_each_action_rebaselines_semantic_checks() {
    let spec = parse_spec(
        "# Session\n\n## Examples\n\n### Sign in and out\n\n#### Steps\n\
         * Act: Click the Sign in button\n\
         * Check: The user is greeted by name\n\
         * Act: Click Sign out\n\
         * Check: The sign in form is shown again\n",
    );
    let asserter = ScriptedAsserter::new().with_default(true);
    let (mut runner, _) = runner_with(config(), login_driver(), asserter.clone());

    let result = runner.run_spec(&spec, None).await.unwrap();
    assert!(result.success);

    // once per action, never for the example start
    assert_eq!(asserter.clear_count(), 2);
    // initial baseline, one per action, one per semantic check
    assert_eq!(asserter.snapshot_count(), 5);

    let calls = asserter.assert_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].before.as_ref().unwrap().url, LOGIN_URL);
    assert_eq!(calls[0].after.as_ref().unwrap().url, DASHBOARD_URL);
    assert_eq!(calls[1].before.as_ref().unwrap().url, DASHBOARD_URL);
    assert_eq!(calls[1].after.as_ref().unwrap().url, LOGIN_URL);
}

#[tokio::test]
async fn test_semantic_check_before_any_action_uses_initial_snapshot() {
    let spec = parse_spec("# Home\n\n* Check: The sign in form is visible\n");
    let asserter = ScriptedAsserter::new().with_verdict("The sign in form is visible", false);
    let (mut runner, _) = runner_with(config(), login_driver(), asserter.clone());

    let result = runner.run_spec(&spec, None).await.unwrap();
    assert!(!result.success);
    assert_eq!(asserter.clear_count(), 0);

    let calls = asserter.assert_calls();
    assert_eq!(calls[0].before.as_ref().unwrap().title, "Login");

    let check = result.example_results[0].steps[0].check_result().unwrap();
    assert_eq!(check.actual, "Condition not met");
    assert_eq!(
        check.reasoning.as_deref(),
        Some("LLM could not confirm: \"The sign in form is visible\"")
    );
}

#[tokio::test]
async fn test_stops_at_first_failure() {
    let spec = parse_spec(
        "# Signup\n\n## Examples\n\n### Register\n\n#### Steps\n\
         * Act: Fill the email field with ada@example.com\n\
         * Act: Click the Register button\n\
         * Act: Click the Sign in button\n\
         * Check: URL contains /dashboard\n\
         * Check: Page title is Dashboard\n",
    );
    let driver = login_driver();
    let (mut runner, _) = runner_with(config(), driver.clone(), ScriptedAsserter::new());

    let result = runner.run_spec(&spec, None).await.unwrap();
    assert!(!result.success);

    let example = &result.example_results[0];
    assert_eq!(example.steps.len(), 2);
    assert!(example.steps[0].success);
    assert!(!example.steps[1].success);
    assert_eq!(driver.calls_to("act "), 2);

    let failed = example.failed_at.as_ref().unwrap();
    assert_eq!(failed.step_index, 1);
    assert_eq!(failed.step.instruction(), "Click the Register button");
    assert_eq!(failed.context.page_url, LOGIN_URL);
    assert_eq!(
        failed.context.suggestions[0],
        "Element not found for: \"Click the Register button\""
    );
    assert_eq!(
        failed.context.suggestions[1],
        "Available clickable elements: Sign in, a.forgot"
    );
    assert_eq!(failed.context.available_elements.len(), 3);

    match &example.steps[1].outcome {
        StepOutcome::Act(act) => {
            assert!(act.error.as_deref().unwrap().contains("No element found"));
            assert!(act.page_snapshot.as_deref().unwrap().contains("Login"));
        }
        other => panic!("expected an act outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_check_context() {
    let spec = parse_spec(
        "# Login\n\n## Examples\n\n### Wrong page\n\n#### Steps\n\
         * Check: URL contains /settings\n",
    );
    let (mut runner, _) = runner_with(config(), login_driver(), ScriptedAsserter::new());

    let result = runner.run_spec(&spec, None).await.unwrap();
    let failed = result.example_results[0].failed_at.as_ref().unwrap();
    assert_eq!(failed.step_index, 0);
    assert_eq!(failed.context.error, LOGIN_URL);
    assert_eq!(failed.context.suggestions[0], "Check failed for: \"URL contains /settings\"");
}

#[tokio::test]
async fn test_unreadable_page_keeps_earlier_results() {
    let spec = parse_spec(
        "# Login\n\n## Examples\n\n### On login page\n\n#### Steps\n\
         * Check: URL contains /\n\n\
         ### Missing button\n\n#### Steps\n\
         * Act: Click missing\n",
    );
    let driver = login_driver().with_content_error("agent-browser eval timeout after 30000ms");
    let (mut runner, _) = runner_with(config(), driver, ScriptedAsserter::new());

    let result = runner.run_spec(&spec, None).await.unwrap();
    assert!(!result.success);
    assert_eq!(result.example_results.len(), 2);
    assert!(result.example_results[0].success);

    let failed = result.example_results[1].failed_at.as_ref().unwrap();
    assert_eq!(failed.step_index, 0);
    assert_eq!(failed.context.page_url, LOGIN_URL);
    assert!(failed.context.page_snapshot.is_empty());
    assert_eq!(failed.context.available_elements.len(), 3);

    match &result.example_results[1].steps[0].outcome {
        StepOutcome::Act(act) => assert_eq!(act.page_snapshot.as_deref(), Some("")),
        other => panic!("expected an act outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_example_fails_before_opening_browser() {
    let (mut runner, factory) = runner_with(config(), login_driver(), ScriptedAsserter::new());

    let err = runner
        .run_file(fixture("login-spec.md"), Some("Nope"))
        .await
        .unwrap_err();

    match &err {
        SpecTestError::ExampleNotFound { name, available } => {
            assert_eq!(name, "Nope");
            assert_eq!(available, &vec!["Login with valid credentials".to_string()]);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(
        err.to_string(),
        "Example \"Nope\" not found. Available: Login with valid credentials"
    );
    assert_eq!(factory.open_count(), 0);
    assert_eq!(runner.state(), RunnerState::Uninitialized);
}

#[tokio::test]
async fn test_spec_without_examples() {
    let (mut runner, factory) = runner_with(config(), login_driver(), ScriptedAsserter::new());
    let spec = parse_spec("# Empty\n\nNothing to run here.\n");

    let err = runner.run_spec(&spec, None).await.unwrap_err();
    assert!(matches!(err, SpecTestError::NoExamples));
    assert_eq!(err.to_string(), "No examples found in specification");
    assert_eq!(factory.open_count(), 0);
}

#[tokio::test]
async fn test_runs_only_the_named_example() {
    let spec = parse_spec(
        "# Auth\n\n## Examples\n\n### Sign in\n\n#### Steps\n\
         * Act: Click the Sign in button\n\n### Stay\n\n#### Steps\n\
         * Check: Page title is Login\n",
    );
    let driver = login_driver();
    let (mut runner, _) = runner_with(config(), driver.clone(), ScriptedAsserter::new());

    let result = runner.run_spec(&spec, Some("Stay")).await.unwrap();
    assert!(result.success);
    assert_eq!(result.example_results.len(), 1);
    assert_eq!(result.example_results[0].example.name, "Stay");
    assert_eq!(driver.calls_to("act "), 0);
}

#[tokio::test]
async fn test_every_example_starts_from_base_url() {
    let spec = parse_spec(
        "# Auth\n\n## Examples\n\n### Sign in\n\n#### Steps\n\
         * Act: Click the Sign in button\n\
         * Check: URL contains /dashboard\n\n\
         ### Still on login\n\n#### Steps\n\
         * Check: URL is http://app.test/login\n",
    );
    let driver = login_driver();
    let (mut runner, _) = runner_with(config(), driver.clone(), ScriptedAsserter::new());

    let result = runner.run_spec(&spec, None).await.unwrap();
    assert!(result.success, "{:#?}", result.example_results);

    let gotos: Vec<String> = driver
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("goto "))
        .collect();
    assert_eq!(gotos, vec![format!("goto {}", LOGIN_URL), format!("goto {}", LOGIN_URL)]);
}

#[tokio::test]
async fn test_session_reused_until_closed() {
    let driver = login_driver();
    let (mut runner, factory) = runner_with(config(), driver.clone(), ScriptedAsserter::new());
    let path = fixture("login-spec.md");

    runner.run_file(&path, None).await.unwrap();
    runner.run_file(&path, None).await.unwrap();
    assert_eq!(factory.open_count(), 1);
    assert_eq!(runner.state(), RunnerState::Initialized);

    runner.close().await.unwrap();
    assert_eq!(runner.state(), RunnerState::Closed);
    assert_eq!(driver.close_count(), 1);
    assert!(!runner.snapshots().has_baseline());

    runner.run_file(&path, None).await.unwrap();
    assert_eq!(factory.open_count(), 2);
    assert_eq!(runner.state(), RunnerState::Initialized);
}

#[tokio::test]
async fn test_close_is_safe_without_a_session() {
    let driver = login_driver();
    let (mut runner, factory) = runner_with(config(), driver.clone(), ScriptedAsserter::new());

    runner.close().await.unwrap();
    runner.close().await.unwrap();
    assert_eq!(driver.close_count(), 0);
    assert_eq!(factory.open_count(), 0);
}

#[tokio::test]
async fn test_asserter_errors_propagate() {
    let spec = parse_spec("# Home\n\n* Check: Something only a model can judge\n");
    let (mut runner, _) = runner_with(config(), login_driver(), ScriptedAsserter::new());

    let err = runner.run_spec(&spec, None).await.unwrap_err();
    assert!(err.to_string().contains("No verdict scripted"));
}

#[tokio::test]
async fn test_per_spec_cache_dir_reaches_the_factory() {
    let cache = tempfile::tempdir().unwrap();
    let mut config = config();
    config.runner.cache_dir = Some(cache.path().to_path_buf());
    config.runner.cache_per_spec = true;

    let (mut runner, factory) = runner_with(config, login_driver(), ScriptedAsserter::new());
    let spec = parse_spec("# User Login: Happy Path\n\n* Check: URL contains /login\n");
    runner.run_spec(&spec, None).await.unwrap();

    let expected: PathBuf = cache.path().join("user-login-happy-path");
    assert_eq!(factory.opened()[0].cache_dir, Some(expected.clone()));
    assert_eq!(runner.cache_dir_for(Some(spec.name.as_str())), Some(expected));
}

#[tokio::test]
async fn test_clear_cache_is_idempotent() {
    let cache = tempfile::tempdir().unwrap();
    let dir = cache.path().join("spectest-cache");
    std::fs::create_dir_all(dir.join("login")).unwrap();
    std::fs::write(dir.join("login").join("actions.json"), "{}").unwrap();

    let mut cached_config = config();
    cached_config.runner.cache_dir = Some(dir.clone());
    let (runner, _) = runner_with(cached_config, login_driver(), ScriptedAsserter::new());

    runner.clear_cache().unwrap();
    assert!(!dir.exists());
    runner.clear_cache().unwrap();

    let (uncached, _) = runner_with(config(), login_driver(), ScriptedAsserter::new());
    uncached.clear_cache().unwrap();
}

#[tokio::test]
async fn test_result_serializes_to_json() {
    let spec = parse_spec(
        "# Signup\n\n## Examples\n\n### Register\n\n#### Steps\n\
         * Act: Click the Sign in button\n\
         * Check: Page title is Settings\n",
    );
    let (mut runner, _) = runner_with(config(), login_driver(), ScriptedAsserter::new());
    let result = runner.run_spec(&spec, None).await.unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["success"], false);
    let example = &json["exampleResults"][0];
    assert_eq!(example["failedAt"]["stepIndex"], 1);
    assert_eq!(example["steps"][1]["step"]["type"], "check");
    assert_eq!(example["steps"][1]["step"]["checkType"], "deterministic");
    assert!(example["duration"].is_u64());
    assert_eq!(example["failedAt"]["context"]["availableElements"][2]["type"], "link");
}

//! Live browser tests
//!
//! Run the fixtures through agent-browser and Ollama. Ignored by default:
//! `cargo test --test live_browser -- --ignored`

use std::sync::Arc;
use std::time::Duration;

use spectest::browser::{ActionDriver, ActionPlanner, AgentBrowserDriver};
use spectest::llm::OllamaClient;
use spectest::{Config, SpecRunner};
use tokio::time::timeout;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn login_page_url() -> String {
    format!("file://{}", fixture("login-page.html"))
}

fn live_config() -> Config {
    let mut config = Config::default();
    config.runner.base_url = login_page_url();
    config.runner.cache_dir = None;
    config.browser.session_name = "spectest-live".to_string();
    config
}

/// Skip unless agent-browser is installed
async fn browser_available() -> bool {
    if AgentBrowserDriver::is_available().await {
        return true;
    }
    eprintln!("Skipping test: agent-browser not available");
    false
}

#[tokio::test]
#[ignore] // Requires agent-browser to be installed
async fn test_driver_reads_page_state() {
    if !browser_available().await {
        return;
    }

    let config = live_config();
    let llm = Arc::new(OllamaClient::from_config(&config).unwrap());
    let driver = AgentBrowserDriver::new(
        &config.browser.session_name,
        ActionPlanner::new(llm, config.models.action.clone()),
    );

    driver.goto(&config.runner.base_url).await.unwrap();
    assert_eq!(driver.title().await.unwrap(), "Login");
    assert!(driver.page_text().await.unwrap().contains("Sign in"));
    assert_eq!(driver.element_count("input").await.unwrap(), 2);

    let elements = driver.interactive_elements(20).await.unwrap();
    assert!(elements.iter().any(|e| e.id.as_deref() == Some("sign-in")));

    driver.close().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires agent-browser and Ollama
async fn test_failure_context_for_missing_element() {
    if !browser_available().await {
        return;
    }

    let mut runner = match SpecRunner::new(live_config()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Skipping test: {}", e);
            return;
        }
    };

    let result = timeout(
        Duration::from_secs(120),
        runner.run_file(fixture("login-failure-spec.md"), None),
    )
    .await;
    runner.close().await.ok();

    let result = result.expect("run timed out").unwrap();
    assert!(!result.success);

    let failed = result.example_results[0].failed_at.as_ref().unwrap();
    assert_eq!(failed.step_index, 0);
    assert!(!failed.context.suggestions.is_empty());
    assert!(!failed.context.available_elements.is_empty());
}

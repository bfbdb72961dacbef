//! Act executor
//!
//! Runs one natural-language action. A failed action is not retried; it is
//! reported with the page DOM and the actions the driver could observe.

use std::time::Instant;

use tracing::{debug, warn};

use crate::browser::ActionDriver;
use crate::core::ActResult;

/// Execute one action against the driver
pub async fn execute_act_step(instruction: &str, driver: &dyn ActionDriver) -> ActResult {
    let start = Instant::now();

    match driver.act(instruction).await {
        Ok(()) => {
            let duration = start.elapsed();
            let page_url = driver.url().await.unwrap_or_else(|e| {
                warn!(error = %e, "could not read URL after action");
                String::new()
            });
            debug!(instruction, url = %page_url, "action completed");
            ActResult::success(duration, page_url)
        }
        Err(e) => {
            let duration = start.elapsed();
            warn!(instruction, error = %e, "action failed");

            let page_snapshot = driver.content().await.unwrap_or_else(|err| {
                warn!(error = %err, "could not capture page content");
                String::new()
            });
            let available_actions = driver.observe().await.unwrap_or_else(|err| {
                warn!(error = %err, "could not observe available actions");
                Vec::new()
            });

            ActResult::failure(duration, e.to_string(), page_snapshot, available_actions)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{PageEffect, ScriptedDriver};

    #[tokio::test]
    async fn test_success_records_url() {
        let driver = ScriptedDriver::new().on_act(
            "Click Login",
            vec![PageEffect::Navigate("http://x/dashboard".to_string())],
        );
        let result = execute_act_step("Click Login", &driver).await;
        assert!(result.success);
        assert_eq!(result.page_url.as_deref(), Some("http://x/dashboard"));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_failure_captures_diagnostics_once() {
        let driver = ScriptedDriver::new()
            .with_html("<html><body><button>Sign in</button></body></html>")
            .with_actions(vec!["Click button \"Sign in\" (@e1)".to_string()]);

        let result = execute_act_step("Click Register", &driver).await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("No element found"));
        assert!(result.page_snapshot.as_deref().unwrap().contains("Sign in"));
        assert_eq!(result.available_actions.len(), 1);
        assert_eq!(driver.calls_to("act "), 1);
    }
}

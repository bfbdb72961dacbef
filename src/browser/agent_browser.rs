//! agent-browser driver - wraps the agent-browser CLI
//!
//! Every page read is one CLI call. `act` asks the action planner for tool
//! calls (or replays them from the action cache) and executes them.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::browser::accessibility::AccessibilityTree;
use crate::browser::cache::ActionCache;
use crate::browser::driver::{ActionDriver, RawElement, INTERACTIVE_SELECTOR};
use crate::browser::planner::ActionPlanner;
use crate::core::{Result, SpecTestError};
use crate::llm::ToolCall;

const OUTER_HTML_SCRIPT: &str = "document.documentElement.outerHTML";

const PAGE_TEXT_SCRIPT: &str = "document.body ? document.body.innerText : ''";

/// Driver for browser automation via the agent-browser CLI
pub struct AgentBrowserDriver {
    /// Executable to run
    program: String,
    /// Session name for isolation
    session_name: String,
    /// Whether to run in headed mode
    headed: bool,
    /// Per-command timeout
    timeout: Duration,
    planner: ActionPlanner,
    cache: Option<ActionCache>,
}

impl AgentBrowserDriver {
    /// Create a new driver
    pub fn new(session_name: impl Into<String>, planner: ActionPlanner) -> Self {
        Self {
            program: "agent-browser".to_string(),
            session_name: session_name.into(),
            headed: false,
            timeout: Duration::from_millis(30000),
            planner,
            cache: None,
        }
    }

    /// Run a different agent-browser executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Set headed mode
    pub fn with_headed(mut self, headed: bool) -> Self {
        self.headed = headed;
        self
    }

    /// Set the per-command timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replay and record resolved actions
    pub fn with_cache(mut self, cache: ActionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Check if agent-browser is installed
    pub async fn is_available() -> bool {
        Command::new("agent-browser")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Run an agent-browser command
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["--session", &self.session_name]);

        if self.headed {
            cmd.arg("--headed");
        }

        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        debug!(session = %self.session_name, ?args, "agent-browser");

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                SpecTestError::browser(format!(
                    "agent-browser {} timeout after {}ms",
                    args.first().copied().unwrap_or_default(),
                    self.timeout.as_millis()
                ))
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SpecTestError::AgentBrowserNotFound
                } else {
                    SpecTestError::browser(format!("Failed to run agent-browser: {}", e))
                }
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SpecTestError::browser(format!(
                "agent-browser command failed: {}",
                stderr.trim()
            )))
        }
    }

    /// Run a command and return JSON output
    async fn run_json_command(&self, args: &[&str]) -> Result<String> {
        let mut full_args: Vec<&str> = args.to_vec();
        full_args.push("--json");
        self.run_command(&full_args).await
    }

    /// Evaluate JavaScript and return its result
    async fn eval(&self, script: &str) -> Result<serde_json::Value> {
        let output = self.run_json_command(&["eval", script]).await?;
        Ok(parse_eval_output(&output))
    }

    /// Interactive accessibility tree of the current page
    pub async fn accessibility_tree(&self) -> Result<AccessibilityTree> {
        let output = self.run_json_command(&["snapshot", "-i"]).await?;
        serde_json::from_str(&output)
            .map_err(|e| SpecTestError::browser(format!("Unreadable snapshot output: {}", e)))
    }

    /// Execute one planned tool call
    async fn execute_call(&self, call: &ToolCall) -> Result<()> {
        let arg = |key: &str| {
            call.get_string(key).ok_or_else(|| {
                SpecTestError::action(format!("{} is missing argument '{}'", call.name, key))
            })
        };

        match call.name.as_str() {
            "browser_click" => {
                let target = element_ref(&arg("ref")?);
                self.run_command(&["click", &target]).await?;
            }
            "browser_fill" => {
                let target = element_ref(&arg("ref")?);
                let text = arg("text")?;
                self.run_command(&["fill", &target, &text]).await?;
            }
            "browser_select" => {
                let target = element_ref(&arg("ref")?);
                let value = arg("value")?;
                self.run_command(&["select", &target, &value]).await?;
            }
            "browser_press" => {
                let key = arg("key")?;
                self.run_command(&["press", &key]).await?;
            }
            "browser_open" => {
                let current = self.url().await.unwrap_or_default();
                let target = resolve_url(&current, &arg("url")?)?;
                self.goto(&target).await?;
            }
            "browser_scroll" => {
                let direction = arg("direction")?;
                self.run_command(&["scroll", &direction]).await?;
            }
            other => {
                return Err(SpecTestError::action(format!("Unknown browser tool: {}", other)));
            }
        }
        Ok(())
    }

    async fn execute_plan(&self, calls: &[ToolCall]) -> Result<()> {
        for call in calls {
            self.execute_call(call).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ActionDriver for AgentBrowserDriver {
    async fn act(&self, instruction: &str) -> Result<()> {
        let mut url = self.url().await?;

        if let Some(cache) = &self.cache {
            if let Some(calls) = cache.get(&url, instruction) {
                match self.execute_plan(&calls).await {
                    Ok(()) => {
                        debug!(instruction, "replayed cached action");
                        return Ok(());
                    }
                    Err(e) => {
                        warn!(instruction, error = %e, "cached action is stale, re-planning");
                        cache.evict(&url, instruction).await?;
                        // earlier calls of the stale plan may have moved the page
                        url = self.url().await?;
                    }
                }
            }
        }

        let tree = self.accessibility_tree().await?;
        let calls = self.planner.plan(instruction, &url, &tree).await?;
        self.execute_plan(&calls).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&url, instruction, &calls).await {
                warn!(error = %e, "failed to write action cache");
            }
        }
        Ok(())
    }

    async fn observe(&self) -> Result<Vec<String>> {
        Ok(self.accessibility_tree().await?.describe_actions())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        self.run_command(&["open", url]).await?;
        if let Err(e) = self.run_command(&["wait", "--load", "networkidle"]).await {
            debug!(error = %e, "network idle wait failed");
        }
        Ok(())
    }

    async fn url(&self) -> Result<String> {
        self.run_command(&["get", "url"])
            .await
            .map(|s| s.trim().to_string())
    }

    async fn title(&self) -> Result<String> {
        self.run_command(&["get", "title"])
            .await
            .map(|s| s.trim().to_string())
    }

    async fn content(&self) -> Result<String> {
        Ok(value_to_text(self.eval(OUTER_HTML_SCRIPT).await?))
    }

    async fn page_text(&self) -> Result<String> {
        Ok(value_to_text(self.eval(PAGE_TEXT_SCRIPT).await?))
    }

    async fn interactive_elements(&self, limit: usize) -> Result<Vec<RawElement>> {
        let value = self.eval(&interactive_elements_script(limit)).await?;
        serde_json::from_value(value)
            .map_err(|e| SpecTestError::browser(format!("Unreadable element list: {}", e)))
    }

    async fn element_count(&self, selector: &str) -> Result<usize> {
        let output = self.run_command(&["get", "count", selector]).await?;
        output.trim().parse().map_err(|_| {
            SpecTestError::browser(format!("Unexpected count output: {}", output.trim()))
        })
    }

    async fn input_value(&self, selector: &str) -> Result<String> {
        let output = self.run_command(&["get", "value", selector]).await?;
        Ok(output.trim_end_matches(['\r', '\n']).to_string())
    }

    async fn is_checked(&self, selector: &str) -> Result<bool> {
        let output = self.run_command(&["is", "checked", selector]).await?;
        Ok(output.trim().eq_ignore_ascii_case("true"))
    }

    async fn close(&self) -> Result<()> {
        self.run_command(&["close"]).await?;
        Ok(())
    }
}

/// Refs are passed to the CLI with an `@` prefix
fn element_ref(raw: &str) -> String {
    format!("@{}", raw.trim().trim_start_matches('@'))
}

/// Resolve a navigation target against the current page
pub fn resolve_url(current: &str, target: &str) -> Result<String> {
    if let Ok(absolute) = url::Url::parse(target) {
        return Ok(absolute.to_string());
    }

    let base = url::Url::parse(current).map_err(|_| {
        SpecTestError::action(format!(
            "Cannot resolve '{}' without an absolute current URL",
            target
        ))
    })?;
    base.join(target)
        .map(|u| u.to_string())
        .map_err(|e| SpecTestError::action(format!("Invalid navigation target '{}': {}", target, e)))
}

/// Unwrap the result of `eval --json`
///
/// Accepts `{"data": {"result": ...}}`, `{"data": ...}` or a bare value.
/// String results holding JSON are decoded once more.
pub fn parse_eval_output(raw: &str) -> serde_json::Value {
    let trimmed = raw.trim();
    let value = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(v) => v,
        Err(_) => return serde_json::Value::String(trimmed.to_string()),
    };

    let result = match value.get("data") {
        Some(data) => data.get("result").cloned().unwrap_or_else(|| data.clone()),
        None => value,
    };

    match &result {
        serde_json::Value::String(s) => match serde_json::from_str::<serde_json::Value>(s) {
            Ok(inner) if inner.is_array() || inner.is_object() => inner,
            _ => result,
        },
        _ => result,
    }
}

fn value_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn interactive_elements_script(limit: usize) -> String {
    format!(
        r#"JSON.stringify(Array.from(document.querySelectorAll("{selector}")).slice(0, {limit}).map((el) => ({{
  tag: el.tagName.toLowerCase(),
  id: el.id || null,
  className: typeof el.className === "string" && el.className ? el.className : null,
  text: el.textContent || "",
  attributes: Object.fromEntries(Array.from(el.attributes).map((a) => [a.name, a.value])),
}})))"#,
        selector = INTERACTIVE_SELECTOR,
        limit = limit
    )
}

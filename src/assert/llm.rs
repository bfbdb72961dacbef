//! LLM-backed semantic asserter
//!
//! Sends the condition and the before/after diff to the assertion model and
//! reads back a JSON verdict.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::assert::asserter::SemanticAsserter;
use crate::assert::snapshot::{PageSnapshot, SnapshotPair};
use crate::browser::ActionDriver;
use crate::core::{Result, SpecTestError};
use crate::llm::{GenerateOptions, LLMProvider, Message};

/// Page text beyond this many characters is cut from the prompt
const MAX_PAGE_TEXT: usize = 4000;

const SYSTEM_PROMPT: &str = r#"You verify the behaviour of a web application.
You are given a condition and what changed on the page after the user's last action.
Decide whether the condition holds.

Respond with JSON only:
{"passed": true or false, "reasoning": "one sentence"}"#;

static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("valid regex"));

static THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));

/// Verdict returned by the assertion model
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Verdict {
    pub passed: bool,
    #[serde(default)]
    pub reasoning: String,
}

/// `SemanticAsserter` over an `LLMProvider`
pub struct LlmAsserter {
    llm: Arc<dyn LLMProvider>,
    model: String,
    /// Verdicts for the current action window, keyed by condition and diff
    verdicts: Mutex<HashMap<String, bool>>,
}

impl LlmAsserter {
    pub fn new(llm: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            verdicts: Mutex::new(HashMap::new()),
        }
    }

    /// Build the user message for one condition
    pub fn build_prompt(condition: &str, snapshots: &SnapshotPair) -> Result<String> {
        let before = snapshots
            .before()
            .ok_or_else(|| SpecTestError::MissingBaseline(condition.to_string()))?;
        let after = snapshots
            .after()
            .ok_or_else(|| SpecTestError::session("No snapshot recorded after the action"))?;
        let diff = snapshots.diff().unwrap_or_default();

        Ok(format!(
            "CONDITION: {}\n\nBEFORE: {} (\"{}\")\nAFTER: {} (\"{}\")\n\nCHANGES:\n{}\n\nCURRENT PAGE TEXT:\n{}",
            condition,
            before.url,
            before.title,
            after.url,
            after.title,
            diff.describe(),
            truncate(&after.text, MAX_PAGE_TEXT)
        ))
    }
}

#[async_trait]
impl SemanticAsserter for LlmAsserter {
    async fn snapshot(&self, driver: &dyn ActionDriver) -> Result<PageSnapshot> {
        Ok(PageSnapshot {
            url: driver.url().await?,
            title: driver.title().await?,
            text: driver.page_text().await?,
        })
    }

    async fn assert(&self, condition: &str, snapshots: &SnapshotPair) -> Result<bool> {
        let prompt = Self::build_prompt(condition, snapshots)?;
        let memo = self.verdicts.lock().get(&prompt).copied();
        if let Some(passed) = memo {
            return Ok(passed);
        }

        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(prompt.clone())];
        let response = self
            .llm
            .chat(
                &self.model,
                &messages,
                Some(GenerateOptions {
                    temperature: Some(0.0),
                    ..Default::default()
                }),
            )
            .await?;

        let verdict = parse_verdict(&response.content).ok_or_else(|| {
            SpecTestError::ollama(format!(
                "Unreadable verdict from {}: {}",
                self.model,
                truncate(response.content.trim(), 200)
            ))
        })?;

        debug!(
            condition,
            passed = verdict.passed,
            reasoning = %verdict.reasoning,
            tokens = response.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0),
            "assertion verdict"
        );
        self.verdicts.lock().insert(prompt, verdict.passed);
        Ok(verdict.passed)
    }

    fn clear_snapshots(&mut self) {
        self.verdicts.get_mut().clear();
    }
}

/// Read a verdict from model output
///
/// Tries the whole reply, a fenced code block, then the outermost braces.
/// Falls back to a leading yes/no.
pub fn parse_verdict(content: &str) -> Option<Verdict> {
    let content = THINK_BLOCK.replace_all(content, "");
    let content = content.trim();

    if let Ok(v) = serde_json::from_str::<Verdict>(content) {
        return Some(v);
    }

    if let Some(caps) = CODE_BLOCK.captures(content) {
        if let Ok(v) = serde_json::from_str::<Verdict>(&caps[1]) {
            return Some(v);
        }
    }

    if let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) {
        if start < end {
            if let Ok(v) = serde_json::from_str::<Verdict>(&content[start..=end]) {
                return Some(v);
            }
        }
    }

    let lower = content.to_lowercase();
    let first = lower
        .split(|c: char| !c.is_ascii_alphabetic())
        .find(|w| !w.is_empty())?;
    match first {
        "yes" | "true" | "pass" | "passed" => Some(Verdict {
            passed: true,
            reasoning: content.to_string(),
        }),
        "no" | "false" | "fail" | "failed" => Some(Verdict {
            passed: false,
            reasoning: content.to_string(),
        }),
        _ => None,
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

//! Action planner
//!
//! Turns a natural-language instruction into browser tool calls by showing
//! the action model the current accessibility tree and letting it pick
//! tools.

use std::sync::Arc;

use tracing::debug;

use crate::browser::accessibility::AccessibilityTree;
use crate::core::{Result, SpecTestError};
use crate::llm::{GenerateOptions, LLMProvider, Message, ToolCall, ToolDefinition};

const SYSTEM_PROMPT: &str = r#"You operate a web browser for an automated test.
Carry out the user's instruction on the current page by calling tools.

## Element References
Elements are listed as `@e12: button "Sign in"`. Pass the ref without the
`@`, e.g. {"ref": "e12"}. Never invent refs that are not listed.

## Rules
- Use the fewest tool calls that complete the instruction.
- To go to a path like /login, call browser_open with that path.
- If no listed element fits the instruction, call no tools."#;

/// Browser tools offered to the action model
pub fn browser_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::function(
            "browser_click",
            "Click an element by ref",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "ref": { "type": "string", "description": "Element ref, e.g. e5" }
                },
                "required": ["ref"]
            }),
        ),
        ToolDefinition::function(
            "browser_fill",
            "Replace the text of an input element",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "ref": { "type": "string", "description": "Element ref, e.g. e5" },
                    "text": { "type": "string", "description": "Text to enter" }
                },
                "required": ["ref", "text"]
            }),
        ),
        ToolDefinition::function(
            "browser_select",
            "Choose an option of a select element",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "ref": { "type": "string", "description": "Element ref, e.g. e5" },
                    "value": { "type": "string", "description": "Option value or label" }
                },
                "required": ["ref", "value"]
            }),
        ),
        ToolDefinition::function(
            "browser_press",
            "Press a keyboard key, e.g. Enter or Tab",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "key": { "type": "string", "description": "Key name" }
                },
                "required": ["key"]
            }),
        ),
        ToolDefinition::function(
            "browser_open",
            "Navigate to a URL or a path relative to the current page",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "Absolute URL or path" }
                },
                "required": ["url"]
            }),
        ),
        ToolDefinition::function(
            "browser_scroll",
            "Scroll the page",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "direction": { "type": "string", "enum": ["up", "down", "left", "right"] }
                },
                "required": ["direction"]
            }),
        ),
    ]
}

/// Resolves instructions with an LLM
#[derive(Clone)]
pub struct ActionPlanner {
    llm: Arc<dyn LLMProvider>,
    model: String,
    tools: Vec<ToolDefinition>,
}

impl ActionPlanner {
    pub fn new(llm: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            tools: browser_tools(),
        }
    }

    /// Build the user message for one instruction
    pub fn build_prompt(instruction: &str, url: &str, tree: &AccessibilityTree) -> String {
        format!(
            "INSTRUCTION: {}\n\nCURRENT URL: {}\n\n{}",
            instruction,
            url,
            tree.format_for_prompt()
        )
    }

    /// Tool calls that carry out `instruction`
    pub async fn plan(
        &self,
        instruction: &str,
        url: &str,
        tree: &AccessibilityTree,
    ) -> Result<Vec<ToolCall>> {
        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(Self::build_prompt(instruction, url, tree)),
        ];

        let response = self
            .llm
            .chat_with_tools(
                &self.model,
                &messages,
                &self.tools,
                Some(GenerateOptions {
                    temperature: Some(0.1),
                    ..Default::default()
                }),
            )
            .await?;

        debug!(
            instruction,
            calls = response.tool_calls.len(),
            tokens = response.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0),
            "action model responded"
        );

        let known: Vec<&str> = self.tools.iter().map(|t| t.function.name.as_str()).collect();
        let calls: Vec<ToolCall> = response
            .tool_calls
            .into_iter()
            .filter(|call| known.contains(&call.name.as_str()))
            .collect();

        if calls.is_empty() {
            return Err(SpecTestError::action(format!(
                "No element found for instruction: \"{}\"",
                instruction
            )));
        }

        Ok(calls)
    }
}

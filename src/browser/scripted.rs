//! In-memory action driver
//!
//! Plays back scripted page effects per instruction instead of driving a
//! browser. Used for offline runs and for exercising the runner protocol.
//! Clones share the same page, so a test can keep a handle after the
//! driver has been boxed into a session.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::browser::driver::{ActionDriver, RawElement};
use crate::core::{Result, SpecTestError};

/// What a scripted instruction does to the page
#[derive(Debug, Clone, PartialEq)]
pub enum PageEffect {
    /// Navigate to a URL, loading its registered page if any
    Navigate(String),
    Title(String),
    Text(String),
    Value { selector: String, value: String },
    Checked { selector: String, checked: bool },
    Count { selector: String, count: usize },
    /// Fail the action with this message
    Fail(String),
}

/// Title and text served for a URL
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Default)]
struct PageState {
    url: String,
    title: String,
    text: String,
    html: String,
    pages: HashMap<String, ScriptedPage>,
    scripts: HashMap<String, Vec<PageEffect>>,
    elements: Vec<RawElement>,
    actions: Vec<String>,
    counts: HashMap<String, usize>,
    values: HashMap<String, String>,
    checked: HashMap<String, bool>,
    calls: Vec<String>,
    closed: usize,
    content_error: Option<String>,
}

impl PageState {
    fn load(&mut self, url: &str) {
        self.url = url.to_string();
        if let Some(page) = self.pages.get(url) {
            self.title = page.title.clone();
            self.text = page.text.clone();
        }
    }

    fn apply(&mut self, effect: &PageEffect) -> Result<()> {
        match effect {
            PageEffect::Navigate(url) => self.load(url),
            PageEffect::Title(title) => self.title = title.clone(),
            PageEffect::Text(text) => self.text = text.clone(),
            PageEffect::Value { selector, value } => {
                self.values.insert(selector.clone(), value.clone());
            }
            PageEffect::Checked { selector, checked } => {
                self.checked.insert(selector.clone(), *checked);
            }
            PageEffect::Count { selector, count } => {
                self.counts.insert(selector.clone(), *count);
            }
            PageEffect::Fail(message) => return Err(SpecTestError::action(message.clone())),
        }
        Ok(())
    }
}

/// Scripted `ActionDriver`
#[derive(Debug, Clone, Default)]
pub struct ScriptedDriver {
    state: Arc<Mutex<PageState>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `title` and `text` whenever `url` is loaded
    pub fn with_page(self, url: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        self.state.lock().pages.insert(
            url.into(),
            ScriptedPage {
                title: title.into(),
                text: text.into(),
            },
        );
        self
    }

    /// Effects applied when `instruction` is acted on
    pub fn on_act(self, instruction: impl Into<String>, effects: Vec<PageEffect>) -> Self {
        self.state
            .lock()
            .scripts
            .insert(instruction.into().trim().to_string(), effects);
        self
    }

    pub fn with_elements(self, elements: Vec<RawElement>) -> Self {
        self.state.lock().elements = elements;
        self
    }

    /// Descriptions returned by `observe`
    pub fn with_actions(self, actions: Vec<String>) -> Self {
        self.state.lock().actions = actions;
        self
    }

    pub fn with_html(self, html: impl Into<String>) -> Self {
        self.state.lock().html = html.into();
        self
    }

    /// Make every `content` call fail with a browser error
    pub fn with_content_error(self, message: impl Into<String>) -> Self {
        self.state.lock().content_error = Some(message.into());
        self
    }

    pub fn with_count(self, selector: impl Into<String>, count: usize) -> Self {
        self.state.lock().counts.insert(selector.into(), count);
        self
    }

    pub fn with_value(self, selector: impl Into<String>, value: impl Into<String>) -> Self {
        self.state.lock().values.insert(selector.into(), value.into());
        self
    }

    pub fn with_checked(self, selector: impl Into<String>, checked: bool) -> Self {
        self.state.lock().checked.insert(selector.into(), checked);
        self
    }

    /// Every call made so far, e.g. `goto http://x` or `act Click Login`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Calls starting with `prefix`
    pub fn calls_to(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Number of times `close` was called
    pub fn close_count(&self) -> usize {
        self.state.lock().closed
    }

    fn record(&self, call: String) {
        self.state.lock().calls.push(call);
    }
}

#[async_trait]
impl ActionDriver for ScriptedDriver {
    async fn act(&self, instruction: &str) -> Result<()> {
        self.record(format!("act {}", instruction));
        let mut state = self.state.lock();
        let effects = state.scripts.get(instruction.trim()).cloned().ok_or_else(|| {
            SpecTestError::action(format!(
                "No element found for instruction: \"{}\"",
                instruction
            ))
        })?;
        for effect in &effects {
            state.apply(effect)?;
        }
        Ok(())
    }

    async fn observe(&self) -> Result<Vec<String>> {
        self.record("observe".to_string());
        Ok(self.state.lock().actions.clone())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        self.record(format!("goto {}", url));
        self.state.lock().load(url);
        Ok(())
    }

    async fn url(&self) -> Result<String> {
        Ok(self.state.lock().url.clone())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.state.lock().title.clone())
    }

    async fn content(&self) -> Result<String> {
        let state = self.state.lock();
        if let Some(message) = &state.content_error {
            return Err(SpecTestError::browser(message.clone()));
        }
        if state.html.is_empty() {
            Ok(format!(
                "<html><head><title>{}</title></head><body>{}</body></html>",
                state.title, state.text
            ))
        } else {
            Ok(state.html.clone())
        }
    }

    async fn page_text(&self) -> Result<String> {
        Ok(self.state.lock().text.clone())
    }

    async fn interactive_elements(&self, limit: usize) -> Result<Vec<RawElement>> {
        Ok(self.state.lock().elements.iter().take(limit).cloned().collect())
    }

    async fn element_count(&self, selector: &str) -> Result<usize> {
        Ok(self.state.lock().counts.get(selector).copied().unwrap_or(0))
    }

    async fn input_value(&self, selector: &str) -> Result<String> {
        self.state
            .lock()
            .values
            .get(selector)
            .cloned()
            .ok_or_else(|| SpecTestError::browser(format!("No input matches {}", selector)))
    }

    async fn is_checked(&self, selector: &str) -> Result<bool> {
        Ok(self.state.lock().checked.get(selector).copied().unwrap_or(false))
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push("close".to_string());
        state.closed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_act_applies_effects() {
        let driver = ScriptedDriver::new()
            .with_page("http://x/dashboard", "Dashboard", "Welcome back")
            .on_act(
                "Click Login",
                vec![PageEffect::Navigate("http://x/dashboard".to_string())],
            );

        driver.goto("http://x/").await.unwrap();
        driver.act(" Click Login ").await.unwrap();

        assert_eq!(driver.url().await.unwrap(), "http://x/dashboard");
        assert_eq!(driver.title().await.unwrap(), "Dashboard");
        assert_eq!(driver.calls(), vec!["goto http://x/", "act  Click Login "]);
    }

    #[tokio::test]
    async fn test_unscripted_and_failing_actions() {
        let driver = ScriptedDriver::new().on_act(
            "Submit",
            vec![
                PageEffect::Text("half".to_string()),
                PageEffect::Fail("Timeout waiting for #submit".to_string()),
            ],
        );

        let err = driver.act("Click Nothing").await.unwrap_err();
        assert!(err.to_string().contains("No element found"));

        let err = driver.act("Submit").await.unwrap_err();
        assert!(err.to_string().contains("Timeout"));
        assert_eq!(driver.page_text().await.unwrap(), "half");
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let driver = ScriptedDriver::new();
        let handle = driver.clone();
        let boxed: Box<dyn ActionDriver> = Box::new(driver);
        boxed.close().await.unwrap();
        assert_eq!(handle.close_count(), 1);
    }
}

//! Action capability
//!
//! Everything the runner needs from a live browser: perform a
//! natural-language action, list what could be done instead, and read page
//! state on demand.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::Result;

/// Selector matching the elements reported in failure diagnostics
pub const INTERACTIVE_SELECTOR: &str = "button, a, input, select, textarea";

/// An interactive element as read from the DOM, before any shaping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawElement {
    /// Lower-case tag name
    pub tag: String,
    pub id: Option<String>,
    /// Full `class` attribute
    pub class_name: Option<String>,
    /// Untrimmed text content
    pub text: String,
    /// Attributes present on the element
    pub attributes: BTreeMap<String, String>,
}

impl RawElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Natural-language browser automation
///
/// Implementations own one browser page. Calls are awaited one at a time.
#[async_trait]
pub trait ActionDriver: Send + Sync {
    /// Perform a natural-language instruction on the current page
    async fn act(&self, instruction: &str) -> Result<()>;

    /// Describe the actions currently available on the page
    async fn observe(&self) -> Result<Vec<String>>;

    /// Navigate to an absolute URL
    async fn goto(&self, url: &str) -> Result<()>;

    /// Current page URL
    async fn url(&self) -> Result<String>;

    /// Current page title
    async fn title(&self) -> Result<String>;

    /// Full `outerHTML` of the document
    async fn content(&self) -> Result<String>;

    /// Visible text of the page body
    async fn page_text(&self) -> Result<String>;

    /// Interactive elements in document order, at most `limit`
    async fn interactive_elements(&self, limit: usize) -> Result<Vec<RawElement>>;

    /// Number of elements matching a CSS selector
    async fn element_count(&self, selector: &str) -> Result<usize>;

    /// Value of the first input matching a CSS selector
    async fn input_value(&self, selector: &str) -> Result<String>;

    /// Checked state of the first element matching a CSS selector
    async fn is_checked(&self, selector: &str) -> Result<bool>;

    /// Release the browser
    async fn close(&self) -> Result<()>;
}

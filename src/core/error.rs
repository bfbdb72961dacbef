//! Custom error types for spectest
//!
//! Only setup and infrastructure failures become errors. Failed actions and
//! failed checks are ordinary result data.

use thiserror::Error;

/// Main error type for spectest operations
#[derive(Error, Debug)]
pub enum SpecTestError {
    /// Ollama connection or API errors
    #[error("Ollama error: {0}")]
    Ollama(String),

    /// Browser automation errors
    #[error("Browser error: {0}")]
    Browser(String),

    /// A natural-language action could not be carried out
    #[error("Action failed: {0}")]
    Action(String),

    /// Browser or assertion session could not be used
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested example does not exist in the specification
    #[error("Example \"{name}\" not found. Available: {}", available.join(", "))]
    ExampleNotFound {
        name: String,
        available: Vec<String>,
    },

    /// Specification parsed to zero examples
    #[error("No examples found in specification")]
    NoExamples,

    /// A semantic check ran without a "before" snapshot
    #[error("No baseline snapshot recorded before semantic check: {0}")]
    MissingBaseline(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Agent-browser not installed
    #[error("agent-browser not found. Install with: npm install -g agent-browser && agent-browser install")]
    AgentBrowserNotFound,

    /// Model not available
    #[error("Model '{0}' not available in Ollama. Run: ollama pull {0}")]
    ModelNotFound(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Convenience Result type for spectest operations
pub type Result<T> = std::result::Result<T, SpecTestError>;

impl SpecTestError {
    /// Create an Ollama error
    pub fn ollama(msg: impl Into<String>) -> Self {
        Self::Ollama(msg.into())
    }

    /// Create a browser error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Create an action error
    pub fn action(msg: impl Into<String>) -> Self {
        Self::Action(msg.into())
    }

    /// Create a session error
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_not_found_lists_available() {
        let err = SpecTestError::ExampleNotFound {
            name: "Nope".to_string(),
            available: vec!["Login".to_string(), "Logout".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Example \"Nope\" not found. Available: Login, Logout"
        );
    }

    #[test]
    fn test_with_context() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = SpecTestError::with_context("Failed to read spec", io);
        assert_eq!(err.to_string(), "Failed to read spec: missing");
    }
}

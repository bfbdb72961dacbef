//! Configuration management for spectest
//!
//! Supports environment variables, config files, and CLI overrides.
//! Priority: CLI args > config file > env vars > defaults.
//!
//! Config file location: ~/.config/spectest/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Result, SpecTestError};

/// Main configuration for spectest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target application and cache settings
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Model configuration
    #[serde(default)]
    pub models: ModelConfig,
    /// Browser configuration
    #[serde(default)]
    pub browser: BrowserConfig,
}

/// How specifications are run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Base URL every example starts from
    pub base_url: String,
    /// Show the browser window
    pub headed: bool,
    /// Action cache location, caching is off when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Give every specification its own cache subdirectory
    #[serde(default)]
    pub cache_per_spec: bool,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Models behind the action and assertion capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model that turns instructions into browser tool calls
    pub action: String,
    /// Model that judges semantic checks
    pub assertion: String,
}

/// Browser automation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Session name for agent-browser
    pub session_name: String,
    /// Default timeout for browser operations in ms
    pub timeout_ms: u64,
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|v| v == "true" || v == "1")
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("SPECTEST_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            headed: env_flag("SPECTEST_HEADED").unwrap_or(false),
            cache_dir: env::var("SPECTEST_CACHE_DIR").ok().map(PathBuf::from),
            cache_per_spec: env_flag("SPECTEST_CACHE_PER_SPEC").unwrap_or(false),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            action: env::var("SPECTEST_ACTION_MODEL").unwrap_or_else(|_| "qwen3:8b".to_string()),
            assertion: env::var("SPECTEST_ASSERT_MODEL")
                .unwrap_or_else(|_| "qwen3-vl:8b".to_string()),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            session_name: env::var("SPECTEST_BROWSER_SESSION")
                .unwrap_or_else(|_| "spectest".to_string()),
            timeout_ms: 30000,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spectest")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from `.env`, the default config file, and defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_file(Self::config_file()) {
            return config;
        }

        Self::default()
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SpecTestError::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SpecTestError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text, missing sections use defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SpecTestError::config(format!("Failed to parse config: {}", e)))
    }

    /// Check values that would otherwise fail deep inside a run
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.runner.base_url).map_err(|e| {
            SpecTestError::config(format!("Invalid base URL '{}': {}", self.runner.base_url, e))
        })?;

        if !matches!(base.scheme(), "http" | "https" | "file") {
            return Err(SpecTestError::config(format!(
                "Unsupported base URL scheme '{}'",
                base.scheme()
            )));
        }

        if self.browser.session_name.trim().is_empty() {
            return Err(SpecTestError::config("Browser session name is empty"));
        }

        Ok(())
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

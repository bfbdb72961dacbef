//! Browser sessions
//!
//! A session pairs the action driver with the semantic asserter. The runner
//! opens one through a `SessionFactory` on first use and keeps it until
//! closed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::assert::{LlmAsserter, ScriptedAsserter, SemanticAsserter};
use crate::browser::{ActionCache, ActionDriver, ActionPlanner, AgentBrowserDriver, ScriptedDriver};
use crate::core::{Config, Result, SpecTestError};
use crate::llm::{LLMProvider, OllamaClient};

/// An open driver and asserter
pub struct Session {
    pub driver: Box<dyn ActionDriver>,
    pub asserter: Box<dyn SemanticAsserter>,
}

impl Session {
    pub fn new(driver: Box<dyn ActionDriver>, asserter: Box<dyn SemanticAsserter>) -> Self {
        Self { driver, asserter }
    }
}

/// How to open a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Browser session name
    pub session_name: String,
    pub headed: bool,
    /// Per-command timeout in milliseconds
    pub timeout_ms: u64,
    /// Action cache location, none disables caching
    pub cache_dir: Option<PathBuf>,
}

impl SessionOptions {
    pub fn from_config(config: &Config, cache_dir: Option<PathBuf>) -> Self {
        Self {
            session_name: config.browser.session_name.clone(),
            headed: config.runner.headed,
            timeout_ms: config.browser.timeout_ms,
            cache_dir,
        }
    }
}

/// Opens sessions for the runner
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, options: SessionOptions) -> Result<Session>;
}

/// Sessions over agent-browser and Ollama
pub struct AgentBrowserFactory {
    config: Config,
    llm: Arc<dyn LLMProvider>,
}

impl AgentBrowserFactory {
    pub fn new(config: Config) -> Result<Self> {
        let llm = Arc::new(OllamaClient::from_config(&config)?);
        Ok(Self::with_provider(config, llm))
    }

    /// Use a different provider for both models
    pub fn with_provider(config: Config, llm: Arc<dyn LLMProvider>) -> Self {
        Self { config, llm }
    }

    async fn check_models(&self) -> Result<()> {
        let models = self.llm.list_models().await.map_err(|e| {
            SpecTestError::ollama(format!(
                "Ollama not reachable at {}: {}",
                self.config.ollama_url(),
                e
            ))
        })?;
        debug!(provider = self.llm.name(), ?models, "available models");

        for model in [&self.config.models.action, &self.config.models.assertion] {
            if !self.llm.is_model_available(model).await? {
                return Err(SpecTestError::ModelNotFound(model.clone()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SessionFactory for AgentBrowserFactory {
    async fn open(&self, options: SessionOptions) -> Result<Session> {
        if !AgentBrowserDriver::is_available().await {
            return Err(SpecTestError::AgentBrowserNotFound);
        }
        self.check_models().await?;

        let planner = ActionPlanner::new(self.llm.clone(), self.config.models.action.clone());
        let mut driver = AgentBrowserDriver::new(&options.session_name, planner)
            .with_headed(options.headed)
            .with_timeout(Duration::from_millis(options.timeout_ms));

        if let Some(dir) = &options.cache_dir {
            let cache = ActionCache::open(dir).await?;
            info!(path = %cache.path().display(), entries = cache.len(), "using action cache");
            driver = driver.with_cache(cache);
        }

        let asserter = LlmAsserter::new(self.llm.clone(), self.config.models.assertion.clone());

        info!(session = %options.session_name, headed = options.headed, "browser session opened");
        Ok(Session::new(Box::new(driver), Box::new(asserter)))
    }
}

/// Sessions over the scripted driver and asserter
///
/// Every session shares the same page and verdicts.
#[derive(Clone, Default)]
pub struct ScriptedSessionFactory {
    driver: ScriptedDriver,
    asserter: ScriptedAsserter,
    opened: Arc<Mutex<Vec<SessionOptions>>>,
}

impl ScriptedSessionFactory {
    pub fn new(driver: ScriptedDriver, asserter: ScriptedAsserter) -> Self {
        Self {
            driver,
            asserter,
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of sessions opened so far
    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    /// Options of every open call, in order
    pub fn opened(&self) -> Vec<SessionOptions> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl SessionFactory for ScriptedSessionFactory {
    async fn open(&self, options: SessionOptions) -> Result<Session> {
        self.opened.lock().push(options);
        Ok(Session::new(
            Box::new(self.driver.clone()),
            Box::new(self.asserter.clone()),
        ))
    }
}

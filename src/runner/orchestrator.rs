//! Run orchestrator
//!
//! `SpecRunner` owns the browser session and the snapshot pair. Every
//! example starts from the base URL with a fresh baseline, and every action
//! re-baselines the pair, so a semantic check always compares the page
//! right before the latest action with the page at the check.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::assert::SnapshotPair;
use crate::core::{
    Config, ExampleResult, FailedAt, Result, SpecTestError, SpecTestResult, StepResult,
};
use crate::runner::act::execute_act_step;
use crate::runner::check::execute_check_step;
use crate::runner::failure::generate_failure_context;
use crate::runner::session::{AgentBrowserFactory, Session, SessionFactory, SessionOptions};
use crate::spec::{parse_spec_file, Example, Specification, Step};

static UNSAFE_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static name pattern"));

/// Lifecycle of a runner's session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Uninitialized,
    Initialized,
    Closed,
}

enum SessionState {
    Uninitialized,
    Open(Session),
    Closed,
}

/// Runs specifications against one target application
pub struct SpecRunner {
    config: Config,
    factory: Arc<dyn SessionFactory>,
    session: SessionState,
    snapshots: SnapshotPair,
    /// Name of the specification being run, used for per-spec caches
    current_spec: Option<String>,
}

impl SpecRunner {
    /// Runner over agent-browser and Ollama
    pub fn new(config: Config) -> Result<Self> {
        let factory = Arc::new(AgentBrowserFactory::new(config.clone())?);
        Ok(Self::with_factory(config, factory))
    }

    pub fn with_factory(config: Config, factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            config,
            factory,
            session: SessionState::Uninitialized,
            snapshots: SnapshotPair::new(),
            current_spec: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> RunnerState {
        match self.session {
            SessionState::Uninitialized => RunnerState::Uninitialized,
            SessionState::Open(_) => RunnerState::Initialized,
            SessionState::Closed => RunnerState::Closed,
        }
    }

    /// Snapshot pair of the current action window
    pub fn snapshots(&self) -> &SnapshotPair {
        &self.snapshots
    }

    /// Open the session if it is not open yet
    pub async fn initialize(&mut self) -> Result<()> {
        if matches!(self.session, SessionState::Open(_)) {
            return Ok(());
        }

        let cache_dir = self.cache_dir_for(self.current_spec.as_deref());
        let options = SessionOptions::from_config(&self.config, cache_dir);
        debug!(?options, "opening session");

        let session = self.factory.open(options).await?;
        self.session = SessionState::Open(session);
        Ok(())
    }

    /// Parse a specification file and run it
    pub async fn run_file(
        &mut self,
        path: impl AsRef<std::path::Path>,
        example: Option<&str>,
    ) -> Result<SpecTestResult> {
        let spec = parse_spec_file(path).await?;
        self.run_spec(&spec, example).await
    }

    /// Run all examples of a specification, or only the one named `example`
    pub async fn run_spec(
        &mut self,
        spec: &Specification,
        example: Option<&str>,
    ) -> Result<SpecTestResult> {
        let start = Instant::now();
        self.current_spec = Some(spec.name.clone());

        let selected: Vec<&Example> = match example {
            Some(name) => spec
                .example(name)
                .map(|e| vec![e])
                .ok_or_else(|| SpecTestError::ExampleNotFound {
                    name: name.to_string(),
                    available: spec.example_names(),
                })?,
            None => spec.examples.iter().collect(),
        };
        if selected.is_empty() {
            return Err(SpecTestError::NoExamples);
        }

        info!(spec = %spec.name, examples = selected.len(), "running specification");

        let mut example_results = Vec::with_capacity(selected.len());
        for example in selected {
            example_results.push(self.run_example(example).await?);
        }

        let success = example_results.iter().all(|r| r.success);
        let result = SpecTestResult {
            success,
            spec: spec.clone(),
            example_results,
            duration: start.elapsed(),
        };
        info!(
            spec = %spec.name,
            passed = result.passed_count(),
            failed = result.failed_count(),
            "specification finished"
        );
        Ok(result)
    }

    /// Run one example from the base URL
    pub async fn run_example(&mut self, example: &Example) -> Result<ExampleResult> {
        let start = Instant::now();
        self.initialize().await?;

        let SessionState::Open(session) = &mut self.session else {
            return Err(SpecTestError::session("Session is not open"));
        };
        let snapshots = &mut self.snapshots;

        info!(example = %example.name, steps = example.steps.len(), "running example");

        session.driver.goto(&self.config.runner.base_url).await?;
        snapshots.reset();
        let initial = session.asserter.snapshot(session.driver.as_ref()).await?;
        snapshots.record_before(initial);

        let mut steps = Vec::with_capacity(example.steps.len());
        let mut failed_at = None;

        for (index, step) in example.steps.iter().enumerate() {
            let result = run_step(step, session, snapshots).await?;
            let success = result.success;
            let message = result.failure_message();
            steps.push(result);

            if !success {
                warn!(
                    example = %example.name,
                    step = index + 1,
                    line = step.line(),
                    error = %message,
                    "step failed"
                );
                let context =
                    generate_failure_context(session.driver.as_ref(), step, &message).await?;
                failed_at = Some(FailedAt {
                    step_index: index,
                    step: step.clone(),
                    context,
                });
                break;
            }
        }

        let result = ExampleResult {
            example: example.clone(),
            success: failed_at.is_none(),
            steps,
            duration: start.elapsed(),
            failed_at,
        };
        info!(
            example = %example.name,
            success = result.success,
            duration_ms = result.duration.as_millis() as u64,
            "example finished"
        );
        Ok(result)
    }

    /// Action cache directory for a specification, none when caching is off
    pub fn cache_dir_for(&self, spec_name: Option<&str>) -> Option<PathBuf> {
        let dir = self.config.runner.cache_dir.as_ref()?;
        match spec_name {
            Some(name) if self.config.runner.cache_per_spec => {
                Some(dir.join(sanitize_spec_name(name)))
            }
            _ => Some(dir.clone()),
        }
    }

    /// Remove the cache directory and everything in it
    pub fn clear_cache(&self) -> Result<()> {
        let Some(dir) = &self.config.runner.cache_dir else {
            return Ok(());
        };
        match std::fs::remove_dir_all(dir) {
            Ok(()) => {
                info!(path = %dir.display(), "cache cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SpecTestError::with_context(
                format!("Failed to clear cache {}", dir.display()),
                e,
            )),
        }
    }

    /// Release the session and drop snapshot state
    pub async fn close(&mut self) -> Result<()> {
        self.snapshots.reset();
        let previous = std::mem::replace(&mut self.session, SessionState::Closed);
        if let SessionState::Open(session) = previous {
            session.driver.close().await?;
            info!("session closed");
        }
        Ok(())
    }
}

/// Execute one step within an open session
async fn run_step(
    step: &Step,
    session: &mut Session,
    snapshots: &mut SnapshotPair,
) -> Result<StepResult> {
    let start = Instant::now();
    debug!(kind = step.kind(), line = step.line(), instruction = step.instruction(), "step");

    match step {
        Step::Act { instruction, .. } => {
            session.asserter.clear_snapshots();
            snapshots.reset();
            let before = session.asserter.snapshot(session.driver.as_ref()).await?;
            snapshots.record_before(before);

            let result = execute_act_step(instruction, session.driver.as_ref()).await;
            Ok(StepResult::act(step.clone(), start.elapsed(), result))
        }
        Step::Check {
            instruction,
            check_type,
            ..
        } => {
            let result = execute_check_step(
                instruction,
                *check_type,
                session.driver.as_ref(),
                session.asserter.as_ref(),
                snapshots,
            )
            .await?;
            Ok(StepResult::check(step.clone(), start.elapsed(), result))
        }
    }
}

/// File-system safe form of a specification name
pub fn sanitize_spec_name(name: &str) -> String {
    UNSAFE_NAME_CHARS
        .replace_all(&name.to_lowercase(), "-")
        .into_owned()
}

//! In-memory semantic asserter
//!
//! Returns preset verdicts per condition and records every call. Clones
//! share state so a test keeps a handle after boxing one into a session.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::assert::asserter::SemanticAsserter;
use crate::assert::snapshot::{PageSnapshot, SnapshotPair};
use crate::browser::ActionDriver;
use crate::core::{Result, SpecTestError};

/// One recorded `assert` call
#[derive(Debug, Clone)]
pub struct AssertCall {
    pub condition: String,
    pub before: Option<PageSnapshot>,
    pub after: Option<PageSnapshot>,
}

#[derive(Debug, Default)]
struct AsserterState {
    verdicts: HashMap<String, bool>,
    default_verdict: Option<bool>,
    snapshots: usize,
    clears: usize,
    asserts: Vec<AssertCall>,
}

/// Scripted `SemanticAsserter`
#[derive(Debug, Clone, Default)]
pub struct ScriptedAsserter {
    state: Arc<Mutex<AsserterState>>,
}

impl ScriptedAsserter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verdict(self, condition: impl Into<String>, passed: bool) -> Self {
        self.state
            .lock()
            .verdicts
            .insert(condition.into().trim().to_string(), passed);
        self
    }

    /// Verdict for conditions without a preset one
    pub fn with_default(self, passed: bool) -> Self {
        self.state.lock().default_verdict = Some(passed);
        self
    }

    pub fn snapshot_count(&self) -> usize {
        self.state.lock().snapshots
    }

    pub fn clear_count(&self) -> usize {
        self.state.lock().clears
    }

    pub fn assert_calls(&self) -> Vec<AssertCall> {
        self.state.lock().asserts.clone()
    }
}

#[async_trait]
impl SemanticAsserter for ScriptedAsserter {
    async fn snapshot(&self, driver: &dyn ActionDriver) -> Result<PageSnapshot> {
        let snapshot = PageSnapshot {
            url: driver.url().await?,
            title: driver.title().await?,
            text: driver.page_text().await?,
        };
        self.state.lock().snapshots += 1;
        Ok(snapshot)
    }

    async fn assert(&self, condition: &str, snapshots: &SnapshotPair) -> Result<bool> {
        let mut state = self.state.lock();
        state.asserts.push(AssertCall {
            condition: condition.to_string(),
            before: snapshots.before().cloned(),
            after: snapshots.after().cloned(),
        });

        state
            .verdicts
            .get(condition.trim())
            .copied()
            .or(state.default_verdict)
            .ok_or_else(|| SpecTestError::session(format!("No verdict scripted for: {}", condition)))
    }

    fn clear_snapshots(&mut self) {
        self.state.lock().clears += 1;
    }
}

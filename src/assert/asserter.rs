//! Semantic assertion capability

use async_trait::async_trait;

use crate::assert::snapshot::{PageSnapshot, SnapshotPair};
use crate::browser::ActionDriver;
use crate::core::Result;

/// Judges natural-language conditions against a before/after page diff
#[async_trait]
pub trait SemanticAsserter: Send + Sync {
    /// Capture the current page state
    async fn snapshot(&self, driver: &dyn ActionDriver) -> Result<PageSnapshot>;

    /// Whether `condition` holds for the change recorded in `snapshots`
    async fn assert(&self, condition: &str, snapshots: &SnapshotPair) -> Result<bool>;

    /// Drop any state tied to the current action window
    fn clear_snapshots(&mut self);
}

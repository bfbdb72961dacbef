//! Action cache
//!
//! Remembers which browser tool calls carried out an instruction on a given
//! page, so repeated runs skip model inference. Stored as `actions.json`
//! inside the cache directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::core::{Result, SpecTestError};
use crate::llm::ToolCall;

const CACHE_FILE: &str = "actions.json";

/// A cached resolution of one instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAction {
    pub url: String,
    pub instruction: String,
    pub calls: Vec<ToolCall>,
}

/// On-disk cache of resolved actions
pub struct ActionCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, CachedAction>>,
}

impl ActionCache {
    /// Open (or create) the cache inside `dir`
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            SpecTestError::with_context(format!("Failed to create cache dir {}", dir.display()), e)
        })?;

        let path = dir.join(CACHE_FILE);
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), "opened action cache");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Cache key for an instruction on a page
    pub fn key(url: &str, instruction: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hasher.update(b"\n");
        hasher.update(instruction.trim().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, url: &str, instruction: &str) -> Option<Vec<ToolCall>> {
        self.entries
            .lock()
            .get(&Self::key(url, instruction))
            .map(|entry| entry.calls.clone())
    }

    /// Record a resolution and persist the cache
    pub async fn put(&self, url: &str, instruction: &str, calls: &[ToolCall]) -> Result<()> {
        let content = {
            let mut entries = self.entries.lock();
            entries.insert(
                Self::key(url, instruction),
                CachedAction {
                    url: url.to_string(),
                    instruction: instruction.trim().to_string(),
                    calls: calls.to_vec(),
                },
            );
            serde_json::to_string_pretty(&*entries)?
        };
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Drop a resolution that no longer works
    pub async fn evict(&self, url: &str, instruction: &str) -> Result<()> {
        let content = {
            let mut entries = self.entries.lock();
            if entries.remove(&Self::key(url, instruction)).is_none() {
                return Ok(());
            }
            serde_json::to_string_pretty(&*entries)?
        };
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

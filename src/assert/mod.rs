//! Semantic assertions
//!
//! Snapshot state, the `SemanticAsserter` capability and its LLM-backed
//! and scripted implementations.

pub mod asserter;
pub mod llm;
pub mod scripted;
pub mod snapshot;

pub use asserter::SemanticAsserter;
pub use llm::{parse_verdict, LlmAsserter, Verdict};
pub use scripted::{AssertCall, ScriptedAsserter};
pub use snapshot::{Change, PageSnapshot, SnapshotDiff, SnapshotPair};

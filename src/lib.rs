//! spectest - specification-driven browser behaviour tests
//!
//! Runs markdown behaviour specifications against a running web
//! application. Act steps are carried out by natural-language browser
//! automation over agent-browser; Check steps are either compared exactly
//! against page state or judged by a local model over a before/after diff.
//!
//! # Architecture
//!
//! - **Spec**: Markdown model, parser and check classifier
//! - **Browser**: Action driver over agent-browser, action planner and cache
//! - **Assert**: Snapshots and semantic assertions
//! - **Runner**: Act and check executors, failure context, orchestration
//! - **LLM**: LLM provider abstraction with Ollama implementation
//! - **Core**: Result types, configuration, and error handling
//! - **CLI**: Plan and report formatting
//!
//! # Usage
//!
//! ```rust,no_run
//! use spectest::{Config, SpecRunner};
//!
//! #[tokio::main]
//! async fn main() -> spectest::Result<()> {
//!     let mut runner = SpecRunner::new(Config::load())?;
//!     let result = runner.run_file("docs/specs/login.md", None).await?;
//!     runner.close().await?;
//!     println!("{} passed, {} failed", result.passed_count(), result.failed_count());
//!     Ok(())
//! }
//! ```

pub mod assert;
pub mod browser;
pub mod cli;
pub mod core;
pub mod llm;
pub mod runner;
pub mod spec;

// Re-export commonly used items
pub use core::{Config, Result, SpecTestError, SpecTestResult};
pub use runner::SpecRunner;
pub use spec::{parse_spec, parse_spec_file, Specification};

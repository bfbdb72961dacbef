//! Browser capability
//!
//! The `ActionDriver` trait and its implementations: the agent-browser CLI
//! driver with its action planner and cache, and a scripted in-memory driver.

pub mod accessibility;
pub mod agent_browser;
pub mod cache;
pub mod driver;
pub mod planner;
pub mod scripted;

pub use accessibility::AccessibilityTree;
pub use agent_browser::AgentBrowserDriver;
pub use cache::ActionCache;
pub use driver::{ActionDriver, RawElement, INTERACTIVE_SELECTOR};
pub use planner::ActionPlanner;
pub use scripted::{PageEffect, ScriptedDriver};

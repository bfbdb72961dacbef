//! CLI module - command-line output
//!
//! Formats the run plan and the result report printed by the binary.

pub mod report;

pub use report::{format_plan, format_report};

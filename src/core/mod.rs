//! Core module - shared infrastructure for spectest
//!
//! This module contains result types, configuration, and error handling
//! used throughout the crate.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Result, SpecTestError};
pub use types::*;

//! Runner module - executes specifications
//!
//! The orchestrator drives examples step by step through the act and check
//! executors and builds a failure context when a step fails.

pub mod act;
pub mod check;
pub mod failure;
pub mod orchestrator;
pub mod session;

pub use act::execute_act_step;
pub use check::{execute_check_step, DeterministicCheck};
pub use failure::{build_elements, generate_failure_context, generate_suggestions};
pub use orchestrator::{sanitize_spec_name, RunnerState, SpecRunner};
pub use session::{
    AgentBrowserFactory, ScriptedSessionFactory, Session, SessionFactory, SessionOptions,
};

//! Spec module - the markdown behaviour specification
//!
//! Model types, the parser, and the check classifier.

pub mod classifier;
pub mod model;
pub mod parser;

pub use classifier::{classify_check, CheckPattern};
pub use model::{CheckType, Example, Specification, Step};
pub use parser::{parse_examples, parse_spec, parse_spec_file, parse_steps};

//! Parsed behaviour specification
//!
//! A specification is immutable once parsed: a name, an optional
//! implementation directory, and ordered examples made of ordered steps.

use serde::{Deserialize, Serialize};

/// How a check step is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    /// Exact comparison against observable page state
    Deterministic,
    /// Judgement over the before/after snapshot diff
    Semantic,
}

impl std::fmt::Display for CheckType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckType::Deterministic => write!(f, "deterministic"),
            CheckType::Semantic => write!(f, "semantic"),
        }
    }
}

/// A single step of an example
///
/// `line` is the 1-based line of the step in the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Step {
    /// Perform a natural-language user action
    Act { instruction: String, line: usize },
    /// Assert a condition about the current page
    Check {
        instruction: String,
        #[serde(rename = "checkType")]
        check_type: CheckType,
        line: usize,
    },
}

impl Step {
    /// Natural-language instruction of the step
    pub fn instruction(&self) -> &str {
        match self {
            Step::Act { instruction, .. } | Step::Check { instruction, .. } => instruction,
        }
    }

    /// Source line of the step
    pub fn line(&self) -> usize {
        match self {
            Step::Act { line, .. } | Step::Check { line, .. } => *line,
        }
    }

    pub fn is_act(&self) -> bool {
        matches!(self, Step::Act { .. })
    }

    pub fn is_check(&self) -> bool {
        matches!(self, Step::Check { .. })
    }

    /// Check classification, `None` for act steps
    pub fn check_type(&self) -> Option<CheckType> {
        match self {
            Step::Check { check_type, .. } => Some(*check_type),
            Step::Act { .. } => None,
        }
    }

    /// Lower-case step kind ("act" or "check")
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Act { .. } => "act",
            Step::Check { .. } => "check",
        }
    }
}

/// One named, independently runnable scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Example {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }
}

/// Parsed behaviour specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    /// Behaviour name from the first top-level heading
    pub name: String,
    /// Directory where the behaviour is implemented
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Named examples in document order
    pub examples: Vec<Example>,
}

impl Specification {
    /// Find an example by name, first match wins
    pub fn example(&self, name: &str) -> Option<&Example> {
        self.examples.iter().find(|e| e.name == name)
    }

    /// Example names in document order
    pub fn example_names(&self) -> Vec<String> {
        self.examples.iter().map(|e| e.name.clone()).collect()
    }

    /// Names that appear on more than one example
    pub fn duplicate_example_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = Vec::new();
        for example in &self.examples {
            if !seen.insert(example.name.as_str()) && !duplicates.contains(&example.name) {
                duplicates.push(example.name.clone());
            }
        }
        duplicates
    }

    /// Total number of steps across all examples
    pub fn step_count(&self) -> usize {
        self.examples.iter().map(|e| e.steps.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn act(instruction: &str) -> Step {
        Step::Act {
            instruction: instruction.to_string(),
            line: 1,
        }
    }

    #[test]
    fn test_example_lookup_first_match_wins() {
        let spec = Specification {
            name: "Login".to_string(),
            directory: None,
            examples: vec![
                Example::new("Happy Path", vec![act("first")]),
                Example::new("Happy Path", vec![act("second")]),
            ],
        };

        let found = spec.example("Happy Path").unwrap();
        assert_eq!(found.steps[0].instruction(), "first");
        assert_eq!(spec.duplicate_example_names(), vec!["Happy Path"]);
        assert!(spec.example("Missing").is_none());
    }

    #[test]
    fn test_step_serializes_with_type_tag() {
        let step = Step::Check {
            instruction: "URL contains /login".to_string(),
            check_type: CheckType::Deterministic,
            line: 4,
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["type"], "check");
        assert_eq!(json["checkType"], "deterministic");
        assert_eq!(json["line"], 4);
    }
}

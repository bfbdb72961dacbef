//! Result types produced by a run
//!
//! The result tree (spec → examples → steps) is the only output of the
//! runner. Everything here is created during execution and never mutated
//! after the runner hands it back.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::spec::{CheckType, Example, Specification, Step};

/// Serialize a `Duration` as whole milliseconds
mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// Outcome of one action
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActResult {
    pub success: bool,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// Page URL after the action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Full DOM at failure time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_snapshot: Option<String>,
    /// Actions the driver could observe at failure time
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available_actions: Vec<String>,
}

impl ActResult {
    /// Create a successful result
    pub fn success(duration: Duration, page_url: impl Into<String>) -> Self {
        Self {
            success: true,
            duration,
            page_url: Some(page_url.into()),
            error: None,
            page_snapshot: None,
            available_actions: Vec::new(),
        }
    }

    /// Create a failed result with diagnostics
    pub fn failure(
        duration: Duration,
        error: impl Into<String>,
        page_snapshot: impl Into<String>,
        available_actions: Vec<String>,
    ) -> Self {
        Self {
            success: false,
            duration,
            page_url: None,
            error: Some(error.into()),
            page_snapshot: Some(page_snapshot.into()),
            available_actions,
        }
    }
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub passed: bool,
    pub check_type: CheckType,
    /// Expected condition as stated in the instruction
    pub expected: String,
    /// Observed value
    pub actual: String,
    /// Verdict explanation, semantic checks only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// How to fix the instruction, unrecognized patterns only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl CheckResult {
    /// Result of a deterministic comparison
    pub fn deterministic(passed: bool, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            passed,
            check_type: CheckType::Deterministic,
            expected: expected.into(),
            actual: actual.into(),
            reasoning: None,
            suggestion: None,
        }
    }

    /// Result of a semantic assertion
    pub fn semantic(passed: bool, instruction: &str) -> Self {
        let (actual, reasoning) = if passed {
            ("Condition met", format!("LLM confirmed: \"{}\"", instruction))
        } else {
            (
                "Condition not met",
                format!("LLM could not confirm: \"{}\"", instruction),
            )
        };
        Self {
            passed,
            check_type: CheckType::Semantic,
            expected: instruction.to_string(),
            actual: actual.to_string(),
            reasoning: Some(reasoning),
            suggestion: None,
        }
    }
}

/// Executor-specific part of a step result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StepOutcome {
    Act(ActResult),
    Check(CheckResult),
}

/// Result of executing a single step
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub step: Step,
    pub success: bool,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    pub outcome: StepOutcome,
}

impl StepResult {
    pub fn act(step: Step, duration: Duration, result: ActResult) -> Self {
        Self {
            step,
            success: result.success,
            duration,
            outcome: StepOutcome::Act(result),
        }
    }

    pub fn check(step: Step, duration: Duration, result: CheckResult) -> Self {
        Self {
            step,
            success: result.passed,
            duration,
            outcome: StepOutcome::Check(result),
        }
    }

    pub fn act_result(&self) -> Option<&ActResult> {
        match &self.outcome {
            StepOutcome::Act(result) => Some(result),
            StepOutcome::Check(_) => None,
        }
    }

    pub fn check_result(&self) -> Option<&CheckResult> {
        match &self.outcome {
            StepOutcome::Check(result) => Some(result),
            StepOutcome::Act(_) => None,
        }
    }

    /// Error text describing why the step failed
    pub fn failure_message(&self) -> String {
        match &self.outcome {
            StepOutcome::Act(result) => result
                .error
                .clone()
                .unwrap_or_else(|| "Act step failed".to_string()),
            StepOutcome::Check(result) if !result.actual.is_empty() => result.actual.clone(),
            StepOutcome::Check(_) => "Check step failed".to_string(),
        }
    }
}

/// An interactive element found on the page at failure time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractiveElement {
    /// Tag name, `link` for anchors
    #[serde(rename = "type")]
    pub kind: String,
    /// Visible text, at most 50 characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Best-effort CSS selector
    pub selector: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// Diagnostics captured when a step fails
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureContext {
    pub page_url: String,
    pub page_snapshot: String,
    pub failed_step: Step,
    pub error: String,
    pub available_elements: Vec<InteractiveElement>,
    pub suggestions: Vec<String>,
}

/// Where an example stopped
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedAt {
    pub step_index: usize,
    pub step: Step,
    pub context: FailureContext,
}

/// Result of running one example
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleResult {
    pub example: Example,
    pub success: bool,
    pub steps: Vec<StepResult>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<FailedAt>,
}

/// Result of running a specification
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecTestResult {
    pub success: bool,
    pub spec: Specification,
    pub example_results: Vec<ExampleResult>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl SpecTestResult {
    pub fn passed_count(&self) -> usize {
        self.example_results.iter().filter(|r| r.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.example_results.iter().filter(|r| !r.success).count()
    }
}

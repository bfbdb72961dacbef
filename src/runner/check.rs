//! Check executor
//!
//! Deterministic checks read one value from the page and compare it.
//! Semantic checks record the "after" snapshot and ask the asserter.

use tracing::{debug, warn};

use crate::assert::{SemanticAsserter, SnapshotPair};
use crate::browser::{ActionDriver, INTERACTIVE_SELECTOR};
use crate::core::{CheckResult, Result, SpecTestError};
use crate::spec::classifier::match_grammar;
use crate::spec::{CheckPattern, CheckType};

/// Selector for `Input value is` without a `for` clause
pub const FOCUSED_INPUT_SELECTOR: &str = "input:focus";

/// Selector for `Checkbox is checked` without a `for` clause
pub const CHECKBOX_SELECTOR: &str = r#"input[type="checkbox"]"#;

const UNRECOGNIZED: &str = "Unrecognized check pattern";

const UNRECOGNIZED_SUGGESTION: &str = "Use patterns like 'URL contains X' or 'Page title is Y'";

/// A parsed deterministic check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeterministicCheck {
    UrlContains(String),
    UrlIs(String),
    TitleIs(String),
    TitleContains(String),
    ElementCount { count: usize, selector: String },
    InputValue { value: String, selector: String },
    CheckboxChecked { selector: String },
}

impl DeterministicCheck {
    /// Parse an instruction with the shared pattern table
    pub fn parse(instruction: &str) -> Option<Self> {
        let (pattern, caps) = match_grammar(instruction)?;
        let expected = caps.name("expected").map(|m| strip_quotes(m.as_str()).to_string());
        let selector = |default: &str| {
            caps.name("selector")
                .map(|m| strip_quotes(m.as_str()).to_string())
                .unwrap_or_else(|| default.to_string())
        };

        let check = match pattern {
            CheckPattern::UrlContains => DeterministicCheck::UrlContains(expected?),
            CheckPattern::UrlIs => DeterministicCheck::UrlIs(expected?),
            CheckPattern::PageTitleIs => DeterministicCheck::TitleIs(expected?),
            CheckPattern::PageTitleContains => DeterministicCheck::TitleContains(expected?),
            CheckPattern::ElementCountIs => DeterministicCheck::ElementCount {
                count: expected?.parse().ok()?,
                selector: selector(INTERACTIVE_SELECTOR),
            },
            CheckPattern::InputValueIs => DeterministicCheck::InputValue {
                value: expected?,
                selector: selector(FOCUSED_INPUT_SELECTOR),
            },
            CheckPattern::CheckboxIsChecked => DeterministicCheck::CheckboxChecked {
                selector: selector(CHECKBOX_SELECTOR),
            },
        };
        Some(check)
    }

    /// Read the actual value and compare
    ///
    /// URL and title reads propagate driver errors. A selector that cannot
    /// be read fails the check instead.
    pub async fn evaluate(&self, driver: &dyn ActionDriver) -> Result<CheckResult> {
        let result = match self {
            DeterministicCheck::UrlContains(expected) => {
                let actual = driver.url().await?;
                CheckResult::deterministic(actual.contains(expected.as_str()), expected, actual)
            }
            DeterministicCheck::UrlIs(expected) => {
                let actual = driver.url().await?;
                CheckResult::deterministic(&actual == expected, expected, actual)
            }
            DeterministicCheck::TitleIs(expected) => {
                let actual = driver.title().await?;
                CheckResult::deterministic(&actual == expected, expected, actual)
            }
            DeterministicCheck::TitleContains(expected) => {
                let actual = driver.title().await?;
                CheckResult::deterministic(actual.contains(expected.as_str()), expected, actual)
            }
            DeterministicCheck::ElementCount { count, selector } => {
                match driver.element_count(selector).await {
                    Ok(actual) => CheckResult::deterministic(
                        actual == *count,
                        count.to_string(),
                        actual.to_string(),
                    ),
                    Err(e) => unreadable(count.to_string(), selector, e),
                }
            }
            DeterministicCheck::InputValue { value, selector } => {
                match driver.input_value(selector).await {
                    Ok(actual) => CheckResult::deterministic(&actual == value, value, actual),
                    Err(e) => unreadable(value.clone(), selector, e),
                }
            }
            DeterministicCheck::CheckboxChecked { selector } => {
                match driver.is_checked(selector).await {
                    Ok(checked) => CheckResult::deterministic(
                        checked,
                        "checked",
                        if checked { "checked" } else { "unchecked" },
                    ),
                    Err(e) => unreadable("checked".to_string(), selector, e),
                }
            }
        };
        Ok(result)
    }
}

fn unreadable(expected: String, selector: &str, error: SpecTestError) -> CheckResult {
    warn!(selector, error = %error, "could not read element for check");
    CheckResult::deterministic(false, expected, format!("Could not read {}: {}", selector, error))
}

/// Remove one layer of matching quotes
pub fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\'', '`'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Execute one check against the current page
///
/// Semantic checks need a baseline in `snapshots`; the "after" side is
/// recorded here.
pub async fn execute_check_step(
    instruction: &str,
    check_type: CheckType,
    driver: &dyn ActionDriver,
    asserter: &dyn SemanticAsserter,
    snapshots: &mut SnapshotPair,
) -> Result<CheckResult> {
    match check_type {
        CheckType::Deterministic => match DeterministicCheck::parse(instruction) {
            Some(check) => {
                debug!(?check, "deterministic check");
                check.evaluate(driver).await
            }
            None => {
                let mut result = CheckResult::deterministic(false, instruction, UNRECOGNIZED);
                result.suggestion = Some(UNRECOGNIZED_SUGGESTION.to_string());
                Ok(result)
            }
        },
        CheckType::Semantic => {
            if !snapshots.has_baseline() {
                return Err(SpecTestError::MissingBaseline(instruction.to_string()));
            }
            let after = asserter.snapshot(driver).await?;
            snapshots.record_after(after);
            let passed = asserter.assert(instruction, snapshots).await?;
            debug!(instruction, passed, "semantic check");
            Ok(CheckResult::semantic(passed, instruction))
        }
    }
}

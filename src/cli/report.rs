//! Plain-text plan and report output

use std::path::Path;

use crate::core::{SpecTestResult, StepOutcome};
use crate::spec::{Specification, Step};

const RULE_WIDTH: usize = 60;

/// Failure-context elements shown in a report
const REPORT_ELEMENTS: usize = 10;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn step_line(index: usize, step: &Step) -> String {
    let (prefix, kind) = match step {
        Step::Act { .. } => ("->", "ACT"),
        Step::Check { .. } => ("ok", "CHECK"),
    };
    let check_type = step
        .check_type()
        .map(|t| format!(" [{}]", t))
        .unwrap_or_default();
    format!(
        "      {}. {} {}: {}{} (line {})",
        index + 1,
        prefix,
        kind,
        step.instruction(),
        check_type,
        step.line()
    )
}

/// What a specification contains, marking the examples that will run
pub fn format_plan(spec: &Specification, example: Option<&str>) -> String {
    let mut lines = vec![format!("Behavior: {}", spec.name)];
    if let Some(directory) = &spec.directory {
        lines.push(format!("Directory: {}", directory));
    }
    lines.push(format!("Examples: {}", spec.examples.len()));
    lines.push(String::new());

    for (index, ex) in spec.examples.iter().enumerate() {
        let will_run = example.map_or(true, |name| name == ex.name);
        let marker = if will_run { ">>>" } else { "   " };
        lines.push(format!("{} Example {}: {}", marker, index + 1, ex.name));
        for (i, step) in ex.steps.iter().enumerate() {
            lines.push(step_line(i, step));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Human-readable result of a run
pub fn format_report(result: &SpecTestResult, cache_dir: Option<&Path>) -> String {
    let mut lines = vec![
        rule(),
        if result.success { "PASSED" } else { "FAILED" }.to_string(),
        rule(),
        format!("Total Duration: {}ms", result.duration.as_millis()),
        format!("Examples Run: {}", result.example_results.len()),
        String::new(),
    ];

    for (index, example) in result.example_results.iter().enumerate() {
        let status = if example.success { "[PASS]" } else { "[FAIL]" };
        lines.push(format!("{} Example {}: {}", status, index + 1, example.example.name));
        lines.push(format!("  Duration: {}ms", example.duration.as_millis()));

        for (i, step_result) in example.steps.iter().enumerate() {
            let mark = if step_result.success { "+" } else { "x" };
            lines.push(format!(
                "  {} Step {} ({}): {}",
                mark,
                i + 1,
                step_result.step.kind().to_uppercase(),
                step_result.step.instruction()
            ));

            match &step_result.outcome {
                StepOutcome::Act(act) if !act.success => {
                    lines.push(format!("    Error: {}", act.error.as_deref().unwrap_or_default()));
                }
                StepOutcome::Check(check) if !check.passed => {
                    lines.push(format!("    Expected: {}", check.expected));
                    lines.push(format!("    Actual: {}", check.actual));
                    if let Some(reasoning) = &check.reasoning {
                        lines.push(format!("    Reasoning: {}", reasoning));
                    }
                    if let Some(suggestion) = &check.suggestion {
                        lines.push(format!("    Hint: {}", suggestion));
                    }
                }
                _ => {}
            }
        }

        if let Some(failed) = &example.failed_at {
            let context = &failed.context;
            lines.push(String::new());
            lines.push("  Failure Context:".to_string());
            lines.push(format!(
                "    Step: {} (line {})",
                failed.step_index + 1,
                failed.step.line()
            ));
            lines.push(format!("    URL: {}", context.page_url));
            lines.push(format!("    Error: {}", context.error));
            lines.push(String::new());
            lines.push("    Suggestions:".to_string());
            for suggestion in &context.suggestions {
                lines.push(format!("      - {}", suggestion));
            }
            lines.push(String::new());
            lines.push("    Available Elements:".to_string());
            for el in context.available_elements.iter().take(REPORT_ELEMENTS) {
                lines.push(format!(
                    "      - {}: {}",
                    el.kind,
                    el.text.as_deref().unwrap_or(&el.selector)
                ));
            }
        }
        lines.push(String::new());
    }

    lines.push(rule());
    lines.push(format!(
        "Summary: {} passed, {} failed",
        result.passed_count(),
        result.failed_count()
    ));
    if let Some(dir) = cache_dir {
        lines.push(format!("Cache: {}", dir.display()));
    }
    lines.push(rule());

    lines.join("\n")
}

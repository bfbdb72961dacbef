//! Markdown specification parser
//!
//! Format:
//! - `# Name` = behaviour name
//! - ``Directory: `path` `` = optional implementation directory
//! - `## Examples` section holding `### Example name` blocks, each with
//!   `* Act: ...` / `* Check: ...` lines (usually under `#### Steps`)
//!
//! Documents without an `## Examples` section are read as a single
//! example named "Default".

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::core::{Result, SpecTestError};
use crate::spec::classifier::classify_check;
use crate::spec::model::{Example, Specification, Step};

/// Behaviour name used when the document has no top-level heading
pub const UNNAMED: &str = "Unnamed";

/// Example name used for documents without an Examples section
pub const DEFAULT_EXAMPLE: &str = "Default";

static STEP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[*+-]\s*(Act|Check):\s*(.+)$").expect("static step pattern"));

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\s+(.+)$").expect("static name pattern"));

static DIRECTORY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Directory:\s*`([^`]+)`").expect("static directory pattern"));

static EXAMPLES_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^## Examples\s*$").expect("static examples heading"));

static SECTION_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^## [^#]").expect("static section heading"));

static EXAMPLE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^###\s+(.+)$").expect("static example heading"));

/// Parse a step line, `None` if the line is not a step
///
/// `line` is the 1-based line number recorded on the step.
pub fn parse_step_line(text: &str, line: usize) -> Option<Step> {
    let caps = STEP_PATTERN.captures(text)?;
    let instruction = caps[2].trim();
    if instruction.is_empty() {
        return None;
    }

    let step = match &caps[1] {
        "Act" => Step::Act {
            instruction: instruction.to_string(),
            line,
        },
        _ => Step::Check {
            instruction: instruction.to_string(),
            check_type: classify_check(instruction),
            line,
        },
    };
    Some(step)
}

/// Parse every step line in a block of markdown
pub fn parse_steps(content: &str) -> Vec<Step> {
    let content = normalize(content);
    content
        .lines()
        .enumerate()
        .filter_map(|(i, text)| parse_step_line(text, i + 1))
        .collect()
}

/// Parse the examples of a document
pub fn parse_examples(content: &str) -> Vec<Example> {
    let content = normalize(content);
    let lines: Vec<&str> = content.lines().collect();

    let Some(heading) = lines.iter().position(|l| EXAMPLES_HEADING.is_match(l)) else {
        let steps = parse_steps(&content);
        if steps.is_empty() {
            return Vec::new();
        }
        return vec![Example::new(DEFAULT_EXAMPLE, steps)];
    };

    let start = heading + 1;
    let end = lines[start..]
        .iter()
        .position(|l| SECTION_HEADING.is_match(l))
        .map(|offset| start + offset)
        .unwrap_or(lines.len());

    let mut examples = Vec::new();
    let mut current: Option<Example> = None;

    for (index, text) in lines.iter().enumerate().take(end).skip(start) {
        if let Some(caps) = EXAMPLE_HEADING.captures(text) {
            if let Some(done) = current.take() {
                push_non_empty(&mut examples, done);
            }
            current = Some(Example::new(caps[1].trim(), Vec::new()));
            continue;
        }

        if let Some(example) = current.as_mut() {
            if let Some(step) = parse_step_line(text, index + 1) {
                example.steps.push(step);
            }
        }
    }

    if let Some(done) = current {
        push_non_empty(&mut examples, done);
    }

    examples
}

/// Parse a complete specification document
pub fn parse_spec(content: &str) -> Specification {
    let content = normalize(content);

    let name = content
        .lines()
        .find_map(|l| NAME_PATTERN.captures(l).map(|c| c[1].trim().to_string()))
        .unwrap_or_else(|| UNNAMED.to_string());

    let directory = content
        .lines()
        .find_map(|l| DIRECTORY_PATTERN.captures(l).map(|c| c[1].trim().to_string()));

    let spec = Specification {
        name,
        directory,
        examples: parse_examples(&content),
    };

    for duplicate in spec.duplicate_example_names() {
        warn!(
            spec = %spec.name,
            example = %duplicate,
            "duplicate example name; only the first is reachable by name"
        );
    }

    debug!(
        spec = %spec.name,
        examples = spec.examples.len(),
        steps = spec.step_count(),
        "parsed specification"
    );

    spec
}

/// Read and parse a specification file
pub async fn parse_spec_file(path: impl AsRef<Path>) -> Result<Specification> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        SpecTestError::with_context(format!("Failed to read spec {}", path.display()), e)
    })?;
    Ok(parse_spec(&content))
}

fn normalize(content: &str) -> String {
    content.replace("\r\n", "\n")
}

fn push_non_empty(examples: &mut Vec<Example>, example: Example) {
    if example.steps.is_empty() {
        debug!(example = %example.name, "skipping example without steps");
    } else {
        examples.push(example);
    }
}

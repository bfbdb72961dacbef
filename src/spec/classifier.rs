//! Check classification
//!
//! One ordered table of deterministic check patterns. The classifier only
//! looks at each pattern's prefix; the check executor uses the grammar of
//! the same entry to extract arguments, so both sides always agree on what
//! counts as deterministic.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::spec::model::CheckType;

/// Structurally verifiable check patterns, in match order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckPattern {
    UrlContains,
    UrlIs,
    PageTitleIs,
    PageTitleContains,
    ElementCountIs,
    InputValueIs,
    CheckboxIsChecked,
}

impl CheckPattern {
    /// All patterns in the order they are tried
    pub const ALL: [CheckPattern; 7] = [
        CheckPattern::UrlContains,
        CheckPattern::UrlIs,
        CheckPattern::PageTitleIs,
        CheckPattern::PageTitleContains,
        CheckPattern::ElementCountIs,
        CheckPattern::InputValueIs,
        CheckPattern::CheckboxIsChecked,
    ];

    /// Prefix that makes an instruction deterministic
    fn prefix(self) -> &'static str {
        match self {
            CheckPattern::UrlContains => r"(?i)^url\s+contains\s+",
            CheckPattern::UrlIs => r"(?i)^url\s+is\s+",
            CheckPattern::PageTitleIs => r"(?i)^page\s+title\s+is\s+",
            CheckPattern::PageTitleContains => r"(?i)^page\s+title\s+contains\s+",
            CheckPattern::ElementCountIs => r"(?i)^element\s+count\s+is\s+",
            CheckPattern::InputValueIs => r"(?i)^input\s+value\s+is\s+",
            CheckPattern::CheckboxIsChecked => r"(?i)^checkbox\s+is\s+checked",
        }
    }

    /// Full grammar with argument captures
    fn grammar(self) -> &'static str {
        match self {
            CheckPattern::UrlContains => r"(?i)^url\s+contains\s+(?P<expected>.+)$",
            CheckPattern::UrlIs => r"(?i)^url\s+is\s+(?P<expected>.+)$",
            CheckPattern::PageTitleIs => r"(?i)^page\s+title\s+is\s+(?P<expected>.+)$",
            CheckPattern::PageTitleContains => {
                r"(?i)^page\s+title\s+contains\s+(?P<expected>.+)$"
            }
            CheckPattern::ElementCountIs => {
                r"(?i)^element\s+count\s+is\s+(?P<expected>\d+)(?:\s+for\s+(?P<selector>.+))?$"
            }
            CheckPattern::InputValueIs => {
                r#"(?i)^input\s+value\s+is\s+(?P<expected>'[^']*'|"[^"]*"|`[^`]*`|.+?)(?:\s+for\s+(?P<selector>.+))?$"#
            }
            CheckPattern::CheckboxIsChecked => {
                r"(?i)^checkbox\s+is\s+checked(?:\s+for\s+(?P<selector>.+))?$"
            }
        }
    }

    /// Human-readable form used in suggestions
    pub fn example(self) -> &'static str {
        match self {
            CheckPattern::UrlContains => "URL contains <text>",
            CheckPattern::UrlIs => "URL is <url>",
            CheckPattern::PageTitleIs => "Page title is <title>",
            CheckPattern::PageTitleContains => "Page title contains <text>",
            CheckPattern::ElementCountIs => "Element count is <n> for <selector>",
            CheckPattern::InputValueIs => "Input value is <value> for <selector>",
            CheckPattern::CheckboxIsChecked => "Checkbox is checked for <selector>",
        }
    }
}

struct CompiledPattern {
    pattern: CheckPattern,
    prefix: Regex,
    grammar: Regex,
}

static PATTERNS: Lazy<Vec<CompiledPattern>> = Lazy::new(|| {
    CheckPattern::ALL
        .iter()
        .map(|&pattern| CompiledPattern {
            pattern,
            prefix: Regex::new(pattern.prefix()).expect("static check prefix"),
            grammar: Regex::new(pattern.grammar()).expect("static check grammar"),
        })
        .collect()
});

/// Decide whether a check is answered by exact comparison or by judgement
pub fn classify_check(instruction: &str) -> CheckType {
    if match_prefix(instruction).is_some() {
        CheckType::Deterministic
    } else {
        CheckType::Semantic
    }
}

/// First pattern whose prefix matches the trimmed instruction
pub fn match_prefix(instruction: &str) -> Option<CheckPattern> {
    let trimmed = instruction.trim();
    PATTERNS
        .iter()
        .find(|p| p.prefix.is_match(trimmed))
        .map(|p| p.pattern)
}

/// First pattern whose full grammar matches, with its captures
pub fn match_grammar(instruction: &str) -> Option<(CheckPattern, Captures<'_>)> {
    let trimmed = instruction.trim();
    PATTERNS
        .iter()
        .find_map(|p| p.grammar.captures(trimmed).map(|caps| (p.pattern, caps)))
}

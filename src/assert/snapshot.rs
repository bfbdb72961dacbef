//! Page snapshots for semantic assertions
//!
//! A `SnapshotPair` holds the state right before the latest action and the
//! state at the check. The runner owns the pair and re-baselines it before
//! every action.

use std::collections::HashMap;

use serde::Serialize;

/// Observable page state at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
    /// Visible body text
    pub text: String,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            text: text.into(),
        }
    }
}

/// Before/after snapshots of the current action window
#[derive(Debug, Clone, Default)]
pub struct SnapshotPair {
    before: Option<PageSnapshot>,
    after: Option<PageSnapshot>,
}

impl SnapshotPair {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard both sides
    pub fn reset(&mut self) {
        self.before = None;
        self.after = None;
    }

    /// Start a new window with `snapshot` as the baseline
    pub fn record_before(&mut self, snapshot: PageSnapshot) {
        self.before = Some(snapshot);
        self.after = None;
    }

    pub fn record_after(&mut self, snapshot: PageSnapshot) {
        self.after = Some(snapshot);
    }

    pub fn before(&self) -> Option<&PageSnapshot> {
        self.before.as_ref()
    }

    pub fn after(&self) -> Option<&PageSnapshot> {
        self.after.as_ref()
    }

    pub fn has_baseline(&self) -> bool {
        self.before.is_some()
    }

    /// Differences between the two sides, `None` until both are recorded
    pub fn diff(&self) -> Option<SnapshotDiff> {
        let (before, after) = (self.before.as_ref()?, self.after.as_ref()?);

        let (added_lines, removed_lines) = line_changes(&before.text, &after.text);

        Some(SnapshotDiff {
            url: change(&before.url, &after.url),
            title: change(&before.title, &after.title),
            added_lines,
            removed_lines,
        })
    }
}

/// A value that changed between snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub from: String,
    pub to: String,
}

/// What changed between the before and after snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDiff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Change>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Change>,
    pub added_lines: Vec<String>,
    pub removed_lines: Vec<String>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.title.is_none()
            && self.added_lines.is_empty()
            && self.removed_lines.is_empty()
    }

    /// Human-readable summary for prompts and logs
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "No visible changes".to_string();
        }

        let mut lines = Vec::new();
        if let Some(c) = &self.url {
            lines.push(format!("URL changed: {} -> {}", c.from, c.to));
        }
        if let Some(c) = &self.title {
            lines.push(format!("Title changed: \"{}\" -> \"{}\"", c.from, c.to));
        }
        for line in &self.added_lines {
            lines.push(format!("+ {}", line));
        }
        for line in &self.removed_lines {
            lines.push(format!("- {}", line));
        }
        lines.join("\n")
    }
}

fn change(from: &str, to: &str) -> Option<Change> {
    (from != to).then(|| Change {
        from: from.to_string(),
        to: to.to_string(),
    })
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Added and removed lines, counting repeats
fn line_changes(before: &str, after: &str) -> (Vec<String>, Vec<String>) {
    let mut unmatched: HashMap<&str, usize> = HashMap::new();
    for line in non_empty_lines(before) {
        *unmatched.entry(line).or_default() += 1;
    }

    let mut added = Vec::new();
    for line in non_empty_lines(after) {
        match unmatched.get_mut(line) {
            Some(count) if *count > 0 => *count -= 1,
            _ => added.push(line.to_string()),
        }
    }

    let mut removed = Vec::new();
    for line in non_empty_lines(before) {
        if let Some(count) = unmatched.get_mut(line) {
            if *count > 0 {
                *count -= 1;
                removed.push(line.to_string());
            }
        }
    }

    (added, removed)
}

//! Accessibility tree parsing for agent-browser output
//!
//! `agent-browser snapshot -i --json` returns the interactive part of the
//! accessibility tree with a ref for every element. The action planner
//! shows these refs to the model; `observe` turns them into descriptions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Parsed `snapshot` output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessibilityTree {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<TreeData>,
}

/// Snapshot data content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeData {
    /// Raw accessibility tree text
    #[serde(default)]
    pub snapshot: String,
    /// Element refs mapped to their info
    #[serde(default)]
    pub refs: HashMap<String, TreeNode>,
}

/// An element in the tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeNode {
    /// ARIA role
    #[serde(default)]
    pub role: String,
    /// Accessible name
    #[serde(default)]
    pub name: String,
    /// Element value (for inputs)
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub focused: bool,
}

impl TreeNode {
    /// Check if this is an interactive element
    pub fn is_interactive(&self) -> bool {
        matches!(
            self.role.as_str(),
            "button"
                | "link"
                | "textbox"
                | "checkbox"
                | "radio"
                | "combobox"
                | "menuitem"
                | "tab"
                | "switch"
                | "searchbox"
        )
    }

    /// Verb used when describing what can be done with the element
    fn verb(&self) -> &'static str {
        match self.role.as_str() {
            "textbox" | "searchbox" | "combobox" | "spinbutton" => "Fill",
            "checkbox" | "radio" | "switch" => "Toggle",
            _ => "Click",
        }
    }
}

impl AccessibilityTree {
    /// Get an element by ref, with or without the `@` prefix
    pub fn get(&self, ref_id: &str) -> Option<&TreeNode> {
        let clean_ref = ref_id.strip_prefix('@').unwrap_or(ref_id);
        self.data.as_ref().and_then(|d| d.refs.get(clean_ref))
    }

    /// Interactive elements ordered by ref
    pub fn interactive(&self) -> Vec<(&String, &TreeNode)> {
        let mut nodes: Vec<_> = self
            .data
            .as_ref()
            .map(|d| d.refs.iter().filter(|(_, n)| n.is_interactive()).collect())
            .unwrap_or_default();
        nodes.sort_by_key(|(r, _)| ref_order(r));
        nodes
    }

    /// One description per available action, e.g. `Click button "Sign in" (@e3)`
    pub fn describe_actions(&self) -> Vec<String> {
        self.interactive()
            .into_iter()
            .map(|(ref_id, node)| {
                format!("{} {} \"{}\" (@{})", node.verb(), node.role, node.name, ref_id)
            })
            .collect()
    }

    /// Format the tree for a model prompt
    pub fn format_for_prompt(&self) -> String {
        let nodes = self.interactive();
        if nodes.is_empty() {
            return "No interactive elements found".to_string();
        }

        let mut output = String::from("Page Elements:\n");
        for (ref_id, node) in nodes {
            let value_str = node
                .value
                .as_ref()
                .map(|v| format!(" = \"{}\"", v))
                .unwrap_or_default();

            output.push_str(&format!(
                "  @{}: {} \"{}\"{}",
                ref_id, node.role, node.name, value_str
            ));

            if node.focused {
                output.push_str(" [focused]");
            }

            output.push('\n');
        }
        output
    }
}

/// Sort refs like e2 before e10
fn ref_order(ref_id: &str) -> (usize, String) {
    let digits: String = ref_id.chars().filter(|c| c.is_ascii_digit()).collect();
    (digits.parse().unwrap_or(usize::MAX), ref_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> AccessibilityTree {
        let raw = r#"{
            "success": true,
            "data": {
                "snapshot": "- button \"Sign in\" [ref=e10]",
                "refs": {
                    "e10": {"role": "button", "name": "Sign in"},
                    "e2": {"role": "textbox", "name": "Email", "value": "a@b.c", "focused": true},
                    "e3": {"role": "heading", "name": "Welcome"}
                }
            }
        }"#;
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_get_with_prefix() {
        let tree = tree();
        assert!(tree.get("e10").is_some());
        assert!(tree.get("@e10").is_some());
        assert!(tree.get("e99").is_none());
    }

    #[test]
    fn test_describe_actions_skips_static_nodes() {
        let actions = tree().describe_actions();
        assert_eq!(
            actions,
            vec![
                "Fill textbox \"Email\" (@e2)".to_string(),
                "Click button \"Sign in\" (@e10)".to_string(),
            ]
        );
    }

    #[test]
    fn test_format_for_prompt() {
        let formatted = tree().format_for_prompt();
        assert!(formatted.contains("@e2: textbox \"Email\" = \"a@b.c\" [focused]"));
        assert!(!formatted.contains("Welcome"));
        assert_eq!(
            AccessibilityTree::default().format_for_prompt(),
            "No interactive elements found"
        );
    }
}

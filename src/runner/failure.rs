//! Failure context builder
//!
//! Bundles what a caller needs to diagnose or retry a failed step: the
//! page, a short list of interactive elements and rule-based suggestions.

use std::collections::BTreeMap;

use tracing::warn;

use crate::browser::{ActionDriver, RawElement};
use crate::core::{FailureContext, InteractiveElement, Result};
use crate::spec::Step;

/// Interactive elements kept in a failure context
pub const MAX_ELEMENTS: usize = 20;

/// Characters of element text kept
pub const MAX_TEXT_CHARS: usize = 50;

/// Clickable elements named in a not-found suggestion
const MAX_CLICKABLE_NAMES: usize = 5;

const KEPT_ATTRIBUTES: [&str; 5] = ["type", "name", "placeholder", "href", "value"];

/// Capture diagnostics for a failed step
pub async fn generate_failure_context(
    driver: &dyn ActionDriver,
    step: &Step,
    error: &str,
) -> Result<FailureContext> {
    let page_url = driver.url().await.unwrap_or_else(|e| {
        warn!(error = %e, "could not read URL for failure context");
        String::new()
    });
    let page_snapshot = driver.content().await.unwrap_or_else(|e| {
        warn!(error = %e, "could not capture page content for failure context");
        String::new()
    });

    let raw = driver
        .interactive_elements(MAX_ELEMENTS)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "could not list interactive elements");
            Vec::new()
        });
    let available_elements = build_elements(&raw);
    let suggestions = generate_suggestions(error, step, &available_elements);

    Ok(FailureContext {
        page_url,
        page_snapshot,
        failed_step: step.clone(),
        error: error.to_string(),
        available_elements,
        suggestions,
    })
}

/// Shape raw DOM elements, keeping the first `MAX_ELEMENTS`
pub fn build_elements(raw: &[RawElement]) -> Vec<InteractiveElement> {
    raw.iter().take(MAX_ELEMENTS).map(build_element).collect()
}

fn build_element(el: &RawElement) -> InteractiveElement {
    let tag = el.tag.to_lowercase();
    let kind = if tag == "a" { "link".to_string() } else { tag.clone() };

    let text: String = el.text.trim().chars().take(MAX_TEXT_CHARS).collect();

    let id = el.id.as_deref().filter(|id| !id.is_empty());
    let first_class = el
        .class_name
        .as_deref()
        .and_then(|c| c.split_whitespace().next());
    let name = el
        .attributes
        .get("name")
        .map(String::as_str)
        .filter(|n| !n.is_empty());

    let selector = match (id, first_class, name) {
        (Some(id), _, _) => format!("{}#{}", tag, id),
        (None, Some(class), _) => format!("{}.{}", tag, class),
        (None, None, Some(name)) => format!("{}[name='{}']", tag, name),
        (None, None, None) => tag,
    };

    let attributes: BTreeMap<String, String> = KEPT_ATTRIBUTES
        .iter()
        .filter_map(|key| {
            el.attributes
                .get(*key)
                .filter(|v| !v.is_empty())
                .map(|v| (key.to_string(), v.clone()))
        })
        .collect();

    InteractiveElement {
        kind,
        text: (!text.is_empty()).then_some(text),
        selector,
        attributes,
    }
}

/// Suggestions for a failure, by error category
///
/// Categories are independent and may all apply. The fallback is used only
/// when none does.
pub fn generate_suggestions(
    error: &str,
    step: &Step,
    elements: &[InteractiveElement],
) -> Vec<String> {
    let mut suggestions = Vec::new();
    let error_lower = error.to_lowercase();
    let instruction = step.instruction();

    if error_lower.contains("not found") || error_lower.contains("no element") {
        suggestions.push(format!("Element not found for: \"{}\"", instruction));

        let names: Vec<&str> = elements
            .iter()
            .filter(|el| el.kind == "button" || el.kind == "link")
            .map(|el| el.text.as_deref().unwrap_or(&el.selector))
            .take(MAX_CLICKABLE_NAMES)
            .collect();
        if !names.is_empty() {
            suggestions.push(format!("Available clickable elements: {}", names.join(", ")));
        }

        suggestions.push("Try using more specific text or check if element exists".to_string());
    }

    if error_lower.contains("timeout") {
        suggestions.push(
            "Operation timed out - the element may not be visible or page is still loading"
                .to_string(),
        );
        suggestions.push("Consider adding a wait step before this action".to_string());
        suggestions
            .push("Check if the page has fully loaded or if there are async operations".to_string());
    }

    if step.is_check() || error_lower.contains("check") || error_lower.contains("expected") {
        suggestions.push(format!("Check failed for: \"{}\"", instruction));
        suggestions.push("Verify the expected condition matches the current page state".to_string());
        suggestions.push("Consider rewording the check or using a different assertion".to_string());
    }

    if suggestions.is_empty() {
        suggestions.push(format!("Step failed: \"{}\"", instruction));
        suggestions.push(format!("Error: {}", error));
        suggestions.push("Review the page state and try a different approach".to_string());
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::ScriptedDriver;
    use crate::spec::CheckType;

    fn act(instruction: &str) -> Step {
        Step::Act {
            instruction: instruction.to_string(),
            line: 1,
        }
    }

    #[test]
    fn test_selector_preference() {
        let elements = build_elements(&[
            RawElement::new("BUTTON").with_id("submit").with_class("btn primary"),
            RawElement::new("a").with_class("  nav-link active").with_attr("href", "/home"),
            RawElement::new("input").with_attr("name", "email").with_attr("type", "email"),
            RawElement::new("textarea"),
        ]);

        let selectors: Vec<&str> = elements.iter().map(|e| e.selector.as_str()).collect();
        assert_eq!(
            selectors,
            vec!["button#submit", "a.nav-link", "input[name='email']", "textarea"]
        );
        assert_eq!(elements[1].kind, "link");
        assert_eq!(elements[1].attributes["href"], "/home");
        assert_eq!(elements[2].attributes.len(), 2);
        assert!(elements[3].attributes.is_empty());
    }

    #[test]
    fn test_text_trimmed_and_truncated() {
        let long = format!("  {}  ", "x".repeat(80));
        let elements = build_elements(&[
            RawElement::new("button").with_text(long),
            RawElement::new("button").with_text("   "),
            RawElement::new("input").with_attr("placeholder", "").with_attr("value", "v"),
        ]);
        assert_eq!(elements[0].text.as_ref().unwrap().chars().count(), 50);
        assert!(elements[1].text.is_none());
        assert_eq!(elements[2].attributes.keys().collect::<Vec<_>>(), vec!["value"]);
    }

    #[test]
    fn test_at_most_twenty_elements() {
        let raw: Vec<RawElement> = (0..30)
            .map(|i| RawElement::new("button").with_text(format!("b{}", i)))
            .collect();
        assert_eq!(build_elements(&raw).len(), MAX_ELEMENTS);
    }

    #[test]
    fn test_not_found_suggestions_list_clickables() {
        let elements = build_elements(&[
            RawElement::new("button").with_text("Sign in"),
            RawElement::new("input").with_attr("name", "email"),
            RawElement::new("a").with_class("forgot"),
        ]);
        let suggestions =
            generate_suggestions("No element found for instruction", &act("Click Register"), &elements);
        assert_eq!(
            suggestions,
            vec![
                "Element not found for: \"Click Register\"",
                "Available clickable elements: Sign in, a.forgot",
                "Try using more specific text or check if element exists",
            ]
        );
    }

    #[test]
    fn test_categories_combine() {
        let suggestions =
            generate_suggestions("Element not found before timeout", &act("Click Save"), &[]);
        assert_eq!(suggestions.len(), 5);
        assert!(suggestions[2].starts_with("Operation timed out"));

        let check = Step::Check {
            instruction: "URL contains /done".to_string(),
            check_type: CheckType::Deterministic,
            line: 4,
        };
        let suggestions = generate_suggestions("http://x/", &check, &[]);
        assert_eq!(suggestions[0], "Check failed for: \"URL contains /done\"");
        assert_eq!(suggestions.len(), 3);
    }

    #[test]
    fn test_fallback_suggestion() {
        let suggestions = generate_suggestions("boom", &act("Click Save"), &[]);
        assert_eq!(
            suggestions,
            vec![
                "Step failed: \"Click Save\"",
                "Error: boom",
                "Review the page state and try a different approach",
            ]
        );
    }

    #[tokio::test]
    async fn test_generate_failure_context() {
        let driver = ScriptedDriver::new()
            .with_page("http://x/login", "Login", "")
            .with_html("<html></html>")
            .with_elements(vec![RawElement::new("button").with_text("Sign in")]);
        driver.goto("http://x/login").await.unwrap();

        let step = act("Click Register");
        let context = generate_failure_context(&driver, &step, "Action failed: No element found")
            .await
            .unwrap();
        assert_eq!(context.page_url, "http://x/login");
        assert_eq!(context.page_snapshot, "<html></html>");
        assert_eq!(context.failed_step, step);
        assert_eq!(context.available_elements.len(), 1);
        assert_eq!(context.suggestions[1], "Available clickable elements: Sign in");
    }
}

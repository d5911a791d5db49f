//! Per-page DOM assertions run after the design review.

use design_review_core::html::strip_tags;
use design_review_core::{BrowserBridge, CustomCheck};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub selector: String,
    pub passed: bool,
    pub message: String,
}

impl CheckResult {
    fn new(check: &CustomCheck, passed: bool, message: impl Into<String>) -> Self {
        Self {
            name: check.name.clone(),
            selector: check.selector.clone(),
            passed,
            message: message.into(),
        }
    }
}

/// Run every check against the page currently loaded in `browser`.
///
/// Checks are independent: a bridge error fails only that check, with the
/// error as its message.
pub async fn run_custom_checks(browser: &dyn BrowserBridge, checks: &[CustomCheck]) -> Vec<CheckResult> {
    let mut results = Vec::with_capacity(checks.len());
    for check in checks {
        let result = match browser.visible_html(Some(&check.selector)).await {
            Ok(html) => evaluate(check, &html),
            Err(e) => CheckResult::new(check, false, e.to_string()),
        };
        debug!(check = %result.name, passed = result.passed, "custom check evaluated");
        results.push(result);
    }
    results
}

/// Presence checks for a page's `custom_selectors`: each passes when the
/// element exists and has content.
pub fn selector_checks(selectors: &[String]) -> Vec<CustomCheck> {
    selectors
        .iter()
        .map(|selector| CustomCheck {
            name: format!("{selector} present"),
            description: format!("{selector} is rendered"),
            selector: selector.clone(),
            expected: None,
        })
        .collect()
}

fn evaluate(check: &CustomCheck, html: &str) -> CheckResult {
    match &check.expected {
        Some(expected) => {
            if html.contains(expected.as_str()) || strip_tags(html).contains(expected.as_str()) {
                CheckResult::new(check, true, format!("found '{expected}'"))
            } else {
                CheckResult::new(
                    check,
                    false,
                    format!("expected '{expected}' in {}", check.selector),
                )
            }
        }
        None if html.trim().is_empty() => {
            CheckResult::new(check, false, format!("{} has no visible content", check.selector))
        }
        None => CheckResult::new(check, true, "element present"),
    }
}

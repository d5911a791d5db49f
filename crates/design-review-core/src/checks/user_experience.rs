//! Interaction and content checks.

use async_trait::async_trait;
use serde_json::json;

use super::{excerpt, CategoryChecker, CheckOutcome, PageSnapshot, ReviewContext};
use crate::domain::{CategoryKind, Issue, Severity};
use crate::error::Result;
use crate::html::{paired_elements, void_elements, Element, PairedTag, VoidTag};

const KIND: CategoryKind = CategoryKind::UserExperience;

/// Visible text shorter than this is reported as thin content.
const MIN_TEXT_CHARS: usize = 50;

#[derive(Debug, Default, Clone, Copy)]
pub struct UserExperienceChecker;

#[async_trait]
impl CategoryChecker for UserExperienceChecker {
    fn kind(&self) -> CategoryKind {
        KIND
    }

    async fn check(&self, ctx: &ReviewContext<'_>) -> Result<CheckOutcome> {
        let snapshot = ctx.snapshot()?;
        Ok(evaluate(snapshot))
    }
}

fn evaluate(snapshot: &PageSnapshot) -> CheckOutcome {
    let mut issues = Vec::new();

    let console_errors: Vec<_> = snapshot.console_errors().collect();
    for error in &console_errors {
        issues.push(
            Issue::new(
                Severity::Major,
                KIND,
                "JavaScript error visible to users",
                "Fix the script error; broken widgets erode trust",
            )
            .with_element(excerpt(&error.text)),
        );
    }

    let buttons = paired_elements(&snapshot.html, PairedTag::Button);
    let empty_buttons: Vec<&Element> = buttons
        .iter()
        .filter(|b| b.text().is_empty() && !b.has_aria_name())
        .collect();
    for button in &empty_buttons {
        issues.push(
            Issue::new(
                Severity::Minor,
                KIND,
                "Button has no visible label",
                "Give the button a short action-oriented label",
            )
            .with_element(excerpt(&button.open_tag)),
        );
    }

    let forms = paired_elements(&snapshot.html, PairedTag::Form);
    let forms_without_submit = forms.iter().filter(|f| !has_submit(f)).count();
    for form in forms.iter().filter(|f| !has_submit(f)) {
        issues.push(
            Issue::new(
                Severity::Minor,
                KIND,
                "Form has no submit control",
                "Add a clearly labelled submit button",
            )
            .with_element(excerpt(&form.open_tag)),
        );
    }

    let text_chars = snapshot.text.trim().chars().count();
    if text_chars < MIN_TEXT_CHARS {
        issues.push(Issue::new(
            Severity::Minor,
            KIND,
            format!("Page shows only {text_chars} characters of text"),
            "Add copy that explains the offer and the next step",
        ));
    }

    CheckOutcome::new(
        issues,
        json!({
            "console_errors": console_errors.len(),
            "buttons": buttons.len(),
            "empty_buttons": empty_buttons.len(),
            "forms": forms.len(),
            "forms_without_submit": forms_without_submit,
            "text_chars": text_chars,
        }),
    )
}

fn has_submit(form: &Element) -> bool {
    let submit_button = paired_elements(&form.inner, PairedTag::Button).iter().any(|b| {
        !matches!(
            b.attr("type").map(str::to_ascii_lowercase).as_deref(),
            Some("button") | Some("reset")
        )
    });
    let submit_input = void_elements(&form.inner, VoidTag::FormControl)
        .iter()
        .any(|i| {
            matches!(
                i.attr("type").map(str::to_ascii_lowercase).as_deref(),
                Some("submit") | Some("image")
            )
        });
    submit_button || submit_input
}

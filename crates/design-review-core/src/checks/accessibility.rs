//! Markup-level accessibility checks.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::json;

use super::{excerpt, CategoryChecker, CheckOutcome, ReviewContext};
use crate::domain::{CategoryKind, Issue, Severity};
use crate::error::Result;
use crate::html::{paired_elements, void_elements, Element, PairedTag, VoidTag};

const KIND: CategoryKind = CategoryKind::Accessibility;

/// Input types that carry their own label or are not user-facing.
const SELF_LABELLED_INPUTS: [&str; 5] = ["hidden", "submit", "button", "reset", "image"];

#[derive(Debug, Default, Clone, Copy)]
pub struct AccessibilityChecker;

#[async_trait]
impl CategoryChecker for AccessibilityChecker {
    fn kind(&self) -> CategoryKind {
        KIND
    }

    async fn check(&self, ctx: &ReviewContext<'_>) -> Result<CheckOutcome> {
        let snapshot = ctx.snapshot()?;
        Ok(evaluate(&snapshot.html))
    }
}

fn evaluate(html: &str) -> CheckOutcome {
    let mut issues = Vec::new();

    let has_lang = void_elements(html, VoidTag::Html)
        .first()
        .and_then(|e| e.attr("lang"))
        .is_some_and(|l| !l.trim().is_empty());
    if !has_lang {
        issues.push(Issue::new(
            Severity::Minor,
            KIND,
            "Document has no lang attribute",
            "Set <html lang=\"en\"> (or the page language)",
        ));
    }

    let images = void_elements(html, VoidTag::Img);
    let mut missing_alt = 0;
    for img in images.iter().filter(|i| !i.has_attr("alt")) {
        missing_alt += 1;
        issues.push(
            Issue::new(
                Severity::Major,
                KIND,
                "Image is missing alt text",
                "Describe the image in alt, or use alt=\"\" if it is decorative",
            )
            .with_element(excerpt(&img.open_tag)),
        );
    }

    let labels = paired_elements(html, PairedTag::Label);
    let labelled_ids: BTreeSet<&str> = labels.iter().filter_map(|l| l.attr("for")).collect();
    let controls = void_elements(html, VoidTag::FormControl);
    let mut unlabeled = 0;
    for control in controls.iter().filter(|c| needs_label(c)) {
        let by_for = control.attr("id").is_some_and(|id| labelled_ids.contains(id));
        let wrapped = labels.iter().any(|l| l.inner.contains(control.open_tag.as_str()));
        if !(by_for || wrapped || control.has_aria_name()) {
            unlabeled += 1;
            issues.push(
                Issue::new(
                    Severity::Major,
                    KIND,
                    "Form control has no accessible label",
                    "Associate a <label for=…> or add aria-label",
                )
                .with_element(excerpt(&control.open_tag)),
            );
        }
    }

    let links = paired_elements(html, PairedTag::Anchor);
    let mut empty_links = 0;
    for link in links.iter().filter(|l| is_empty_link(l)) {
        empty_links += 1;
        issues.push(
            Issue::new(
                Severity::Minor,
                KIND,
                "Link has no discernible text",
                "Add link text or an aria-label describing the destination",
            )
            .with_element(excerpt(&link.open_tag)),
        );
    }

    CheckOutcome::new(
        issues,
        json!({
            "lang": has_lang,
            "images": images.len(),
            "images_missing_alt": missing_alt,
            "form_controls": controls.len(),
            "unlabeled_controls": unlabeled,
            "links": links.len(),
            "empty_links": empty_links,
        }),
    )
}

fn needs_label(control: &Element) -> bool {
    let input_type = control.attr("type").unwrap_or("text").to_ascii_lowercase();
    !SELF_LABELLED_INPUTS.contains(&input_type.as_str())
}

fn is_empty_link(link: &Element) -> bool {
    if !link.text().is_empty() || link.has_aria_name() {
        return false;
    }
    let described_image = void_elements(&link.inner, VoidTag::Img)
        .iter()
        .any(|i| i.attr("alt").is_some_and(|a| !a.trim().is_empty()));
    !described_image
}

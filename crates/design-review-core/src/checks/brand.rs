//! Brand palette and typography checks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{CategoryChecker, CheckOutcome, ReviewContext};
use crate::domain::{CategoryKind, Issue, Severity};
use crate::error::Result;
use crate::html::{font_families, normalize_hex, style_colors};

const KIND: CategoryKind = CategoryKind::BrandConsistency;

/// Approved brand colours and fonts. Empty lists disable the corresponding check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandGuidelines {
    #[serde(default)]
    pub colors: Vec<String>,

    #[serde(default)]
    pub fonts: Vec<String>,
}

impl BrandGuidelines {
    pub fn new(colors: Vec<String>, fonts: Vec<String>) -> Self {
        Self { colors, fonts }
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.fonts.is_empty()
    }
}

/// Flags inline colours and fonts outside the brand guidelines.
#[derive(Debug, Default, Clone)]
pub struct BrandConsistencyChecker {
    guidelines: BrandGuidelines,
}

impl BrandConsistencyChecker {
    pub fn new(guidelines: BrandGuidelines) -> Self {
        Self { guidelines }
    }
}

#[async_trait]
impl CategoryChecker for BrandConsistencyChecker {
    fn kind(&self) -> CategoryKind {
        KIND
    }

    async fn check(&self, ctx: &ReviewContext<'_>) -> Result<CheckOutcome> {
        let snapshot = ctx.snapshot()?;
        Ok(evaluate(&self.guidelines, &snapshot.html))
    }
}

fn evaluate(guidelines: &BrandGuidelines, html: &str) -> CheckOutcome {
    let colors = style_colors(html);
    let fonts = font_families(html);
    let mut issues = Vec::new();

    if !guidelines.colors.is_empty() {
        let palette: Vec<String> = guidelines.colors.iter().map(|c| normalize_hex(c)).collect();
        for color in colors.iter().filter(|c| !palette.contains(c)) {
            issues.push(
                Issue::new(
                    Severity::Minor,
                    KIND,
                    format!("Colour {color} is not in the brand palette"),
                    "Replace the colour with the nearest brand token",
                )
                .with_element(color.clone()),
            );
        }
    }

    if !guidelines.fonts.is_empty() {
        for font in fonts
            .iter()
            .filter(|f| !guidelines.fonts.iter().any(|g| g.eq_ignore_ascii_case(f)))
        {
            issues.push(
                Issue::new(
                    Severity::Minor,
                    KIND,
                    format!("Font '{font}' is not a brand font"),
                    format!("Use one of: {}", guidelines.fonts.join(", ")),
                )
                .with_element(font.clone()),
            );
        }
    }

    CheckOutcome::new(
        issues,
        json!({
            "colors": colors,
            "fonts": fonts,
            "guidelines_configured": !guidelines.is_empty(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<h1 style="color:#1A2B3C; font-family: Inter">Hi</h1>
        <p style="color: #ff0000; font-family: 'Comic Sans MS', cursive">x</p>"#;

    #[test]
    fn test_empty_guidelines_report_nothing() {
        let outcome = evaluate(&BrandGuidelines::default(), PAGE);
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.details["guidelines_configured"], false);
    }

    #[test]
    fn test_off_palette_colour_and_font() {
        let guidelines = BrandGuidelines::new(vec!["#1a2b3c".to_string()], vec!["inter".to_string()]);
        let outcome = evaluate(&guidelines, PAGE);
        assert_eq!(outcome.issues.len(), 2);
        assert!(outcome.issues.iter().all(|i| i.severity == Severity::Minor));
        assert_eq!(outcome.issues[0].element.as_deref(), Some("#ff0000"));
        assert_eq!(outcome.issues[1].element.as_deref(), Some("Comic Sans MS"));
    }

    #[test]
    fn test_short_hex_palette_matches() {
        let guidelines = BrandGuidelines::new(vec!["#F00".to_string(), "#1a2b3c".to_string()], vec![]);
        let outcome = evaluate(&guidelines, PAGE);
        assert!(outcome.issues.is_empty());
    }
}

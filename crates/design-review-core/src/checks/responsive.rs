//! Responsive layout checks across device viewports.

use async_trait::async_trait;
use serde_json::json;

use super::{CategoryChecker, CheckOutcome, ReviewContext};
use crate::domain::{CategoryKind, Issue, Severity, Viewport};
use crate::error::Result;
use crate::html::{void_elements, VoidTag};

const KIND: CategoryKind = CategoryKind::ResponsiveDesign;

/// Loads the page at each viewport and flags horizontal overflow, plus a
/// missing viewport meta tag.
///
/// Bridge failures propagate; the review service turns them into a failed
/// category.
#[derive(Debug, Clone)]
pub struct ResponsiveDesignChecker {
    viewports: Vec<Viewport>,
}

impl Default for ResponsiveDesignChecker {
    fn default() -> Self {
        Self::new(vec![Viewport::MOBILE, Viewport::TABLET, Viewport::DESKTOP])
    }
}

impl ResponsiveDesignChecker {
    pub fn new(viewports: Vec<Viewport>) -> Self {
        Self { viewports }
    }
}

#[async_trait]
impl CategoryChecker for ResponsiveDesignChecker {
    fn kind(&self) -> CategoryKind {
        KIND
    }

    async fn check(&self, ctx: &ReviewContext<'_>) -> Result<CheckOutcome> {
        let snapshot = ctx.snapshot()?;
        let mut issues = Vec::new();

        let has_viewport_meta = void_elements(&snapshot.html, VoidTag::Meta)
            .iter()
            .any(|m| m.attr("name").is_some_and(|n| n.eq_ignore_ascii_case("viewport")));
        if !has_viewport_meta {
            issues.push(Issue::new(
                Severity::Major,
                KIND,
                "Missing <meta name=\"viewport\"> tag",
                "Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
            ));
        }

        let mut measured = Vec::new();
        for viewport in &self.viewports {
            ctx.browser.navigate(ctx.url, *viewport).await?;
            let shot = ctx.browser.screenshot(None, true).await?;
            measured.push(json!({
                "viewport": viewport,
                "content_width": shot.width,
            }));
            if shot.width > viewport.width {
                issues.push(
                    Issue::new(
                        Severity::Major,
                        KIND,
                        format!(
                            "Content overflows horizontally at {}px ({}px wide)",
                            viewport.width, shot.width
                        ),
                        "Constrain fixed-width elements and allow flex/grid children to wrap",
                    )
                    .with_element(format!("viewport {}x{}", viewport.width, viewport.height)),
                );
            }
        }

        // Leave the browser on the review viewport for later checkers.
        if self.viewports.last() != Some(&ctx.viewport) {
            ctx.browser.navigate(ctx.url, ctx.viewport).await?;
        }

        Ok(CheckOutcome::new(
            issues,
            json!({
                "viewport_meta": has_viewport_meta,
                "viewports": measured,
            }),
        ))
    }
}

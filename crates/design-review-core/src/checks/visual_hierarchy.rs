//! Heading structure checks.

use async_trait::async_trait;
use serde_json::json;

use super::{CategoryChecker, CheckOutcome, ReviewContext};
use crate::domain::{CategoryKind, Issue, Severity};
use crate::error::Result;
use crate::html::heading_levels;

const KIND: CategoryKind = CategoryKind::VisualHierarchy;

/// Flags a missing or duplicated `<h1>` and skipped heading levels.
#[derive(Debug, Default, Clone, Copy)]
pub struct VisualHierarchyChecker;

#[async_trait]
impl CategoryChecker for VisualHierarchyChecker {
    fn kind(&self) -> CategoryKind {
        KIND
    }

    async fn check(&self, ctx: &ReviewContext<'_>) -> Result<CheckOutcome> {
        let snapshot = ctx.snapshot()?;
        let levels = heading_levels(&snapshot.html);
        Ok(evaluate(&levels))
    }
}

fn evaluate(levels: &[u8]) -> CheckOutcome {
    let mut issues = Vec::new();
    let h1_count = levels.iter().filter(|l| **l == 1).count();

    match h1_count {
        0 => issues.push(Issue::new(
            Severity::Major,
            KIND,
            "Page has no <h1> heading",
            "Add a single <h1> that states the page's primary message",
        )),
        1 => {}
        n => issues.push(Issue::new(
            Severity::Major,
            KIND,
            format!("Page has {n} <h1> headings"),
            "Keep exactly one <h1> and demote the others to <h2>",
        )),
    }

    let mut previous: Option<u8> = None;
    for &level in levels {
        if let Some(prev) = previous {
            if level > prev + 1 {
                issues.push(
                    Issue::new(
                        Severity::Minor,
                        KIND,
                        format!("Heading level skips from h{prev} to h{level}"),
                        format!("Use h{} before introducing h{level}", prev + 1),
                    )
                    .with_element(format!("h{level}")),
                );
            }
        }
        previous = Some(level);
    }

    CheckOutcome::new(
        issues,
        json!({
            "heading_count": levels.len(),
            "h1_count": h1_count,
            "levels": levels,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::PageSnapshot;
    use crate::domain::Viewport;
    use crate::fakes::ScriptedBrowser;

    #[test]
    fn test_well_formed_outline_has_no_issues() {
        let outcome = evaluate(&[1, 2, 3, 2, 3]);
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.details["h1_count"], 1);
    }

    #[test]
    fn test_missing_h1_is_major() {
        let outcome = evaluate(&[2, 3]);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].severity, Severity::Major);
    }

    #[test]
    fn test_multiple_h1_and_skips() {
        let outcome = evaluate(&[1, 3, 1, 4]);
        let majors = outcome.issues.iter().filter(|i| i.severity == Severity::Major).count();
        let minors = outcome.issues.iter().filter(|i| i.severity == Severity::Minor).count();
        assert_eq!(majors, 1);
        // 1 -> 3 and 1 -> 4
        assert_eq!(minors, 2);
    }

    #[tokio::test]
    async fn test_check_reads_snapshot_html() {
        let browser = ScriptedBrowser::new();
        let snapshot = Ok(PageSnapshot {
            html: "<h1>Fund your AI startup</h1><h2>How</h2>".to_string(),
            ..Default::default()
        });
        let ctx = ReviewContext {
            url: "https://example.com",
            viewport: Viewport::DESKTOP,
            browser: &browser,
            snapshot: &snapshot,
        };
        let outcome = VisualHierarchyChecker.check(&ctx).await.expect("check");
        assert!(outcome.issues.is_empty());
    }

    #[tokio::test]
    async fn test_check_fails_without_snapshot() {
        let browser = ScriptedBrowser::new();
        let snapshot = Err("navigation refused".to_string());
        let ctx = ReviewContext {
            url: "https://example.com",
            viewport: Viewport::DESKTOP,
            browser: &browser,
            snapshot: &snapshot,
        };
        assert!(VisualHierarchyChecker.check(&ctx).await.is_err());
    }
}

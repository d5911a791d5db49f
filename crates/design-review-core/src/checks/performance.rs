//! Core Web Vitals checks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{excerpt, CategoryChecker, CheckOutcome, ReviewContext};
use crate::bridge::{ConsoleLevel, ConsoleMessage, PerformanceMetrics};
use crate::domain::{CategoryKind, Issue, Severity};
use crate::error::Result;

const KIND: CategoryKind = CategoryKind::Performance;

/// Upper bounds for the "good" range of each web vital.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceBudget {
    pub lcp_ms: f64,
    pub fid_ms: f64,
    pub cls: f64,
}

impl Default for PerformanceBudget {
    fn default() -> Self {
        Self {
            lcp_ms: 2500.0,
            fid_ms: 100.0,
            cls: 0.1,
        }
    }
}

/// Reloads the page, reads LCP/FID/CLS and console errors.
#[derive(Debug, Default, Clone)]
pub struct PerformanceChecker {
    budget: PerformanceBudget,
}

impl PerformanceChecker {
    pub fn new(budget: PerformanceBudget) -> Self {
        Self { budget }
    }
}

#[async_trait]
impl CategoryChecker for PerformanceChecker {
    fn kind(&self) -> CategoryKind {
        KIND
    }

    async fn check(&self, ctx: &ReviewContext<'_>) -> Result<CheckOutcome> {
        ctx.browser.navigate(ctx.url, ctx.viewport).await?;
        let metrics = ctx.browser.performance_metrics().await?;
        let errors = ctx.browser.console_logs(Some(ConsoleLevel::Error)).await?;
        Ok(evaluate(&self.budget, &metrics, &errors))
    }
}

fn evaluate(
    budget: &PerformanceBudget,
    metrics: &PerformanceMetrics,
    errors: &[ConsoleMessage],
) -> CheckOutcome {
    let mut issues = Vec::new();

    if metrics.lcp_ms > budget.lcp_ms {
        issues.push(Issue::new(
            Severity::Major,
            KIND,
            format!(
                "Largest Contentful Paint is {:.0}ms (budget {:.0}ms)",
                metrics.lcp_ms, budget.lcp_ms
            ),
            "Preload the hero image, compress assets and defer non-critical scripts",
        ));
    }
    if metrics.fid_ms > budget.fid_ms {
        issues.push(Issue::new(
            Severity::Major,
            KIND,
            format!(
                "First Input Delay is {:.0}ms (budget {:.0}ms)",
                metrics.fid_ms, budget.fid_ms
            ),
            "Break up long main-thread tasks and reduce third-party script work",
        ));
    }
    if metrics.cls > budget.cls {
        issues.push(Issue::new(
            Severity::Major,
            KIND,
            format!(
                "Cumulative Layout Shift is {:.2} (budget {:.2})",
                metrics.cls, budget.cls
            ),
            "Reserve space for images, embeds and late-loading fonts",
        ));
    }

    for error in errors.iter().filter(|e| e.level == ConsoleLevel::Error) {
        issues.push(
            Issue::new(
                Severity::Minor,
                KIND,
                "Console error during page load",
                "Fix the failing script or resource request",
            )
            .with_element(excerpt(&error.text)),
        );
    }

    CheckOutcome::new(
        issues,
        json!({
            "lcp_ms": metrics.lcp_ms,
            "fid_ms": metrics.fid_ms,
            "cls": metrics.cls,
            "console_errors": errors.len(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Viewport;
    use crate::fakes::ScriptedBrowser;

    fn metrics(lcp_ms: f64, fid_ms: f64, cls: f64) -> PerformanceMetrics {
        PerformanceMetrics {
            lcp_ms,
            fid_ms,
            cls,
        }
    }

    #[test]
    fn test_within_budget() {
        let outcome = evaluate(&PerformanceBudget::default(), &metrics(2500.0, 100.0, 0.1), &[]);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_all_vitals_over_budget() {
        let outcome = evaluate(&PerformanceBudget::default(), &metrics(4100.0, 250.0, 0.3), &[]);
        assert_eq!(outcome.issues.len(), 3);
        assert!(outcome.issues.iter().all(|i| i.severity == Severity::Major));
    }

    #[test]
    fn test_console_errors_are_minor() {
        let errors = vec![ConsoleMessage {
            level: ConsoleLevel::Error,
            text: "Failed to load resource: 404".to_string(),
        }];
        let outcome = evaluate(&PerformanceBudget::default(), &metrics(1000.0, 10.0, 0.0), &errors);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].severity, Severity::Minor);
    }

    #[tokio::test]
    async fn test_check_runs_without_snapshot() {
        let browser = ScriptedBrowser::new().with_metrics(metrics(3000.0, 20.0, 0.01));
        let snapshot = Err("capture failed".to_string());
        let ctx = ReviewContext {
            url: "https://example.com",
            viewport: Viewport::DESKTOP,
            browser: &browser,
            snapshot: &snapshot,
        };
        let outcome = PerformanceChecker::default().check(&ctx).await.expect("check");
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.details["lcp_ms"], 3000.0);
    }
}

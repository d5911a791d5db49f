//! Multi-page design review orchestration.

use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use design_review_core::obs;
use design_review_core::{
    AutomatedDesignReview, BrowserBridge, CategoryKind, CustomCheck, DesignReviewConfig,
    DesignReviewResult, DesignToolBridge, PageConfig, PagePriority, RecommendationPriority,
    Severity,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::config::{NotificationSettings, OrchestrationConfig};
use crate::custom_check::{run_custom_checks, selector_checks, CheckResult};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::figma::{FigmaValidationPipeline, ValidationConfig, ValidationResult};
use crate::notify::{Notification, Notifier};

/// Selector compared with the design node when a page names none.
const DEFAULT_FIGMA_SELECTOR: &str = "body";

/// Maximum number of recommendations carried in a run summary.
const TOP_RECOMMENDATIONS: usize = 5;

/// Verdict for a whole orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Passed,
    Warning,
    Failed,
}

impl OverallStatus {
    pub fn name(&self) -> &'static str {
        match self {
            OverallStatus::Passed => "passed",
            OverallStatus::Warning => "warning",
            OverallStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Passed when nothing failed, Failed when more than half failed, else Warning.
pub fn classify_status(total: usize, failed: usize) -> OverallStatus {
    if failed == 0 {
        OverallStatus::Passed
    } else if failed * 2 > total {
        OverallStatus::Failed
    } else {
        OverallStatus::Warning
    }
}

/// Pages ordered high → medium → low, keeping config order within a priority.
pub fn prioritize(pages: &[PageConfig]) -> Vec<PageConfig> {
    let mut ordered = pages.to_vec();
    ordered.sort_by_key(|p| Reverse(p.priority.rank()));
    ordered
}

/// Everything produced for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReview {
    pub page_name: String,
    pub url: String,
    pub priority: PagePriority,
    pub design_review: DesignReviewResult,
    pub custom_checks: Vec<CheckResult>,

    /// `None` when the page has no design node or validation failed.
    pub figma_validation: Option<ValidationResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub critical_issues: usize,
    pub major_issues: usize,
    pub minor_issues: usize,

    /// High-priority recommendation descriptions, in page order.
    pub top_recommendations: Vec<String>,
    pub average_performance: f64,
    pub average_accessibility: f64,
}

impl ResultSummary {
    pub fn from_pages(pages: &[PageReview]) -> Self {
        let count = |severity: Severity| -> usize {
            pages
                .iter()
                .map(|p| p.design_review.count_severity(severity))
                .sum()
        };

        let top_recommendations = pages
            .iter()
            .flat_map(|p| p.design_review.recommendations.iter())
            .filter(|r| r.priority == RecommendationPriority::High)
            .take(TOP_RECOMMENDATIONS)
            .map(|r| r.description.clone())
            .collect();

        Self {
            critical_issues: count(Severity::Critical),
            major_issues: count(Severity::Major),
            minor_issues: count(Severity::Minor),
            top_recommendations,
            average_performance: average_score(pages, CategoryKind::Performance),
            average_accessibility: average_score(pages, CategoryKind::Accessibility),
        }
    }
}

/// Mean category score over all pages; a page without the category counts 0.
fn average_score(pages: &[PageReview], kind: CategoryKind) -> f64 {
    if pages.is_empty() {
        return 0.0;
    }
    let total: u32 = pages
        .iter()
        .map(|p| p.design_review.category(kind).map_or(0, |c| c.score))
        .sum();
    f64::from(total) / pages.len() as f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total_pages: usize,
    pub passed_pages: usize,
    pub failed_pages: usize,
    pub overall_status: OverallStatus,

    /// Page reviews in processing order.
    pub pages: Vec<PageReview>,
    pub summary: ResultSummary,
}

impl OrchestrationResult {
    fn from_pages(
        run_id: String,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        duration_ms: u64,
        pages: Vec<PageReview>,
    ) -> Self {
        let total_pages = pages.len();
        let passed_pages = pages.iter().filter(|p| p.design_review.passed).count();
        let failed_pages = total_pages - passed_pages;
        let summary = ResultSummary::from_pages(&pages);
        Self {
            run_id,
            started_at,
            finished_at,
            duration_ms,
            total_pages,
            passed_pages,
            failed_pages,
            overall_status: classify_status(total_pages, failed_pages),
            pages,
            summary,
        }
    }

    pub fn page(&self, name: &str) -> Option<&PageReview> {
        self.pages.iter().find(|p| p.page_name == name)
    }

    pub fn render_markdown(&self) -> String {
        let mut md = format!(
            "# Design Review Run {}\n\n**Status:** {} ({}/{} pages passed)\n",
            self.run_id, self.overall_status, self.passed_pages, self.total_pages
        );

        md.push_str("\n## Pages\n\n| Page | Priority | Score | Result | Custom checks | Figma |\n|---|---|---|---|---|---|\n");
        for page in &self.pages {
            let checks_passed = page.custom_checks.iter().filter(|c| c.passed).count();
            let figma = match &page.figma_validation {
                Some(v) => format!(
                    "{:.1}% {}",
                    v.visual.similarity,
                    if v.passed { "✓" } else { "✗" }
                ),
                None => "-".to_string(),
            };
            md.push_str(&format!(
                "| {} | {:?} | {} | {} | {}/{} | {} |\n",
                page.page_name,
                page.priority,
                page.design_review.overall_score,
                if page.design_review.passed { "passed" } else { "failed" },
                checks_passed,
                page.custom_checks.len(),
                figma
            ));
        }

        let s = &self.summary;
        md.push_str(&format!(
            "\n## Summary\n\n- Critical issues: {}\n- Major issues: {}\n- Minor issues: {}\n- Average performance: {:.1}\n- Average accessibility: {:.1}\n",
            s.critical_issues, s.major_issues, s.minor_issues, s.average_performance, s.average_accessibility
        ));

        if !s.top_recommendations.is_empty() {
            md.push_str("\n## Top Recommendations\n\n");
            for (i, rec) in s.top_recommendations.iter().enumerate() {
                md.push_str(&format!("{}. {}\n", i + 1, rec));
            }
        }
        md
    }

    /// Notification describing this run.
    pub fn notification(&self) -> Notification {
        let failing: Vec<String> = self
            .pages
            .iter()
            .filter(|p| !p.design_review.passed)
            .map(|p| format!("{} ({}/100)", p.page_name, p.design_review.overall_score))
            .collect();
        let message = if failing.is_empty() {
            "All pages passed.".to_string()
        } else {
            format!("Failing pages: {}", failing.join(", "))
        };

        Notification {
            run_id: self.run_id.clone(),
            status: self.overall_status,
            title: format!(
                "Design review {}: {}/{} pages passed",
                self.overall_status, self.passed_pages, self.total_pages
            ),
            message,
            details: serde_json::json!({
                "critical_issues": self.summary.critical_issues,
                "major_issues": self.summary.major_issues,
                "top_recommendations": self.summary.top_recommendations,
            }),
            timestamp: Utc::now(),
        }
    }

    /// With `on_failure`, only runs that did not pass are announced.
    pub fn should_notify(&self, settings: &NotificationSettings) -> bool {
        !settings.on_failure || self.overall_status != OverallStatus::Passed
    }
}

/// Reviews a set of pages and aggregates the results.
pub struct DesignReviewOrchestrator {
    browser: Arc<dyn BrowserBridge>,
    design: Option<Arc<dyn DesignToolBridge>>,
    notifier: Option<Notifier>,
}

impl DesignReviewOrchestrator {
    pub fn new(browser: Arc<dyn BrowserBridge>) -> Self {
        Self {
            browser,
            design: None,
            notifier: None,
        }
    }

    /// Enable design validation for pages with a `figma_node_id`.
    pub fn with_design_tool(mut self, design: Arc<dyn DesignToolBridge>) -> Self {
        self.design = Some(design);
        self
    }

    /// Use `notifier` instead of the channels named in the config.
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Review every page, highest priority first, one page at a time.
    ///
    /// Page-level failures are recorded in the result; the run itself does
    /// not fail.
    pub async fn orchestrate_review(&self, config: &OrchestrationConfig) -> OrchestrationResult {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let start = Instant::now();
        obs::emit_orchestration_started(&run_id, config.pages.len());

        let review = AutomatedDesignReview::new(
            Arc::clone(&self.browser),
            config.review_settings.options.clone(),
        );

        let pages = async {
            let mut pages = Vec::with_capacity(config.pages.len());
            for page in prioritize(&config.pages) {
                info!(page = %page.name, priority = ?page.priority, "reviewing page");
                pages.push(self.review_page(&review, &page, config).await);
            }
            pages
        }
        .instrument(obs::run_span(&run_id))
        .await;

        let result = OrchestrationResult::from_pages(
            run_id,
            started_at,
            Utc::now(),
            start.elapsed().as_millis() as u64,
            pages,
        );
        obs::emit_orchestration_finished(
            &result.run_id,
            result.overall_status.name(),
            result.passed_pages,
            result.failed_pages,
            result.duration_ms,
        );
        result
    }

    async fn review_page(
        &self,
        review: &AutomatedDesignReview,
        page: &PageConfig,
        config: &OrchestrationConfig,
    ) -> PageReview {
        let review_config = DesignReviewConfig {
            url: page.url.clone(),
            page_name: page.name.clone(),
            figma_node_id: page.figma_node_id.clone(),
            categories: design_review_core::default_categories(),
        }
        .without(&config.review_settings.skip_categories);
        let design_review = review.review_design(&review_config).await;

        let mut checks = page.custom_checks.clone();
        checks.extend(selector_checks(&page.custom_selectors));
        let custom_checks = if checks.is_empty() {
            Vec::new()
        } else {
            self.run_page_checks(page, &checks, config).await
        };

        let figma_validation = match &page.figma_node_id {
            Some(node_id) => match self.validate_figma(page, node_id, config).await {
                Ok(validation) => Some(validation),
                Err(e) => {
                    obs::emit_figma_skipped(&page.name, &e);
                    None
                }
            },
            None => None,
        };

        PageReview {
            page_name: page.name.clone(),
            url: page.url.clone(),
            priority: page.priority,
            design_review,
            custom_checks,
            figma_validation,
        }
    }

    async fn run_page_checks(
        &self,
        page: &PageConfig,
        checks: &[CustomCheck],
        config: &OrchestrationConfig,
    ) -> Vec<CheckResult> {
        let viewport = config.review_settings.options.viewport;
        if let Err(e) = self.browser.navigate(&page.url, viewport).await {
            warn!(page = %page.name, error = %e, "custom checks cannot load page");
            return checks
                .iter()
                .map(|c| CheckResult {
                    name: c.name.clone(),
                    selector: c.selector.clone(),
                    passed: false,
                    message: e.to_string(),
                })
                .collect();
        }
        run_custom_checks(self.browser.as_ref(), checks).await
    }

    async fn validate_figma(
        &self,
        page: &PageConfig,
        node_id: &str,
        config: &OrchestrationConfig,
    ) -> OrchestratorResult<ValidationResult> {
        let design = self.design.as_ref().ok_or_else(|| {
            OrchestratorError::InvalidConfig("no design tool bridge configured".to_string())
        })?;
        let pipeline = FigmaValidationPipeline::new(Arc::clone(design), Arc::clone(&self.browser));
        let selector = page
            .figma_selector
            .as_deref()
            .unwrap_or(DEFAULT_FIGMA_SELECTOR);
        let validation = ValidationConfig::new(node_id, &page.url, selector)
            .with_viewport(config.review_settings.options.viewport)
            .with_thresholds(
                config.figma.tolerance_threshold,
                config.figma.token_coverage_threshold,
            );
        pipeline.validate_implementation(&validation).await
    }

    /// Deliver the run's notification if the settings call for it.
    ///
    /// Returns the number of sinks that accepted it.
    pub async fn notify(&self, result: &OrchestrationResult, settings: &NotificationSettings) -> usize {
        if !result.should_notify(settings) {
            return 0;
        }
        let notification = result.notification();
        match &self.notifier {
            Some(notifier) => notifier.notify(&notification).await,
            None => match Notifier::from_settings(settings) {
                Ok(notifier) => notifier.notify(&notification).await,
                Err(e) => {
                    obs::emit_notification_failed("all", &e);
                    0
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use design_review_core::ReviewFrequency;

    fn page(name: &str, priority: PagePriority) -> PageConfig {
        PageConfig::new(
            name,
            format!("https://example.com/{name}"),
            priority,
            ReviewFrequency::Daily,
        )
    }

    #[test]
    fn test_prioritize_is_stable() {
        let pages = vec![
            page("a", PagePriority::Low),
            page("b", PagePriority::High),
            page("c", PagePriority::Medium),
            page("d", PagePriority::High),
        ];
        let names: Vec<String> = prioritize(&pages).into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_classify_status_four_pages() {
        assert_eq!(classify_status(4, 0), OverallStatus::Passed);
        assert_eq!(classify_status(4, 1), OverallStatus::Warning);
        assert_eq!(classify_status(4, 2), OverallStatus::Warning);
        assert_eq!(classify_status(4, 3), OverallStatus::Failed);
        assert_eq!(classify_status(0, 0), OverallStatus::Passed);
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = ResultSummary::from_pages(&[]);
        assert_eq!(summary.average_performance, 0.0);
        assert_eq!(summary.average_accessibility, 0.0);
        assert!(summary.top_recommendations.is_empty());
    }

    #[test]
    fn test_should_notify() {
        let result = OrchestrationResult::from_pages("r".to_string(), Utc::now(), Utc::now(), 0, vec![]);
        assert_eq!(result.overall_status, OverallStatus::Passed);
        assert!(!result.should_notify(&NotificationSettings::default()));
        let always = NotificationSettings {
            on_failure: false,
            ..NotificationSettings::default()
        };
        assert!(result.should_notify(&always));
    }
}

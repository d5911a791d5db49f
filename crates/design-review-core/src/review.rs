//! The automated design review service.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::bridge::BrowserBridge;
use crate::checks::{
    AccessibilityChecker, BrandConsistencyChecker, BrandGuidelines, CategoryChecker,
    PageSnapshot, PerformanceBudget, PerformanceChecker, ResponsiveDesignChecker, ReviewContext,
    UserExperienceChecker, VisualHierarchyChecker,
};
use crate::domain::{
    default_categories, CategoryKind, CategoryResult, DesignReviewResult, ReviewCategory, Viewport,
};
use crate::error::Result;
use crate::obs;
use crate::report::render_review_markdown;
use crate::scoring::PenaltyConfig;

/// Service-wide review options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOptions {
    /// Viewport used for the page snapshot and performance run.
    #[serde(default)]
    pub viewport: Viewport,

    /// Viewports exercised by the responsive checker.
    #[serde(default = "default_responsive_viewports")]
    pub responsive_viewports: Vec<Viewport>,

    #[serde(default)]
    pub brand: BrandGuidelines,

    #[serde(default)]
    pub penalties: PenaltyConfig,

    #[serde(default)]
    pub performance_budget: PerformanceBudget,
}

fn default_responsive_viewports() -> Vec<Viewport> {
    vec![Viewport::MOBILE, Viewport::TABLET, Viewport::DESKTOP]
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            responsive_viewports: default_responsive_viewports(),
            brand: BrandGuidelines::default(),
            penalties: PenaltyConfig::default(),
            performance_budget: PerformanceBudget::default(),
        }
    }
}

/// Input for reviewing one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignReviewConfig {
    pub url: String,
    pub page_name: String,

    #[serde(default)]
    pub figma_node_id: Option<String>,

    #[serde(default = "default_categories")]
    pub categories: Vec<ReviewCategory>,
}

impl DesignReviewConfig {
    /// Review `url` with the six default categories.
    pub fn new(url: impl Into<String>, page_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            page_name: page_name.into(),
            figma_node_id: None,
            categories: default_categories(),
        }
    }

    pub fn with_categories(mut self, categories: Vec<ReviewCategory>) -> Self {
        self.categories = categories;
        self
    }

    /// Drop the given categories from the review.
    pub fn without(mut self, skip: &[CategoryKind]) -> Self {
        self.categories.retain(|c| !skip.contains(&c.kind));
        self
    }
}

/// Runs the category checkers for a page and aggregates the results.
///
/// Construct one per browser session and inject it where reviews are needed.
pub struct AutomatedDesignReview {
    browser: Arc<dyn BrowserBridge>,
    options: ReviewOptions,
    checkers: BTreeMap<CategoryKind, Arc<dyn CategoryChecker>>,
}

impl AutomatedDesignReview {
    pub fn new(browser: Arc<dyn BrowserBridge>, options: ReviewOptions) -> Self {
        let defaults: Vec<Arc<dyn CategoryChecker>> = vec![
            Arc::new(VisualHierarchyChecker),
            Arc::new(BrandConsistencyChecker::new(options.brand.clone())),
            Arc::new(ResponsiveDesignChecker::new(options.responsive_viewports.clone())),
            Arc::new(AccessibilityChecker),
            Arc::new(PerformanceChecker::new(options.performance_budget)),
            Arc::new(UserExperienceChecker),
        ];
        let checkers = defaults.into_iter().map(|c| (c.kind(), c)).collect();
        Self {
            browser,
            options,
            checkers,
        }
    }

    /// Replace the checker registered for the checker's category.
    pub fn with_checker(mut self, checker: Arc<dyn CategoryChecker>) -> Self {
        self.checkers.insert(checker.kind(), checker);
        self
    }

    pub fn options(&self) -> &ReviewOptions {
        &self.options
    }

    pub fn browser(&self) -> Arc<dyn BrowserBridge> {
        Arc::clone(&self.browser)
    }

    /// Review one page.
    ///
    /// Never fails: a checker error becomes a zero-score category carrying a
    /// single critical issue, and the remaining categories still run.
    pub async fn review_design(&self, config: &DesignReviewConfig) -> DesignReviewResult {
        let start = Instant::now();
        obs::emit_review_started(&config.page_name, &config.url);

        let snapshot = self.capture(&config.url).await.map_err(|e| {
            warn!(page = %config.page_name, error = %e, "page capture failed");
            e.to_string()
        });

        let ctx = ReviewContext {
            url: &config.url,
            viewport: self.options.viewport,
            browser: self.browser.as_ref(),
            snapshot: &snapshot,
        };

        let mut results = Vec::new();
        for category in config.categories.iter().filter(|c| c.enabled) {
            let result = self.run_category(category, &ctx).await;
            obs::emit_category_scored(&config.page_name, category.kind.name(), result.score, result.issues.len());
            results.push(result);
        }

        let review = DesignReviewResult::from_categories(&config.page_name, &config.url, results);
        info!("{}", render_review_markdown(&review));
        obs::emit_review_finished(
            &config.page_name,
            review.overall_score,
            review.passed,
            start.elapsed().as_millis() as u64,
        );
        review
    }

    async fn run_category(&self, category: &ReviewCategory, ctx: &ReviewContext<'_>) -> CategoryResult {
        let Some(checker) = self.checkers.get(&category.kind) else {
            return CategoryResult::failed(category.kind, category.weight, &"no checker registered");
        };

        match checker.check(ctx).await {
            Ok(outcome) => {
                let table = self.options.penalties.table(category.kind);
                let score = table.score(&outcome.issues);
                CategoryResult::new(category.kind, category.weight, score, outcome.issues, outcome.details)
            }
            Err(e) => {
                warn!(category = %category.kind, error = %e, "category review failed");
                CategoryResult::failed(category.kind, category.weight, &e)
            }
        }
    }

    async fn capture(&self, url: &str) -> Result<PageSnapshot> {
        self.browser.navigate(url, self.options.viewport).await?;
        let html = self.browser.visible_html(None).await?;
        let text = self.browser.visible_text().await?;
        let console = self.browser.console_logs(None).await?;
        Ok(PageSnapshot {
            html,
            text,
            console,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckOutcome;
    use crate::domain::{Issue, Severity};
    use crate::fakes::ScriptedBrowser;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedChecker {
        kind: CategoryKind,
        issues: Vec<Severity>,
    }

    #[async_trait]
    impl CategoryChecker for FixedChecker {
        fn kind(&self) -> CategoryKind {
            self.kind
        }

        async fn check(&self, _ctx: &ReviewContext<'_>) -> Result<CheckOutcome> {
            let issues = self
                .issues
                .iter()
                .map(|s| Issue::new(*s, self.kind, "fixed", "fix"))
                .collect();
            Ok(CheckOutcome::new(issues, json!({})))
        }
    }

    #[test]
    fn test_config_without_skips_categories() {
        let config = DesignReviewConfig::new("https://example.com", "home")
            .without(&[CategoryKind::Performance, CategoryKind::BrandConsistency]);
        assert_eq!(config.categories.len(), 4);
        assert!(config.categories.iter().all(|c| c.kind != CategoryKind::Performance));
    }

    #[tokio::test]
    async fn test_disabled_categories_are_not_reviewed() {
        let browser = Arc::new(ScriptedBrowser::new());
        let review = AutomatedDesignReview::new(browser, ReviewOptions::default());
        let config = DesignReviewConfig::new("https://example.com", "home").with_categories(vec![
            ReviewCategory::new(CategoryKind::Accessibility, 1.0).disabled(),
            ReviewCategory::new(CategoryKind::Performance, 1.0),
        ]);
        let result = review.review_design(&config).await;
        assert_eq!(result.categories.len(), 1);
        assert_eq!(result.categories[0].category, CategoryKind::Performance);
    }

    #[tokio::test]
    async fn test_injected_checker_and_penalties() {
        let browser = Arc::new(ScriptedBrowser::new());
        let review = AutomatedDesignReview::new(browser, ReviewOptions::default()).with_checker(
            Arc::new(FixedChecker {
                kind: CategoryKind::VisualHierarchy,
                issues: vec![Severity::Major, Severity::Minor],
            }),
        );
        let config = DesignReviewConfig::new("https://example.com", "home")
            .with_categories(vec![ReviewCategory::new(CategoryKind::VisualHierarchy, 1.0)]);
        let result = review.review_design(&config).await;
        // 100 - 20 - 5
        assert_eq!(result.categories[0].score, 75);
        assert_eq!(result.overall_score, 75);
        assert!(!result.passed);
        assert!(result.categories[0].passed);
    }

    #[tokio::test]
    async fn test_navigation_failure_fails_every_category() {
        let browser = Arc::new(ScriptedBrowser::new().failing_navigation("connection refused"));
        let review = AutomatedDesignReview::new(browser, ReviewOptions::default());
        let result = review
            .review_design(&DesignReviewConfig::new("https://down.example.com", "down"))
            .await;
        assert_eq!(result.categories.len(), 6);
        assert!(result.categories.iter().all(|c| c.score == 0 && c.issues.len() == 1));
        assert_eq!(result.critical_issues.len(), 6);
        assert_eq!(result.overall_score, 0);
        assert!(result
            .recommendations
            .iter()
            .all(|r| r.priority == crate::recommendation::RecommendationPriority::High));
    }
}

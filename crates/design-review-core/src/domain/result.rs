//! Per-category and per-page review results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::CategoryKind;
use super::issue::{Issue, Severity};
use crate::recommendation::{generate_recommendations, Recommendation};
use crate::scoring::{overall_score, CATEGORY_PASS_THRESHOLD, OVERALL_PASS_THRESHOLD};

/// Outcome of one category checker for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: CategoryKind,

    /// Score in `0..=100`.
    pub score: u32,
    pub weight: f64,

    /// `score >= 70`.
    pub passed: bool,
    pub issues: Vec<Issue>,

    /// Checker-specific measurements (heading counts, timings, ...).
    pub details: serde_json::Value,
}

impl CategoryResult {
    pub fn new(
        category: CategoryKind,
        weight: f64,
        score: u32,
        issues: Vec<Issue>,
        details: serde_json::Value,
    ) -> Self {
        let score = score.min(100);
        Self {
            category,
            score,
            weight,
            passed: score >= CATEGORY_PASS_THRESHOLD,
            issues,
            details,
        }
    }

    /// Result recorded when the checker itself failed.
    pub fn failed(category: CategoryKind, weight: f64, reason: &dyn std::fmt::Display) -> Self {
        Self::new(
            category,
            weight,
            0,
            vec![Issue::review_failed(category, reason)],
            serde_json::json!({ "error": reason.to_string() }),
        )
    }

    pub fn has_severity(&self, severity: Severity) -> bool {
        self.issues.iter().any(|i| i.severity == severity)
    }
}

/// Aggregate design review of a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignReviewResult {
    pub page_name: String,
    pub url: String,
    pub overall_score: u32,

    /// `overall_score >= 80`.
    pub passed: bool,
    pub categories: Vec<CategoryResult>,
    pub recommendations: Vec<Recommendation>,
    pub critical_issues: Vec<Issue>,

    /// Major issues.
    pub warnings: Vec<Issue>,
    pub timestamp: DateTime<Utc>,
}

impl DesignReviewResult {
    /// Derive scores, recommendations and issue lists from category results.
    pub fn from_categories(
        page_name: impl Into<String>,
        url: impl Into<String>,
        categories: Vec<CategoryResult>,
    ) -> Self {
        let overall_score = overall_score(&categories);
        let recommendations = generate_recommendations(&categories);
        let issues_of = |severity: Severity| -> Vec<Issue> {
            categories
                .iter()
                .flat_map(|c| c.issues.iter())
                .filter(|i| i.severity == severity)
                .cloned()
                .collect()
        };
        let critical_issues = issues_of(Severity::Critical);
        let warnings = issues_of(Severity::Major);

        Self {
            page_name: page_name.into(),
            url: url.into(),
            overall_score,
            passed: overall_score >= OVERALL_PASS_THRESHOLD,
            categories,
            recommendations,
            critical_issues,
            warnings,
            timestamp: Utc::now(),
        }
    }

    pub fn category(&self, kind: CategoryKind) -> Option<&CategoryResult> {
        self.categories.iter().find(|c| c.category == kind)
    }

    /// Number of issues with the given severity across all categories.
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.categories
            .iter()
            .flat_map(|c| c.issues.iter())
            .filter(|i| i.severity == severity)
            .count()
    }
}

//! Weighted scoring and severity penalties.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{CategoryKind, CategoryResult, Issue, Severity};

/// Minimum overall score for a page review to pass.
pub const OVERALL_PASS_THRESHOLD: u32 = 80;

/// Minimum score for a single category to pass.
pub const CATEGORY_PASS_THRESHOLD: u32 = 70;

/// Categories scoring at or above this produce no recommendation.
pub const RECOMMENDATION_THRESHOLD: u32 = 80;

/// Weight-normalized overall score, rounded to the nearest integer.
///
/// Returns 0 when the categories carry no weight.
pub fn overall_score(categories: &[CategoryResult]) -> u32 {
    let total_weight: f64 = categories.iter().map(|c| c.weight).sum();
    if total_weight <= 0.0 {
        return 0;
    }
    let weighted: f64 = categories
        .iter()
        .map(|c| f64::from(c.score) * c.weight)
        .sum();
    (weighted / total_weight).round() as u32
}

/// Points deducted per issue, by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyTable {
    pub critical: u32,
    pub major: u32,
    pub minor: u32,
}

impl PenaltyTable {
    pub const fn new(critical: u32, major: u32, minor: u32) -> Self {
        Self {
            critical,
            major,
            minor,
        }
    }

    pub fn penalty(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Critical => self.critical,
            Severity::Major => self.major,
            Severity::Minor => self.minor,
        }
    }

    /// Start at 100 and subtract the penalty of each issue, saturating at 0.
    pub fn score(&self, issues: &[Issue]) -> u32 {
        issues
            .iter()
            .fold(100u32, |score, issue| score.saturating_sub(self.penalty(issue.severity)))
    }
}

/// Per-category penalty tables.
///
/// Categories missing from `overrides` use their built-in default table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PenaltyConfig {
    #[serde(default)]
    pub overrides: BTreeMap<CategoryKind, PenaltyTable>,
}

impl PenaltyConfig {
    pub fn with_table(mut self, kind: CategoryKind, table: PenaltyTable) -> Self {
        self.overrides.insert(kind, table);
        self
    }

    pub fn table(&self, kind: CategoryKind) -> PenaltyTable {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| default_penalties(kind))
    }
}

/// Built-in penalty table for a category.
pub fn default_penalties(kind: CategoryKind) -> PenaltyTable {
    match kind {
        CategoryKind::VisualHierarchy => PenaltyTable::new(40, 20, 5),
        CategoryKind::BrandConsistency => PenaltyTable::new(40, 15, 5),
        CategoryKind::ResponsiveDesign => PenaltyTable::new(40, 25, 5),
        CategoryKind::Accessibility => PenaltyTable::new(40, 20, 5),
        CategoryKind::Performance => PenaltyTable::new(40, 20, 5),
        CategoryKind::UserExperience => PenaltyTable::new(40, 15, 5),
    }
}

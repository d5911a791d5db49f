//! Issues detected by category checkers.

use serde::{Deserialize, Serialize};

use super::category::CategoryKind;

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }
}

/// A single finding attached to one category result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub category: CategoryKind,
    pub description: String,
    pub suggestion: String,
    pub element: Option<String>,
}

impl Issue {
    pub fn new(
        severity: Severity,
        category: CategoryKind,
        description: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            description: description.into(),
            suggestion: suggestion.into(),
            element: None,
        }
    }

    /// Attach the offending element (selector or markup excerpt).
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// The synthetic issue recorded when a checker could not run.
    pub fn review_failed(category: CategoryKind, reason: &dyn std::fmt::Display) -> Self {
        Self::new(
            Severity::Critical,
            category,
            format!("{} review failed: {}", category, reason),
            "Verify the page is reachable and the capture bridge is running",
        )
    }
}

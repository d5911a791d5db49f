//! Category checkers.
//!
//! Each checker inspects the page through a [`ReviewContext`] and returns the
//! issues it found. Scoring is applied by the review service from the
//! configured penalty table, so checkers never compute scores themselves.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::bridge::{BrowserBridge, ConsoleLevel, ConsoleMessage};
use crate::domain::{CategoryKind, Issue, Viewport};
use crate::error::{Result, ReviewError};

pub mod accessibility;
pub mod brand;
pub mod performance;
pub mod responsive;
pub mod user_experience;
pub mod visual_hierarchy;

pub use accessibility::AccessibilityChecker;
pub use brand::{BrandConsistencyChecker, BrandGuidelines};
pub use performance::{PerformanceBudget, PerformanceChecker};
pub use responsive::ResponsiveDesignChecker;
pub use user_experience::UserExperienceChecker;
pub use visual_hierarchy::VisualHierarchyChecker;

/// Page state captured once per review, shared by the checkers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub html: String,
    pub text: String,
    pub console: Vec<ConsoleMessage>,
}

impl PageSnapshot {
    pub fn console_errors(&self) -> impl Iterator<Item = &ConsoleMessage> {
        self.console.iter().filter(|m| m.level == ConsoleLevel::Error)
    }
}

/// Everything a checker may consult for one page.
pub struct ReviewContext<'a> {
    pub url: &'a str,
    pub viewport: Viewport,
    pub browser: &'a dyn BrowserBridge,

    /// The captured snapshot, or the reason capture failed.
    pub snapshot: &'a std::result::Result<PageSnapshot, String>,
}

impl<'a> ReviewContext<'a> {
    pub fn snapshot(&self) -> Result<&'a PageSnapshot> {
        self.snapshot
            .as_ref()
            .map_err(|reason| ReviewError::Capture(format!("page snapshot unavailable: {reason}")))
    }
}

/// Issues plus checker-specific measurements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckOutcome {
    pub issues: Vec<Issue>,
    pub details: serde_json::Value,
}

impl CheckOutcome {
    pub fn new(issues: Vec<Issue>, details: serde_json::Value) -> Self {
        Self { issues, details }
    }
}

/// A category-specific checker.
#[async_trait]
pub trait CategoryChecker: Send + Sync {
    fn kind(&self) -> CategoryKind;

    async fn check(&self, ctx: &ReviewContext<'_>) -> Result<CheckOutcome>;
}

/// Truncate markup for use as an issue's `element`.
pub(crate) fn excerpt(markup: &str) -> String {
    const MAX: usize = 120;
    if markup.chars().count() <= MAX {
        markup.to_string()
    } else {
        let cut: String = markup.chars().take(MAX).collect();
        format!("{cut}…")
    }
}

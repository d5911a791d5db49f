//! Static page configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Processing priority of a page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PagePriority {
    High,
    Medium,
    Low,
}

impl PagePriority {
    /// Sort rank; higher ranks are processed first.
    pub fn rank(&self) -> u8 {
        match self {
            PagePriority::High => 3,
            PagePriority::Medium => 2,
            PagePriority::Low => 1,
        }
    }
}

/// How often a page is re-reviewed by the monitoring scheduler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReviewFrequency {
    Continuous,
    Daily,
    Weekly,
}

impl ReviewFrequency {
    pub const ALL: [ReviewFrequency; 3] = [
        ReviewFrequency::Continuous,
        ReviewFrequency::Daily,
        ReviewFrequency::Weekly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReviewFrequency::Continuous => "continuous",
            ReviewFrequency::Daily => "daily",
            ReviewFrequency::Weekly => "weekly",
        }
    }

    /// Default interval between monitoring cycles.
    pub fn default_interval(&self) -> Duration {
        match self {
            ReviewFrequency::Continuous => Duration::from_secs(4 * 60 * 60),
            ReviewFrequency::Daily => Duration::from_secs(24 * 60 * 60),
            ReviewFrequency::Weekly => Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

/// Browser viewport in CSS pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const MOBILE: Viewport = Viewport::new(375, 667);
    pub const TABLET: Viewport = Viewport::new(768, 1024);
    pub const DESKTOP: Viewport = Viewport::new(1440, 900);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::DESKTOP
    }
}

/// A DOM assertion executed after the design review of a page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomCheck {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// CSS selector whose visible HTML is inspected.
    pub selector: String,

    /// Text that must appear in the selected HTML. When absent the check
    /// only requires the selector to match visible content.
    #[serde(default)]
    pub expected: Option<String>,
}

/// A page under review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageConfig {
    pub name: String,
    pub url: String,
    pub priority: PagePriority,
    pub review_frequency: ReviewFrequency,

    #[serde(default)]
    pub figma_node_id: Option<String>,

    /// Selector of the implemented component compared with the Figma node.
    #[serde(default)]
    pub figma_selector: Option<String>,

    /// Elements that must be present; each becomes a presence check.
    #[serde(default)]
    pub custom_selectors: Vec<String>,

    #[serde(default)]
    pub custom_checks: Vec<CustomCheck>,
}

impl PageConfig {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        priority: PagePriority,
        review_frequency: ReviewFrequency,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            priority,
            review_frequency,
            figma_node_id: None,
            figma_selector: None,
            custom_selectors: Vec::new(),
            custom_checks: Vec::new(),
        }
    }

    pub fn with_figma_node(mut self, node_id: impl Into<String>) -> Self {
        self.figma_node_id = Some(node_id.into());
        self
    }

    pub fn with_custom_check(mut self, check: CustomCheck) -> Self {
        self.custom_checks.push(check);
        self
    }

    pub fn with_custom_selector(mut self, selector: impl Into<String>) -> Self {
        self.custom_selectors.push(selector.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ranks() {
        assert_eq!(PagePriority::High.rank(), 3);
        assert_eq!(PagePriority::Medium.rank(), 2);
        assert_eq!(PagePriority::Low.rank(), 1);
    }

    #[test]
    fn test_frequency_intervals() {
        assert_eq!(
            ReviewFrequency::Continuous.default_interval(),
            Duration::from_secs(14_400)
        );
        assert_eq!(
            ReviewFrequency::Daily.default_interval(),
            Duration::from_secs(86_400)
        );
        assert_eq!(
            ReviewFrequency::Weekly.default_interval(),
            Duration::from_secs(604_800)
        );
    }

    #[test]
    fn test_page_config_minimal_json() {
        let page: PageConfig = serde_json::from_str(
            r#"{"name":"home","url":"https://example.com","priority":"high","review_frequency":"daily"}"#,
        )
        .expect("parse");
        assert_eq!(page.priority, PagePriority::High);
        assert!(page.figma_node_id.is_none());
        assert!(page.custom_checks.is_empty());
    }
}

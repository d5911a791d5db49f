//! Orchestration configuration document.
//!
//! Loaded from JSON. Every section except `pages` has defaults, so a minimal
//! config is just a page list.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use design_review_core::{CategoryKind, PageConfig, ReviewFrequency, ReviewOptions};
use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::notify::NotificationChannel;

pub const DEFAULT_TOLERANCE_THRESHOLD: f64 = 95.0;
pub const DEFAULT_TOKEN_COVERAGE_THRESHOLD: f64 = 0.8;
pub const DEFAULT_NOTIFICATION_TIMEOUT_SECS: u64 = 10;

/// Longest accepted monitoring interval (one year).
pub const MAX_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    pub pages: Vec<PageConfig>,

    #[serde(default)]
    pub review_settings: ReviewSettings,

    #[serde(default)]
    pub figma: FigmaSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub monitoring: MonitoringSettings,
}

impl OrchestrationConfig {
    pub fn new(pages: Vec<PageConfig>) -> Self {
        Self {
            pages,
            review_settings: ReviewSettings::default(),
            figma: FigmaSettings::default(),
            notifications: NotificationSettings::default(),
            monitoring: MonitoringSettings::default(),
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> OrchestratorResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> OrchestratorResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Copy of this config restricted to pages reviewed at the given frequencies.
    pub fn for_frequencies(&self, tiers: &[ReviewFrequency]) -> Self {
        let mut scoped = self.clone();
        scoped.pages.retain(|p| tiers.contains(&p.review_frequency));
        scoped
    }

    pub fn validate(&self) -> OrchestratorResult<()> {
        let mut names = BTreeSet::new();
        for page in &self.pages {
            if page.name.trim().is_empty() {
                return Err(invalid("page name must not be empty"));
            }
            if !names.insert(page.name.as_str()) {
                return Err(invalid(format!("duplicate page name '{}'", page.name)));
            }
            if !(page.url.starts_with("http://") || page.url.starts_with("https://")) {
                return Err(invalid(format!(
                    "page '{}' has a non-http url '{}'",
                    page.name, page.url
                )));
            }
        }

        let tolerance = self.figma.tolerance_threshold;
        if !(0.0..=100.0).contains(&tolerance) {
            return Err(invalid(format!(
                "figma.tolerance_threshold must be within 0..=100, got {tolerance}"
            )));
        }
        let coverage = self.figma.token_coverage_threshold;
        if !(0.0..=1.0).contains(&coverage) {
            return Err(invalid(format!(
                "figma.token_coverage_threshold must be within 0..=1, got {coverage}"
            )));
        }

        if self.notifications.timeout_secs == 0 {
            return Err(invalid("notifications.timeout_secs must be positive"));
        }

        for tier in ReviewFrequency::ALL {
            match self.monitoring.override_secs(tier) {
                Some(0) => {
                    return Err(invalid(format!("monitoring interval for {} is zero", tier.name())));
                }
                Some(secs) if secs > MAX_INTERVAL_SECS => {
                    return Err(invalid(format!(
                        "monitoring interval for {} exceeds {MAX_INTERVAL_SECS}s, got {secs}",
                        tier.name()
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> OrchestratorError {
    OrchestratorError::InvalidConfig(reason.into())
}

/// Review options shared by every page, plus categories to leave out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSettings {
    #[serde(default)]
    pub skip_categories: Vec<CategoryKind>,

    #[serde(flatten)]
    pub options: ReviewOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigmaSettings {
    /// Minimum visual similarity (0-100) for the comparison to pass.
    #[serde(default = "default_tolerance")]
    pub tolerance_threshold: f64,

    /// Minimum share (0-1) of design tokens found in the implementation.
    #[serde(default = "default_coverage")]
    pub token_coverage_threshold: f64,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE_THRESHOLD
}

fn default_coverage() -> f64 {
    DEFAULT_TOKEN_COVERAGE_THRESHOLD
}

impl Default for FigmaSettings {
    fn default() -> Self {
        Self {
            tolerance_threshold: DEFAULT_TOLERANCE_THRESHOLD,
            token_coverage_threshold: DEFAULT_TOKEN_COVERAGE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Only notify when a run does not pass.
    #[serde(default = "default_on_failure")]
    pub on_failure: bool,

    #[serde(default)]
    pub channels: Vec<NotificationChannel>,

    /// Per-request timeout for HTTP deliveries.
    #[serde(default = "default_notification_timeout")]
    pub timeout_secs: u64,
}

fn default_on_failure() -> bool {
    true
}

fn default_notification_timeout() -> u64 {
    DEFAULT_NOTIFICATION_TIMEOUT_SECS
}

impl NotificationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            on_failure: true,
            channels: Vec::new(),
            timeout_secs: DEFAULT_NOTIFICATION_TIMEOUT_SECS,
        }
    }
}

/// Interval overrides, in seconds, per review frequency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringSettings {
    #[serde(default)]
    pub continuous_secs: Option<u64>,

    #[serde(default)]
    pub daily_secs: Option<u64>,

    #[serde(default)]
    pub weekly_secs: Option<u64>,
}

impl MonitoringSettings {
    pub fn override_secs(&self, tier: ReviewFrequency) -> Option<u64> {
        match tier {
            ReviewFrequency::Continuous => self.continuous_secs,
            ReviewFrequency::Daily => self.daily_secs,
            ReviewFrequency::Weekly => self.weekly_secs,
        }
    }

    /// Interval for `tier`, capped at [`MAX_INTERVAL_SECS`].
    pub fn interval(&self, tier: ReviewFrequency) -> Duration {
        self.override_secs(tier)
            .map(|secs| Duration::from_secs(secs.min(MAX_INTERVAL_SECS)))
            .unwrap_or_else(|| tier.default_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use design_review_core::{PagePriority, Viewport};

    const MINIMAL: &str = r#"{
        "pages": [
            {"name": "home", "url": "https://example.com", "priority": "high", "review_frequency": "continuous"}
        ]
    }"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = OrchestrationConfig::from_json_str(MINIMAL).expect("parse");
        assert_eq!(config.pages.len(), 1);
        assert_eq!(config.figma.tolerance_threshold, 95.0);
        assert_eq!(config.figma.token_coverage_threshold, 0.8);
        assert!(config.notifications.on_failure);
        assert_eq!(config.notifications.timeout(), Duration::from_secs(10));
        assert!(config.review_settings.skip_categories.is_empty());
        assert_eq!(config.review_settings.options.viewport, Viewport::DESKTOP);
        assert_eq!(
            config.monitoring.interval(ReviewFrequency::Daily),
            Duration::from_secs(86_400)
        );
    }

    #[test]
    fn test_full_config_sections() {
        let json = r##"{
            "pages": [
                {"name": "pricing", "url": "https://example.com/pricing", "priority": "medium",
                 "review_frequency": "weekly", "figma_node_id": "12:34", "figma_selector": "#plans"}
            ],
            "review_settings": {
                "skip_categories": ["performance"],
                "viewport": {"width": 1280, "height": 800},
                "brand": {"colors": ["#0055FF"], "fonts": ["Inter"]},
                "penalties": {"overrides": {"accessibility": {"critical": 50, "major": 30, "minor": 10}}}
            },
            "figma": {"tolerance_threshold": 90},
            "notifications": {
                "on_failure": false,
                "timeout_secs": 3,
                "channels": [
                    {"type": "slack", "channel": "#design", "webhook_url": "https://hooks.slack.test/x"},
                    {"type": "email", "recipients": ["design@example.com"]}
                ]
            },
            "monitoring": {"continuous_secs": 600}
        }"##;
        let config = OrchestrationConfig::from_json_str(json).expect("parse");
        let settings = &config.review_settings;
        assert_eq!(settings.skip_categories, vec![CategoryKind::Performance]);
        assert_eq!(settings.options.viewport, Viewport::new(1280, 800));
        assert_eq!(settings.options.brand.fonts, vec!["Inter".to_string()]);
        assert_eq!(settings.options.penalties.table(CategoryKind::Accessibility).major, 30);
        assert_eq!(config.figma.tolerance_threshold, 90.0);
        assert_eq!(config.figma.token_coverage_threshold, 0.8);
        assert!(!config.notifications.on_failure);
        assert_eq!(config.notifications.channels.len(), 2);
        assert_eq!(config.notifications.timeout_secs, 3);
        assert_eq!(
            config.monitoring.interval(ReviewFrequency::Continuous),
            Duration::from_secs(600)
        );
        assert_eq!(config.pages[0].priority, PagePriority::Medium);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let page = |name: &str, url: &str| {
            PageConfig::new(name, url, PagePriority::Low, ReviewFrequency::Daily)
        };

        let dup = OrchestrationConfig::new(vec![
            page("home", "https://a.test"),
            page("home", "https://b.test"),
        ]);
        assert!(matches!(dup.validate(), Err(OrchestratorError::InvalidConfig(_))));

        let bad_url = OrchestrationConfig::new(vec![page("home", "ftp://a.test")]);
        assert!(bad_url.validate().is_err());

        let mut bad_tolerance = OrchestrationConfig::new(vec![]);
        bad_tolerance.figma.tolerance_threshold = 120.0;
        assert!(bad_tolerance.validate().is_err());

        let mut zero_interval = OrchestrationConfig::new(vec![]);
        zero_interval.monitoring.weekly_secs = Some(0);
        assert!(zero_interval.validate().is_err());

        let mut zero_timeout = OrchestrationConfig::new(vec![]);
        zero_timeout.notifications.timeout_secs = 0;
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_oversized_interval_rejected_and_capped() {
        let mut config = OrchestrationConfig::new(vec![]);
        config.monitoring.weekly_secs = Some(u64::MAX);
        let err = config.validate().expect_err("too long");
        assert!(err.to_string().contains("weekly"));
        assert_eq!(
            config.monitoring.interval(ReviewFrequency::Weekly),
            Duration::from_secs(MAX_INTERVAL_SECS)
        );

        config.monitoring.weekly_secs = Some(MAX_INTERVAL_SECS);
        config.validate().expect("one year is accepted");
    }

    #[test]
    fn test_for_frequencies() {
        let config = OrchestrationConfig::new(vec![
            PageConfig::new("a", "https://a.test", PagePriority::High, ReviewFrequency::Continuous),
            PageConfig::new("b", "https://b.test", PagePriority::High, ReviewFrequency::Daily),
            PageConfig::new("c", "https://c.test", PagePriority::High, ReviewFrequency::Weekly),
        ]);
        let scoped = config.for_frequencies(&[ReviewFrequency::Continuous, ReviewFrequency::Weekly]);
        let names: Vec<&str> = scoped.pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}

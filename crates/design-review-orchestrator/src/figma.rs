//! Figma-to-implementation validation.
//!
//! Pulls design tokens, component code and a reference render for a node,
//! screenshots the implemented component, then scores visual similarity and
//! design-token usage.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use design_review_core::{
    compare, BrowserBridge, DesignToolBridge, VariableDefs, Viewport, VisualComparison,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{DEFAULT_TOKEN_COVERAGE_THRESHOLD, DEFAULT_TOLERANCE_THRESHOLD};
use crate::error::OrchestratorResult;

/// Name fragments selecting each token bucket, checked in field order.
const COLOR_KEYS: &[&str] = &["color", "fill", "background"];
const TYPOGRAPHY_KEYS: &[&str] = &["font", "text", "typography", "line-height", "letter-spacing"];
const SPACING_KEYS: &[&str] = &["spacing", "gap", "padding", "margin"];
const SHADOW_KEYS: &[&str] = &["shadow", "elevation"];
const RADIUS_KEYS: &[&str] = &["radius", "corner"];
const OPACITY_KEYS: &[&str] = &["opacity", "alpha"];

/// Design variables grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignTokens {
    pub colors: BTreeMap<String, String>,
    pub typography: BTreeMap<String, String>,
    pub spacing: BTreeMap<String, String>,
    pub shadows: BTreeMap<String, String>,
    pub radii: BTreeMap<String, String>,
    pub opacity: BTreeMap<String, String>,

    /// Variables whose name matched no bucket.
    pub other: BTreeMap<String, String>,
}

impl DesignTokens {
    pub fn from_variables(variables: VariableDefs) -> Self {
        let mut tokens = Self::default();
        for (name, value) in variables {
            let lower = name.to_ascii_lowercase();
            let matches = |keys: &[&str]| keys.iter().any(|k| lower.contains(k));
            let bucket = if matches(COLOR_KEYS) {
                &mut tokens.colors
            } else if matches(TYPOGRAPHY_KEYS) {
                &mut tokens.typography
            } else if matches(SPACING_KEYS) {
                &mut tokens.spacing
            } else if matches(SHADOW_KEYS) {
                &mut tokens.shadows
            } else if matches(RADIUS_KEYS) {
                &mut tokens.radii
            } else if matches(OPACITY_KEYS) {
                &mut tokens.opacity
            } else {
                &mut tokens.other
            };
            bucket.insert(name, value);
        }
        tokens
    }

    /// Tokens whose values are checked against the implementation markup.
    pub fn checkable(&self) -> impl Iterator<Item = (&String, &String)> {
        self.colors
            .iter()
            .chain(self.spacing.iter())
            .chain(self.radii.iter())
    }

    pub fn len(&self) -> usize {
        self.colors.len()
            + self.typography.len()
            + self.spacing.len()
            + self.shadows.len()
            + self.radii.len()
            + self.opacity.len()
            + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How many checkable tokens the implementation actually uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenValidation {
    pub checked: usize,
    pub used: usize,

    /// `used / checked`, or 1.0 when nothing was checked.
    pub coverage: f64,

    /// Names of tokens whose value was not found.
    pub missing: Vec<String>,
    pub threshold: f64,
    pub passed: bool,
}

/// Check each color, spacing and radius token value against `html`,
/// case-insensitively. Tokens with a blank value are not checked.
pub fn validate_tokens(tokens: &DesignTokens, html: &str, threshold: f64) -> TokenValidation {
    let haystack = html.to_lowercase();
    let mut checked = 0;
    let mut missing = Vec::new();
    for (name, value) in tokens.checkable().filter(|(_, v)| !v.trim().is_empty()) {
        checked += 1;
        if !haystack.contains(&value.to_lowercase()) {
            missing.push(name.clone());
        }
    }
    let used = checked - missing.len();
    let coverage = if checked == 0 {
        1.0
    } else {
        used as f64 / checked as f64
    };
    TokenValidation {
        checked,
        used,
        coverage,
        missing,
        threshold,
        passed: checked == 0 || coverage >= threshold,
    }
}

/// Input for validating one node against its implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub node_id: String,
    pub url: String,
    pub selector: String,

    #[serde(default)]
    pub viewport: Viewport,

    pub tolerance_threshold: f64,
    pub token_coverage_threshold: f64,
}

impl ValidationConfig {
    pub fn new(node_id: impl Into<String>, url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            url: url.into(),
            selector: selector.into(),
            viewport: Viewport::default(),
            tolerance_threshold: DEFAULT_TOLERANCE_THRESHOLD,
            token_coverage_threshold: DEFAULT_TOKEN_COVERAGE_THRESHOLD,
        }
    }

    pub fn with_thresholds(mut self, tolerance: f64, token_coverage: f64) -> Self {
        self.tolerance_threshold = tolerance;
        self.token_coverage_threshold = token_coverage;
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub node_id: String,
    pub url: String,
    pub selector: String,
    pub tokens: DesignTokens,

    /// Component code generated by the design tool.
    pub component_code: String,
    pub visual: VisualComparison,
    pub token_validation: TokenValidation,

    /// Visual and token checks both passed.
    pub passed: bool,
    pub timestamp: DateTime<Utc>,
}

/// Compares a design node with its implemented component.
pub struct FigmaValidationPipeline {
    design: Arc<dyn DesignToolBridge>,
    browser: Arc<dyn BrowserBridge>,
}

impl FigmaValidationPipeline {
    pub fn new(design: Arc<dyn DesignToolBridge>, browser: Arc<dyn BrowserBridge>) -> Self {
        Self { design, browser }
    }

    /// Run the validation steps in order. The first bridge failure aborts
    /// the validation.
    pub async fn validate_implementation(
        &self,
        config: &ValidationConfig,
    ) -> OrchestratorResult<ValidationResult> {
        let node = config.node_id.as_str();

        let tokens = DesignTokens::from_variables(self.design.variable_defs(node).await?);
        let component_code = self.design.code(node).await?;
        let reference = self.design.image(node).await?;

        self.browser.navigate(&config.url, config.viewport).await?;
        let actual = self.browser.screenshot(Some(&config.selector), false).await?;
        let visual = compare(&reference, &actual, config.tolerance_threshold);

        let html = self.browser.visible_html(Some(&config.selector)).await?;
        let token_validation = validate_tokens(&tokens, &html, config.token_coverage_threshold);

        let passed = visual.passed && token_validation.passed;
        info!(
            node = %node,
            similarity = visual.similarity,
            token_coverage = token_validation.coverage,
            passed = passed,
            "design validation finished"
        );

        Ok(ValidationResult {
            node_id: config.node_id.clone(),
            url: config.url.clone(),
            selector: config.selector.clone(),
            tokens,
            component_code,
            visual,
            token_validation,
            passed,
            timestamp: Utc::now(),
        })
    }
}

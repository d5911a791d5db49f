//! Review categories and their default weights.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six design review categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryKind {
    VisualHierarchy,
    BrandConsistency,
    ResponsiveDesign,
    Accessibility,
    Performance,
    UserExperience,
}

impl CategoryKind {
    /// All categories in default review order.
    pub const ALL: [CategoryKind; 6] = [
        CategoryKind::VisualHierarchy,
        CategoryKind::BrandConsistency,
        CategoryKind::ResponsiveDesign,
        CategoryKind::Accessibility,
        CategoryKind::Performance,
        CategoryKind::UserExperience,
    ];

    /// Get the category name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            CategoryKind::VisualHierarchy => "visual-hierarchy",
            CategoryKind::BrandConsistency => "brand-consistency",
            CategoryKind::ResponsiveDesign => "responsive-design",
            CategoryKind::Accessibility => "accessibility",
            CategoryKind::Performance => "performance",
            CategoryKind::UserExperience => "user-experience",
        }
    }

    /// Weight used when no explicit category list is configured.
    pub fn default_weight(&self) -> f64 {
        match self {
            CategoryKind::VisualHierarchy => 0.25,
            CategoryKind::BrandConsistency => 0.20,
            CategoryKind::ResponsiveDesign => 0.20,
            CategoryKind::Accessibility => 0.15,
            CategoryKind::Performance => 0.10,
            CategoryKind::UserExperience => 0.10,
        }
    }

    /// Parse a category from its kebab-case name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A weighted category participating in a review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewCategory {
    pub kind: CategoryKind,

    /// Relative weight in `0.0..=1.0`; weights need not sum to one.
    pub weight: f64,

    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl ReviewCategory {
    pub fn new(kind: CategoryKind, weight: f64) -> Self {
        Self {
            kind,
            weight,
            enabled: true,
        }
    }

    /// Disable this category.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// The six default categories with their default weights.
pub fn default_categories() -> Vec<ReviewCategory> {
    CategoryKind::ALL
        .into_iter()
        .map(|kind| ReviewCategory::new(kind, kind.default_weight()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_categories_weights() {
        let categories = default_categories();
        assert_eq!(categories.len(), 6);
        assert_eq!(categories[0].kind, CategoryKind::VisualHierarchy);
        assert_eq!(categories[0].weight, 0.25);
        let total: f64 = categories.iter().map(|c| c.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(categories.iter().all(|c| c.enabled));
    }

    #[test]
    fn test_category_name_roundtrip() {
        for kind in CategoryKind::ALL {
            assert_eq!(CategoryKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(CategoryKind::from_name("typography"), None);
    }

    #[test]
    fn test_category_serializes_kebab_case() {
        let json = serde_json::to_string(&CategoryKind::UserExperience).expect("serialize");
        assert_eq!(json, "\"user-experience\"");
    }

    #[test]
    fn test_review_category_enabled_defaults_true() {
        let category: ReviewCategory =
            serde_json::from_str(r#"{"kind":"performance","weight":0.5}"#).expect("parse");
        assert!(category.enabled);
        assert!(!category.disabled().enabled);
    }
}

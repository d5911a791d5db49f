//! Prioritized recommendations derived from category results.

use serde::{Deserialize, Serialize};

use crate::domain::{CategoryKind, CategoryResult, Severity};
use crate::scoring::RECOMMENDATION_THRESHOLD;

/// Recommendation priority. Ordering sorts `High` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

impl RecommendationPriority {
    pub fn name(&self) -> &'static str {
        match self {
            RecommendationPriority::High => "high",
            RecommendationPriority::Medium => "medium",
            RecommendationPriority::Low => "low",
        }
    }
}

impl std::fmt::Display for RecommendationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An actionable improvement for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: CategoryKind,
    pub priority: RecommendationPriority,
    pub description: String,

    /// Suggestions taken from the category's issues, in issue order.
    pub actions: Vec<String>,
}

/// Build one recommendation per underperforming category, sorted
/// high → medium → low. The sort is stable within a priority.
pub fn generate_recommendations(categories: &[CategoryResult]) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = categories
        .iter()
        .filter_map(recommend_for_category)
        .collect();
    recommendations.sort_by_key(|r| r.priority);
    recommendations
}

fn recommend_for_category(result: &CategoryResult) -> Option<Recommendation> {
    if result.score >= RECOMMENDATION_THRESHOLD {
        return None;
    }

    let priority = if result.has_severity(Severity::Critical) {
        RecommendationPriority::High
    } else if result.has_severity(Severity::Major) {
        RecommendationPriority::Medium
    } else {
        RecommendationPriority::Low
    };

    let mut actions: Vec<String> = Vec::new();
    for issue in &result.issues {
        if !actions.contains(&issue.suggestion) {
            actions.push(issue.suggestion.clone());
        }
    }

    Some(Recommendation {
        category: result.category,
        priority,
        description: format!(
            "Improve {} (score {}/100, {} issue(s))",
            result.category,
            result.score,
            result.issues.len()
        ),
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Issue;
    use serde_json::json;

    fn category(kind: CategoryKind, score: u32, severities: &[Severity]) -> CategoryResult {
        let issues = severities
            .iter()
            .map(|s| Issue::new(*s, kind, format!("{} issue", s.name()), format!("fix {}", s.name())))
            .collect();
        CategoryResult::new(kind, kind.default_weight(), score, issues, json!({}))
    }

    #[test]
    fn test_critical_issue_yields_high() {
        let recs = generate_recommendations(&[category(
            CategoryKind::Accessibility,
            50,
            &[Severity::Critical],
        )]);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, RecommendationPriority::High);
    }

    #[test]
    fn test_minor_only_above_threshold_yields_none() {
        let recs = generate_recommendations(&[category(
            CategoryKind::Accessibility,
            85,
            &[Severity::Minor, Severity::Minor, Severity::Minor],
        )]);
        assert!(recs.is_empty());
    }

    #[test]
    fn test_high_score_suppresses_even_critical() {
        let recs = generate_recommendations(&[category(
            CategoryKind::Performance,
            80,
            &[Severity::Critical],
        )]);
        assert!(recs.is_empty());
    }

    #[test]
    fn test_major_yields_medium_and_minor_low() {
        let recs = generate_recommendations(&[
            category(CategoryKind::Performance, 75, &[Severity::Minor]),
            category(CategoryKind::VisualHierarchy, 60, &[Severity::Major, Severity::Minor]),
        ]);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].priority, RecommendationPriority::Medium);
        assert_eq!(recs[0].category, CategoryKind::VisualHierarchy);
        assert_eq!(recs[1].priority, RecommendationPriority::Low);
    }

    #[test]
    fn test_sorted_high_medium_low_stable() {
        let recs = generate_recommendations(&[
            category(CategoryKind::UserExperience, 70, &[Severity::Minor]),
            category(CategoryKind::BrandConsistency, 70, &[Severity::Major]),
            category(CategoryKind::ResponsiveDesign, 0, &[Severity::Critical]),
            category(CategoryKind::Accessibility, 60, &[Severity::Major]),
        ]);
        let order: Vec<CategoryKind> = recs.iter().map(|r| r.category).collect();
        assert_eq!(
            order,
            vec![
                CategoryKind::ResponsiveDesign,
                CategoryKind::BrandConsistency,
                CategoryKind::Accessibility,
                CategoryKind::UserExperience,
            ]
        );
    }

    #[test]
    fn test_actions_deduplicated() {
        let recs = generate_recommendations(&[category(
            CategoryKind::Accessibility,
            40,
            &[Severity::Major, Severity::Major],
        )]);
        assert_eq!(recs[0].actions, vec!["fix major".to_string()]);
    }
}

//! Design Review Core
//!
//! Domain model, weighted scoring, category checkers and the automated
//! design review service, plus the browser and design-tool bridges they run
//! against.

pub mod bridge;
pub mod checks;
pub mod compare;
pub mod domain;
pub mod error;
pub mod fakes;
pub mod html;
pub mod mcp;
pub mod obs;
pub mod recommendation;
pub mod report;
pub mod review;
pub mod scoring;
pub mod telemetry;

pub use bridge::{
    BrowserBridge, ConsoleLevel, ConsoleMessage, DesignToolBridge, ImageHandle,
    PerformanceMetrics, VariableDefs,
};
pub use checks::{BrandGuidelines, CategoryChecker, CheckOutcome, PerformanceBudget, ReviewContext};
pub use compare::{compare, VisualComparison};
pub use domain::{
    default_categories, CategoryKind, CategoryResult, CustomCheck, DesignReviewResult, Issue,
    PageConfig, PagePriority, ReviewCategory, ReviewFrequency, Severity, Viewport,
};
pub use error::{Result, ReviewError};
pub use mcp::{decode_image, BridgeConfig, McpBrowserBridge, McpDesignToolBridge};
pub use recommendation::{Recommendation, RecommendationPriority};
pub use report::{read_json_artifact, render_review_markdown, write_json_artifact};
pub use review::{AutomatedDesignReview, DesignReviewConfig, ReviewOptions};
pub use scoring::{
    overall_score, PenaltyConfig, PenaltyTable, CATEGORY_PASS_THRESHOLD, OVERALL_PASS_THRESHOLD,
};

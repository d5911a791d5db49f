//! Design Review Orchestrator
//!
//! Reviews a prioritized set of pages, validates implemented components
//! against their Figma nodes, reports results to notification channels and
//! re-runs reviews on a monitoring schedule.

pub mod config;
pub mod custom_check;
pub mod error;
pub mod figma;
pub mod monitor;
pub mod notify;
pub mod orchestrator;
pub mod report;

pub use config::{
    FigmaSettings, MonitoringSettings, NotificationSettings, OrchestrationConfig, ReviewSettings,
};
pub use custom_check::{run_custom_checks, selector_checks, CheckResult};
pub use error::{OrchestratorError, OrchestratorResult};
pub use figma::{
    validate_tokens, DesignTokens, FigmaValidationPipeline, TokenValidation, ValidationConfig,
    ValidationResult,
};
pub use monitor::{advance, due_tiers, CycleOutcome, MonitoringScheduler};
pub use notify::{
    EmailSink, Notification, NotificationChannel, NotificationSink, Notifier, SlackSink,
    WebhookSink,
};
pub use orchestrator::{
    classify_status, prioritize, DesignReviewOrchestrator, OrchestrationResult, OverallStatus,
    PageReview, ResultSummary,
};
pub use report::{read_report, write_report};

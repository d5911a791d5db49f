//! Structured lifecycle events for reviews, orchestration runs and the
//! monitoring scheduler.
//!
//! Every event carries an `event` field so log pipelines can filter on it.
//! Verbosity is controlled through `RUST_LOG`; see [`crate::telemetry`].

use tracing::{info, warn};

/// Span tagging everything logged inside an orchestration run with its id.
///
/// Attach it with `tracing::Instrument` so it follows the run across awaits.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("design_review.run", run_id = %run_id)
}

pub fn emit_review_started(page: &str, url: &str) {
    info!(event = "review.started", page = %page, url = %url);
}

pub fn emit_category_scored(page: &str, category: &str, score: u32, issues: usize) {
    info!(
        event = "category.scored",
        page = %page,
        category = %category,
        score = score,
        issues = issues,
    );
}

pub fn emit_review_finished(page: &str, overall_score: u32, passed: bool, duration_ms: u64) {
    info!(
        event = "review.finished",
        page = %page,
        overall_score = overall_score,
        passed = passed,
        duration_ms = duration_ms,
    );
}

pub fn emit_orchestration_started(run_id: &str, pages: usize) {
    info!(event = "orchestration.started", run_id = %run_id, pages = pages);
}

/// Emit event: orchestration run finished with its status and page counts.
pub fn emit_orchestration_finished(
    run_id: &str,
    status: &str,
    passed: usize,
    failed: usize,
    duration_ms: u64,
) {
    info!(
        event = "orchestration.finished",
        run_id = %run_id,
        status = %status,
        passed = passed,
        failed = failed,
        duration_ms = duration_ms,
    );
}

/// Emit event: design validation for a page failed and was skipped.
pub fn emit_figma_skipped(page: &str, error: &dyn std::fmt::Display) {
    warn!(event = "page.figma_skipped", page = %page, error = %error);
}

/// Emit event: a scheduler tick ran (or skipped) the named tiers.
pub fn emit_monitor_cycle(tiers: &str, pages: usize, skipped: bool) {
    info!(event = "monitor.cycle", tiers = %tiers, pages = pages, skipped = skipped);
}

pub fn emit_notification_failed(channel: &str, error: &dyn std::fmt::Display) {
    warn!(event = "notification.failed", channel = %channel, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        let _entered = run_span("run-test").entered();
        emit_review_started("home", "https://example.com");
        emit_monitor_cycle("critical", 0, true);
    }
}

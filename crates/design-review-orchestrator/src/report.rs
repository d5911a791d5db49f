//! Report artifacts for orchestration runs.
//!
//! Layout: `<dir>/<run_id>/report.json` plus `report.digest` (SHA-256 hex).

use std::path::{Path, PathBuf};

use design_review_core::report::{read_json_artifact, write_json_artifact};

use crate::error::OrchestratorResult;
use crate::orchestrator::OrchestrationResult;

const REPORT_NAME: &str = "report";

pub fn write_report(result: &OrchestrationResult, dir: &Path) -> OrchestratorResult<PathBuf> {
    Ok(write_json_artifact(result, dir, &result.run_id, REPORT_NAME)?)
}

/// Read and verify a run's report; a digest mismatch is an error.
pub fn read_report(run_id: &str, dir: &Path) -> OrchestratorResult<OrchestrationResult> {
    Ok(read_json_artifact(dir, run_id, REPORT_NAME)?)
}

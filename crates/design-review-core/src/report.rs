//! Markdown rendering and digest-verified JSON artifacts.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::{DesignReviewResult, Severity};
use crate::error::{Result, ReviewError};

/// Hex-encoded SHA-256 of `bytes`.
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Write `<dir>/<run_id>/<name>.json` and its `<name>.digest`.
pub fn write_json_artifact<T: Serialize>(
    value: &T,
    dir: &Path,
    run_id: &str,
    name: &str,
) -> Result<PathBuf> {
    let run_dir = dir.join(run_id);
    std::fs::create_dir_all(&run_dir)?;

    let path = run_dir.join(format!("{name}.json"));
    let digest_path = run_dir.join(format!("{name}.digest"));
    let json = serde_json::to_vec_pretty(value)?;

    std::fs::write(&path, &json)?;
    std::fs::write(&digest_path, content_digest(&json).as_bytes())?;

    Ok(path)
}

/// Read `<dir>/<run_id>/<name>.json`, verifying it against its digest.
pub fn read_json_artifact<T: DeserializeOwned>(dir: &Path, run_id: &str, name: &str) -> Result<T> {
    let run_dir = dir.join(run_id);
    let json = std::fs::read(run_dir.join(format!("{name}.json")))?;
    let expected = std::fs::read_to_string(run_dir.join(format!("{name}.digest")))?;

    let actual = content_digest(&json);
    if expected.trim() != actual {
        return Err(ReviewError::DigestMismatch {
            expected: expected.trim().to_string(),
            actual,
        });
    }
    Ok(serde_json::from_slice(&json)?)
}

/// Render a single page review as markdown.
pub fn render_review_markdown(result: &DesignReviewResult) -> String {
    let verdict = if result.passed { "PASSED" } else { "FAILED" };
    let mut md = format!(
        "# Design Review: {}\n\n{}\n\n**Overall score:** {}/100 ({})\n",
        result.page_name, result.url, result.overall_score, verdict
    );

    md.push_str("\n## Categories\n\n| Category | Score | Weight | Issues |\n|---|---|---|---|\n");
    for c in &result.categories {
        md.push_str(&format!(
            "| {} | {}{} | {:.2} | {} |\n",
            c.category,
            c.score,
            if c.passed { "" } else { " ✗" },
            c.weight,
            c.issues.len()
        ));
    }

    md.push_str("\n## Issues\n\n");
    let mut any = false;
    for severity in [Severity::Critical, Severity::Major, Severity::Minor] {
        for issue in result
            .categories
            .iter()
            .flat_map(|c| c.issues.iter())
            .filter(|i| i.severity == severity)
        {
            any = true;
            md.push_str(&format!(
                "- **{}** [{}] {}",
                severity.name(),
                issue.category,
                issue.description
            ));
            if let Some(element) = &issue.element {
                md.push_str(&format!(" (`{element}`)"));
            }
            md.push('\n');
        }
    }
    if !any {
        md.push_str("none\n");
    }

    if !result.recommendations.is_empty() {
        md.push_str("\n## Recommendations\n\n");
        for rec in &result.recommendations {
            md.push_str(&format!("- **{}** {}\n", rec.priority, rec.description));
            for action in &rec.actions {
                md.push_str(&format!("  - {action}\n"));
            }
        }
    }

    md
}

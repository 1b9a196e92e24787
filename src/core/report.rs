//! Report artifact.
//!
//! Serializes one run's outcome to a JSON file that later tooling can read
//! back without re-deriving anything: statistics up front, full detail lists
//! below, plus the warnings both scans accumulated.

use crate::core::reconciler::ComparisonResult;
use crate::error::{CheckError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    pub total_local: u64,
    pub total_remote: u64,
    pub in_both_matching: u64,
    pub only_local: u64,
    pub only_remote: u64,
    pub size_mismatch: u64,
}

impl From<&ComparisonResult> for ReportStats {
    fn from(result: &ComparisonResult) -> Self {
        Self {
            total_local: result.total_local,
            total_remote: result.total_remote,
            in_both_matching: result.in_both_matching,
            only_local: result.only_local.len() as u64,
            only_remote: result.only_remote.len() as u64,
            size_mismatch: result.size_mismatch.len() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub generated_at: DateTime<Utc>,
    pub local_root: String,
    pub remote_root: String,
    pub duration_ms: u64,
    pub statistics: ReportStats,
    pub details: ComparisonResult,
    /// Per-file warnings from both scans, prefixed with their side.
    pub warnings: Vec<String>,
}

/// Writes the report as pretty JSON via a temp file and an atomic rename.
pub fn write_report(report: &CheckReport, path: &Path) -> Result<()> {
    let data = serde_json::to_vec_pretty(report)
        .map_err(|e| CheckError::Report(format!("serialize failed: {e}")))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| CheckError::Report(format!("cannot create report dir: {e}")))?;
        }
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)
        .map_err(|e| CheckError::Report(format!("write failed: {e}")))?;
    fs::rename(&tmp_path, path)
        .map_err(|e| CheckError::Report(format!("rename failed: {e}")))?;

    info!(path = %path.display(), "report written");
    Ok(())
}

/// Reads a previously written report back.
pub fn read_report(path: &Path) -> Result<CheckReport> {
    let data =
        fs::read(path).map_err(|e| CheckError::Report(format!("read failed: {e}")))?;
    serde_json::from_slice(&data)
        .map_err(|e| CheckError::Report(format!("parse failed: {e}")))
}

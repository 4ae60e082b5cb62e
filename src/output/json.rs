//! JSON run report
//!
//! Written with `--report <PATH>` so a run can be inspected or archived by
//! other tools.

use crate::app::RunOutcome;
use crate::bulk::BulkReport;
use crate::domain::{PackageRecord, UpgradeResult};
use crate::menu::MenuChoice;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which operation a run performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Targeted,
    Bulk,
    Exit,
}

impl From<MenuChoice> for RunMode {
    fn from(choice: MenuChoice) -> Self {
        match choice {
            MenuChoice::TargetedUpgrade => RunMode::Targeted,
            MenuChoice::BulkUpgrade => RunMode::Bulk,
            MenuChoice::Exit => RunMode::Exit,
        }
    }
}

/// Targeted upgrade section of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetedReport {
    pub attempted: usize,
    pub upgraded: Vec<PackageRecord>,
    pub failed: Vec<PackageRecord>,
    pub results: Vec<UpgradeResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parse_errors: Vec<String>,
}

/// Serializable record of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Version of this tool
    pub version: String,
    /// Operation chosen from the menu, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<RunMode>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub exit_code: u8,
    pub interrupted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targeted: Option<TargetedReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk: Option<BulkReport>,
}

impl RunReport {
    /// Build a report from a finished run
    pub fn from_outcome(
        outcome: &RunOutcome,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let targeted = outcome.targeted.as_ref().map(|run| TargetedReport {
            attempted: run.summary.attempted(),
            upgraded: run.summary.upgraded().cloned().collect(),
            failed: run.summary.failed().cloned().collect(),
            results: run.summary.results.clone(),
            parse_errors: run.listing.errors.iter().map(|e| e.to_string()).collect(),
        });

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            mode: outcome.choice.map(RunMode::from),
            started_at,
            finished_at,
            exit_code: outcome.exit_code,
            interrupted: outcome.interrupted,
            error: outcome.error.clone(),
            targeted,
            bulk: outcome.bulk.clone(),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report to `path`, creating parent directories
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, self.to_json()?)
    }
}

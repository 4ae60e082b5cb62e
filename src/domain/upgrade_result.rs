//! Per-package upgrade outcome types

use super::PackageRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason a package upgrade was classified as failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// pip exited with a non-zero status (`None` when killed by a signal)
    ExitStatus(Option<i32>),
    /// pip could not be started at all
    SpawnFailed(String),
    /// pip exited cleanly but did not report installing the package
    NothingInstalled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ExitStatus(Some(code)) => write!(f, "pip exited with status {}", code),
            FailureReason::ExitStatus(None) => write!(f, "pip was terminated by a signal"),
            FailureReason::SpawnFailed(msg) => write!(f, "failed to start pip: {}", msg),
            FailureReason::NothingInstalled => write!(f, "pip reported no installation"),
        }
    }
}

/// Outcome of one `pip install --upgrade` attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpgradeOutcome {
    /// The package was reinstalled at a new version
    Upgraded {
        /// Version pip reported installing, when it could be parsed
        #[serde(skip_serializing_if = "Option::is_none")]
        installed_version: Option<String>,
    },
    /// The upgrade did not happen
    Failed {
        /// Why the attempt is considered failed
        reason: FailureReason,
    },
}

impl UpgradeOutcome {
    /// Returns true for an upgraded outcome
    pub fn is_upgraded(&self) -> bool {
        matches!(self, UpgradeOutcome::Upgraded { .. })
    }

    /// Short status label used in tables and logs
    pub fn label(&self) -> &'static str {
        match self {
            UpgradeOutcome::Upgraded { .. } => "UPGRADED",
            UpgradeOutcome::Failed { .. } => "FAILED",
        }
    }
}

/// A package paired with the outcome of its upgrade attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeResult {
    /// The package that was attempted
    pub record: PackageRecord,
    /// What happened
    pub outcome: UpgradeOutcome,
}

impl UpgradeResult {
    /// Creates an upgraded result
    pub fn upgraded(record: PackageRecord, installed_version: Option<String>) -> Self {
        Self {
            record,
            outcome: UpgradeOutcome::Upgraded { installed_version },
        }
    }

    /// Creates a failed result
    pub fn failed(record: PackageRecord, reason: FailureReason) -> Self {
        Self {
            record,
            outcome: UpgradeOutcome::Failed { reason },
        }
    }

    /// Returns true if the package was upgraded
    pub fn is_upgraded(&self) -> bool {
        self.outcome.is_upgraded()
    }

    /// Returns true if the upgrade failed
    pub fn is_failed(&self) -> bool {
        !self.is_upgraded()
    }
}

//! Core domain models
//!
//! - Outdated package records parsed from pip output
//! - Per-package upgrade outcomes
//! - Run summary

mod package;
mod summary;
mod upgrade_result;

pub use package::{normalize_name, PackageRecord};
pub use summary::UpgradeSummary;
pub use upgrade_result::{FailureReason, UpgradeOutcome, UpgradeResult};

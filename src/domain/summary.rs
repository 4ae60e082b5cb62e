//! Upgrade run summary

use super::{PackageRecord, UpgradeResult};
use serde::{Deserialize, Serialize};

/// Aggregated results of a per-package upgrade run
///
/// Results are kept in the order the packages were attempted, so
/// `attempted() == upgraded_count() + failed_count()` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeSummary {
    /// Individual results in attempt order
    pub results: Vec<UpgradeResult>,
}

impl UpgradeSummary {
    /// Creates an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one attempt
    pub fn add_result(&mut self, result: UpgradeResult) {
        self.results.push(result);
    }

    /// Number of packages an upgrade was attempted for
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    /// Packages that were upgraded
    pub fn upgraded(&self) -> impl Iterator<Item = &PackageRecord> {
        self.results
            .iter()
            .filter(|r| r.is_upgraded())
            .map(|r| &r.record)
    }

    /// Packages whose upgrade failed
    pub fn failed(&self) -> impl Iterator<Item = &PackageRecord> {
        self.results
            .iter()
            .filter(|r| r.is_failed())
            .map(|r| &r.record)
    }

    /// Returns the number of upgraded packages
    pub fn upgraded_count(&self) -> usize {
        self.upgraded().count()
    }

    /// Returns the number of failed packages
    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureReason;

    fn record(name: &str) -> PackageRecord {
        PackageRecord::new(name, "1.0.0", "2.0.0", "wheel")
    }

    #[test]
    fn test_summary_empty() {
        let summary = UpgradeSummary::new();
        assert_eq!(summary.attempted(), 0);
        assert_eq!(summary.upgraded_count(), 0);
        assert_eq!(summary.failed_count(), 0);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = UpgradeSummary::new();
        summary.add_result(UpgradeResult::upgraded(record("a"), None));
        summary.add_result(UpgradeResult::failed(
            record("b"),
            FailureReason::ExitStatus(Some(1)),
        ));
        summary.add_result(UpgradeResult::upgraded(record("c"), Some("2.0.0".into())));

        assert_eq!(summary.attempted(), 3);
        assert_eq!(summary.upgraded_count(), 2);
        assert_eq!(summary.failed_count(), 1);

        let upgraded: Vec<_> = summary.upgraded().map(|r| r.name.as_str()).collect();
        assert_eq!(upgraded, vec!["a", "c"]);
        let failed: Vec<_> = summary.failed().map(|r| r.name.as_str()).collect();
        assert_eq!(failed, vec!["b"]);
    }
}

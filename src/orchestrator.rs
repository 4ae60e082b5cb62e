//! Upgrade orchestrator for the targeted (per-package) workflow
//!
//! This module provides:
//! - The steps of the targeted workflow: list outdated → upgrade each → summarize
//! - Classification of each `pip install --upgrade` attempt
//! - Error handling with partial continuation (one failed package never
//!   stops the others)
//! - Interrupt handling that kills the running child and stops the loop

use crate::domain::{FailureReason, PackageRecord, UpgradeOutcome, UpgradeResult, UpgradeSummary};
use crate::error::{FetchError, UpgradeError};
use crate::interrupt::Interrupt;
use crate::logging::LogContext;
use crate::output::TextFormatter;
use crate::package_manager::{CommandOutput, PackageManager};
use crate::parser::{installed_version, parse_outdated, OutdatedListing};
use crate::progress::{Phase, Progress};

/// Label used for errors raised before pip reports its own command line
const LIST_COMMAND: &str = "pip list --outdated";

/// Result of a targeted upgrade run
#[derive(Debug, Clone, Default)]
pub struct TargetedRun {
    /// What the listing step produced
    pub listing: OutdatedListing,
    /// Per-package results (empty when nothing was outdated)
    pub summary: UpgradeSummary,
}

/// Orchestrator for the list-then-upgrade workflow
pub struct Orchestrator<P: PackageManager> {
    package_manager: P,
    log: LogContext,
    interrupt: Interrupt,
    progress: Progress,
    formatter: TextFormatter,
}

impl<P: PackageManager> Orchestrator<P> {
    /// Create a new orchestrator
    pub fn new(package_manager: P, log: LogContext, interrupt: Interrupt) -> Self {
        Self {
            package_manager,
            log,
            interrupt,
            progress: Progress::disabled(),
            formatter: TextFormatter::new(),
        }
    }

    /// Enable or disable progress display
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = Progress::new(enabled);
        self
    }

    /// Run `pip list --outdated` and parse its output
    ///
    /// Returns the raw error when pip cannot be run or exits non-zero.
    pub async fn fetch_outdated(&self) -> Result<OutdatedListing, FetchError> {
        let output = self
            .package_manager
            .list_outdated()
            .await
            .map_err(|e| FetchError::spawn(LIST_COMMAND, e))?;

        if !output.success() {
            return Err(FetchError::exit_status(
                output.command.clone(),
                output.code,
                output.combined(),
            ));
        }

        Ok(parse_outdated(&output.combined()))
    }

    /// Fetch the outdated listing, logging any problems
    ///
    /// A fetch error is logged and yields an empty listing. Unparseable rows
    /// are logged as warnings and kept in [`OutdatedListing::errors`].
    pub async fn list_outdated(&mut self) -> Result<OutdatedListing, UpgradeError> {
        self.log
            .upgrade()
            .info("Retrieving outdated global pip packages...");
        self.progress.begin(Phase::Listing);

        let fetched = tokio::select! {
            biased;
            _ = self.interrupt.triggered() => None,
            fetched = self.fetch_outdated() => Some(fetched),
        };
        self.progress.clear();

        let Some(fetched) = fetched else {
            self.log.main().warn(
                "Keyboard interrupt was triggered by user while retrieving outdated packages...",
            );
            return Err(UpgradeError::ListingInterrupted);
        };

        let listing = match fetched {
            Ok(listing) => listing,
            Err(e) => {
                self.log.main().error(format!(
                    "An error occurred while retrieving outdated packages: {}",
                    e
                ));
                if let FetchError::ExitStatus { output, .. } = &e {
                    for line in output.lines() {
                        self.log.file().error(line);
                    }
                }
                OutdatedListing::empty()
            }
        };

        for line in self.formatter.parse_error_lines(&listing) {
            self.log.main().warn(line);
        }
        self.log
            .upgrade()
            .info(format!("Outdated packages detected = {}.", listing.len()));

        Ok(listing)
    }

    /// Upgrade each package in order, one child process at a time
    ///
    /// Failures are recorded and the loop moves on; only an interrupt ends it
    /// early.
    pub async fn upgrade_outdated(
        &mut self,
        records: &[PackageRecord],
    ) -> Result<UpgradeSummary, UpgradeError> {
        let total = records.len();
        let mut summary = UpgradeSummary::new();

        self.log.upgrade().info("Upgrading outdated pip packages...");
        for line in self.formatter.table_header() {
            self.log.upgrade().info(line);
        }
        self.progress.begin(Phase::Upgrading {
            total: total as u64,
        });

        for (index, record) in records.iter().enumerate() {
            self.progress.package(&record.name);

            let attempt = tokio::select! {
                biased;
                _ = self.interrupt.triggered() => None,
                attempt = self.package_manager.install_upgrade(&record.name) => Some(attempt),
            };

            let Some(attempt) = attempt else {
                self.progress.clear();
                self.log.main().warn(format!(
                    "Keyboard interrupt was triggered by user while upgrading '{}'...",
                    record.name
                ));
                return Err(UpgradeError::Interrupted {
                    completed: summary.attempted(),
                    total,
                });
            };

            let result = classify(record.clone(), &attempt);
            self.log_result(index + 1, &result, &attempt);
            summary.add_result(result);
            self.progress.advance();
        }

        self.progress.clear();
        Ok(summary)
    }

    /// Log the end-of-run summary
    pub fn report_summary(&self, summary: &UpgradeSummary) {
        self.log
            .upgrade()
            .info("Successfully completed upgrade process!");
        for line in self.formatter.summary_lines(summary) {
            self.log.upgrade().info(line);
        }
    }

    fn log_result(
        &self,
        number: usize,
        result: &UpgradeResult,
        attempt: &std::io::Result<CommandOutput>,
    ) {
        self.progress.suspend(|| {
            self.log.upgrade().info(self.formatter.row(number, result));

            if let UpgradeOutcome::Failed { reason } = &result.outcome {
                self.log.file().error(format!(
                    "Upgrade of '{}' failed: {}",
                    result.record.name, reason
                ));
                if let Ok(output) = attempt {
                    for line in output.combined().lines() {
                        self.log.file().error(line);
                    }
                }
            }
        });
    }
}

/// Classify one upgrade attempt
///
/// - the child could not be started → failed
/// - non-zero exit → failed
/// - zero exit and pip reports installing this package → upgraded
/// - zero exit without such a report → failed, nothing changed
pub fn classify(record: PackageRecord, attempt: &std::io::Result<CommandOutput>) -> UpgradeResult {
    match attempt {
        Err(e) => UpgradeResult::failed(record, FailureReason::SpawnFailed(e.to_string())),
        Ok(output) if !output.success() => {
            UpgradeResult::failed(record, FailureReason::ExitStatus(output.code))
        }
        Ok(output) => match installed_version(&output.combined(), &record.name) {
            Some(version) => UpgradeResult::upgraded(record, Some(version)),
            None => UpgradeResult::failed(record, FailureReason::NothingInstalled),
        },
    }
}

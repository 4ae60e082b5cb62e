//! Text output for upgrade tables and summaries
//!
//! Produces the lines written to the `upgrade` log channel:
//! - a fixed-width table of per-package results
//! - the end-of-run summary with error and upgrade counts

use crate::domain::{UpgradeResult, UpgradeSummary};
use crate::parser::OutdatedListing;

/// Semantic version change type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChangeType {
    /// Major version change (breaking)
    Major,
    /// Minor version change (features)
    Minor,
    /// Patch version change (fixes)
    Patch,
    /// Unknown or unparseable
    Unknown,
}

impl VersionChangeType {
    /// Determine the change type between two versions
    ///
    /// Only the leading numeric release segments are compared, so PEP 440
    /// suffixes such as `rc1` or `.post2` do not get in the way.
    pub fn from_versions(old: &str, new: &str) -> Self {
        let parse = |v: &str| -> Option<(u64, u64)> {
            let v = v.strip_prefix('v').unwrap_or(v);
            let mut parts = v.split('.').map(leading_number);
            let major = parts.next()??;
            let minor = parts.next().flatten().unwrap_or(0);
            Some((major, minor))
        };

        match (parse(old), parse(new)) {
            (Some((old_major, old_minor)), Some((new_major, new_minor))) => {
                if new_major != old_major {
                    VersionChangeType::Major
                } else if new_minor != old_minor {
                    VersionChangeType::Minor
                } else {
                    VersionChangeType::Patch
                }
            }
            _ => VersionChangeType::Unknown,
        }
    }

    /// Get the plain label
    pub fn label(&self) -> &'static str {
        match self {
            VersionChangeType::Major => "major",
            VersionChangeType::Minor => "minor",
            VersionChangeType::Patch => "patch",
            VersionChangeType::Unknown => "?",
        }
    }
}

fn leading_number(segment: &str) -> Option<u64> {
    let digits: String = segment.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Formatter for upgrade tables and summaries
///
/// Lines go to both the console and the log file, so they carry no color
/// codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter;

impl TextFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Column headings and underline for the result table
    pub fn table_header(&self) -> [String; 2] {
        [
            format!(
                "{:<4}{:<19}{:<18}{:<17}{:<6}{:<7}{:<8}",
                "No.", "Package", "Version", "Latest", "Type", "Change", "Status"
            ),
            format!(
                "{:<4}{:<19}{:<18}{:<17}{:<6}{:<7}{:<8}",
                "===", "==================", "=================", "================", "=====",
                "======", "========"
            ),
        ]
    }

    /// One table row for an attempted package
    pub fn row(&self, number: usize, result: &UpgradeResult) -> String {
        let record = &result.record;
        let change =
            VersionChangeType::from_versions(&record.current_version, &record.latest_version);

        format!(
            "{:<4}{:<19}{:<18}{:<17}{:<6}{:<7}{}",
            number,
            record.name,
            record.current_version,
            record.latest_version,
            record.kind,
            change.label(),
            result.outcome.label()
        )
    }

    /// Summary lines for a finished run
    pub fn summary_lines(&self, summary: &UpgradeSummary) -> Vec<String> {
        let total = summary.attempted();
        let mut lines = vec![
            "SUMMARY:".to_string(),
            format!(
                "No. of upgrade errors    = {}/{}",
                summary.failed_count(),
                total
            ),
            format!(
                "No. of packages upgraded = {}/{}",
                summary.upgraded_count(),
                total
            ),
        ];

        let failed: Vec<&str> = summary.failed().map(|r| r.name.as_str()).collect();
        if !failed.is_empty() {
            lines.push(format!("Failed packages: {}", failed.join(", ")));
        }

        lines
    }

    /// Lines describing rows of the listing that could not be parsed
    pub fn parse_error_lines(&self, listing: &OutdatedListing) -> Vec<String> {
        listing
            .errors
            .iter()
            .map(|e| format!("Could not parse pip output, {}", e))
            .collect()
    }
}

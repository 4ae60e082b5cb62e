//! `pip list --outdated` output parser
//!
//! pip prints a two-line header followed by one row per package:
//!
//! ```text
//! Package    Version Latest Type
//! ---------- ------- ------ -----
//! requests   2.28.0  2.31.0 wheel
//! ```
//!
//! Rows are split on whitespace and must have exactly four fields.

use crate::domain::PackageRecord;
use crate::error::ParseError;

/// Number of header lines pip prints before the first row
pub const HEADER_LINES: usize = 2;

/// Result of parsing a listing
///
/// Rows that parsed cleanly end up in `records`; rows that did not are kept
/// in `errors` so the caller can report them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutdatedListing {
    /// Successfully parsed package rows, in output order
    pub records: Vec<PackageRecord>,
    /// Rows that did not split into four fields
    pub errors: Vec<ParseError>,
}

impl OutdatedListing {
    /// Creates an empty listing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if no packages were parsed
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the number of parsed packages
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Parse a single package row
///
/// `line_number` is only used for error reporting.
pub fn parse_record(line: &str, line_number: usize) -> Result<PackageRecord, ParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        [name, current, latest, kind] => Ok(PackageRecord::new(*name, *current, *latest, *kind)),
        _ => Err(ParseError::new(line_number, line, fields.len())),
    }
}

/// Parse the full output of `pip list --outdated`
///
/// The first [`HEADER_LINES`] lines are discarded and blank lines are ignored.
pub fn parse_outdated(output: &str) -> OutdatedListing {
    let mut listing = OutdatedListing::empty();

    for (index, line) in output.lines().enumerate().skip(HEADER_LINES) {
        if line.trim().is_empty() {
            continue;
        }
        match parse_record(line, index + 1) {
            Ok(record) => listing.records.push(record),
            Err(e) => listing.errors.push(e),
        }
    }

    listing
}

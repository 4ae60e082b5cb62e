//! Outdated package records

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single row of `pip list --outdated`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Distribution name as printed by pip
    pub name: String,
    /// Installed version
    pub current_version: String,
    /// Latest version available on the index
    pub latest_version: String,
    /// Distribution kind (e.g. `wheel`, `sdist`)
    pub kind: String,
}

impl PackageRecord {
    /// Creates a new PackageRecord
    pub fn new(
        name: impl Into<String>,
        current_version: impl Into<String>,
        latest_version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            current_version: current_version.into(),
            latest_version: latest_version.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} ({})",
            self.name, self.current_version, self.latest_version, self.kind
        )
    }
}

/// Normalises a distribution name per PEP 503
///
/// Runs of `-`, `_` and `.` collapse to a single `-`, and the result is
/// lowercased. pip prints names in their canonical form in some messages
/// and as published in others, so comparisons go through this.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !last_was_sep {
                out.push('-');
            }
            last_was_sep = true;
        } else {
            out.extend(c.to_lowercase());
            last_was_sep = false;
        }
    }
    out
}

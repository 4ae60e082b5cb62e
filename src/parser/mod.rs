//! Parsers for pip command output
//!
//! - `pip list --outdated` tables into package records
//! - `pip install` output into the set of installed distributions

mod install;
mod outdated;

pub use install::{
    installed_version, is_success_line, parse_installed, InstalledPackage, SUCCESS_MARKER,
};
pub use outdated::{parse_outdated, parse_record, OutdatedListing, HEADER_LINES};

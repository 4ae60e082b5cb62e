//! Output formatting
//!
//! This module provides:
//! - Text lines for upgrade tables and summaries
//! - JSON run reports for machine processing

mod json;
mod text;

pub use json::{RunMode, RunReport, TargetedReport};
pub use text::{TextFormatter, VersionChangeType};

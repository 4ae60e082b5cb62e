//! upgrade-pip-pkgs - interactive pip upgrade library
//!
//! This library provides the pieces behind the CLI:
//! - Listing outdated packages through `python -m pip list --outdated`
//! - Upgrading them one at a time and classifying each attempt
//! - Running a bulk upgrade script and streaming its output into the log
//! - The numbered menu that ties both modes together

pub mod app;
pub mod bulk;
pub mod cli;
pub mod domain;
pub mod error;
pub mod interrupt;
pub mod logging;
pub mod menu;
pub mod orchestrator;
pub mod output;
pub mod package_manager;
pub mod parser;
pub mod progress;

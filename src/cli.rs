//! CLI argument parsing and run configuration
//!
//! The program is driven by its interactive menu; these flags only tune how
//! it runs. Each can also be set from the environment.

use crate::bulk::{default_script, BulkCommand};
use crate::package_manager::default_python;
use clap::Parser;
use std::path::PathBuf;

/// Default location of the log file, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "logs/pkg_upgrade_log.log";

/// Upgrade outdated global pip packages
#[derive(Parser, Debug, Clone)]
#[command(
    name = "upgrade-pip-pkgs",
    version,
    about = "Interactively list and upgrade outdated pip packages"
)]
pub struct CliArgs {
    /// Python interpreter used to run pip (default: python3, or python on Windows)
    #[arg(long, env = "UPGRADE_PIP_PYTHON")]
    pub python: Option<PathBuf>,

    /// Log file path
    #[arg(long, env = "UPGRADE_PIP_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Script run by the bulk upgrade option
    #[arg(long, env = "UPGRADE_PIP_BULK_SCRIPT")]
    pub bulk_script: Option<PathBuf>,

    /// Write a JSON report of the run to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Exit right after an upgrade instead of waiting for Enter
    #[arg(long)]
    pub no_pause: bool,

    /// Hide progress bars
    #[arg(short, long)]
    pub quiet: bool,
}

/// Resolved settings for one run
#[derive(Debug, Clone)]
pub struct Config {
    /// Interpreter used as `<python> -m pip`
    pub python: PathBuf,
    /// Log file path
    pub log_file: PathBuf,
    /// Command launched for the bulk upgrade
    pub bulk_command: BulkCommand,
    /// Optional JSON report destination
    pub report: Option<PathBuf>,
    /// Wait for Enter after an upgrade
    pub pause: bool,
    /// Draw progress bars
    pub show_progress: bool,
}

impl CliArgs {
    /// Resolve defaults into a [`Config`]
    pub fn into_config(self) -> Config {
        let python = self
            .python
            .unwrap_or_else(|| PathBuf::from(default_python()));
        let script = self
            .bulk_script
            .unwrap_or_else(|| PathBuf::from(default_script()));
        let bulk_command = BulkCommand::for_script(&script, &python);

        Config {
            python,
            log_file: self.log_file,
            bulk_command,
            report: self.report,
            pause: !self.no_pause,
            show_progress: !self.quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["upgrade-pip-pkgs"]);
        assert_eq!(args.log_file, PathBuf::from(DEFAULT_LOG_FILE));
        assert!(args.report.is_none());
        assert!(!args.no_pause);
        assert!(!args.quiet);
    }

    #[test]
    fn test_python_flag() {
        let args = CliArgs::parse_from(["upgrade-pip-pkgs", "--python", "/usr/bin/python3.12"]);
        assert_eq!(args.python, Some(PathBuf::from("/usr/bin/python3.12")));
    }

    #[test]
    fn test_quiet_flags() {
        let args = CliArgs::parse_from(["upgrade-pip-pkgs", "-q"]);
        assert!(args.quiet);

        let args = CliArgs::parse_from(["upgrade-pip-pkgs", "--quiet"]);
        assert!(args.quiet);
    }

    #[test]
    fn test_subcommands_rejected() {
        assert!(CliArgs::try_parse_from(["upgrade-pip-pkgs", "upgrade"]).is_err());
    }

    #[test]
    fn test_into_config_defaults() {
        let config = CliArgs::parse_from(["upgrade-pip-pkgs", "--python", "py"]).into_config();
        assert_eq!(config.python, PathBuf::from("py"));
        assert!(config.pause);
        assert!(config.show_progress);
        assert!(config
            .bulk_command
            .args
            .iter()
            .any(|a| a.ends_with(default_script())));
        assert_eq!(config.bulk_command.args.last().map(String::as_str), Some("py"));
    }

    #[test]
    fn test_into_config_overrides() {
        let config = CliArgs::parse_from([
            "upgrade-pip-pkgs",
            "--bulk-script",
            "/opt/up.sh",
            "--log-file",
            "/tmp/up.log",
            "--report",
            "/tmp/report.json",
            "--no-pause",
            "-q",
        ])
        .into_config();
        assert_eq!(config.log_file, PathBuf::from("/tmp/up.log"));
        assert_eq!(config.report, Some(PathBuf::from("/tmp/report.json")));
        assert!(!config.pause);
        assert!(!config.show_progress);
        assert!(config.bulk_command.args.contains(&"/opt/up.sh".to_string()));
    }
}

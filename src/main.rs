//! upgrade-pip-pkgs - interactive pip upgrade CLI tool
//!
//! Lists outdated pip packages and upgrades them one at a time, or runs a
//! bulk upgrade script, logging everything to the console and a log file.

use chrono::Utc;
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use upgrade_pip_pkgs::app::App;
use upgrade_pip_pkgs::cli::{CliArgs, Config};
use upgrade_pip_pkgs::interrupt::Interrupt;
use upgrade_pip_pkgs::logging::{self, LogContext};
use upgrade_pip_pkgs::menu::InputLines;
use upgrade_pip_pkgs::output::RunReport;
use upgrade_pip_pkgs::package_manager::Pip;

#[tokio::main]
async fn main() -> ExitCode {
    let config = CliArgs::parse().into_config();

    // Flushes the file log when dropped
    let _guard = match logging::init(&config.log_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            tracing::error!(target: "main", "{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(config: Config) -> anyhow::Result<ExitCode> {
    let log = LogContext::tracing();
    let interrupt = Interrupt::from_ctrl_c();
    let started_at = Utc::now();

    log.main()
        .info(format!("Welcome to upgrade-pip-pkgs {}!", env!("CARGO_PKG_VERSION")));
    log.file().debug(format!(
        "Using {} and log file {}",
        config.python.display(),
        config.log_file.display()
    ));

    let mut app = App::from_config(
        Pip::new(config.python.clone()),
        &config,
        InputLines::from_stdin(),
        log,
        interrupt,
    );

    let mut stdout = io::stdout();
    let outcome = app.run(&mut stdout).await;
    stdout.flush()?;

    if let Some(path) = &config.report {
        RunReport::from_outcome(&outcome, started_at, Utc::now()).write_to(path)?;
    }

    Ok(ExitCode::from(outcome.exit_code))
}

//! Menu-driven application flow
//!
//! ```text
//! Idle → AwaitingChoice → Listing → PerPackageUpgrade → Summary → Exit
//!                       → BulkUpgrade                          → Exit
//!                       → Exit
//! ```
//!
//! Every path ends in `Exit` with a process status: 0 on success, 1 on
//! failure or interrupt.

use crate::bulk::{BulkReport, BulkRunner};
use crate::cli::Config;
use crate::error::AppError;
use crate::interrupt::Interrupt;
use crate::logging::LogContext;
use crate::menu::{InputLines, Menu, MenuChoice, Prompted};
use crate::orchestrator::{Orchestrator, TargetedRun};
use crate::package_manager::PackageManager;
use std::io::Write;

/// Process status for a successful run
pub const EXIT_SUCCESS: u8 = 0;
/// Process status for a failed or interrupted run
pub const EXIT_FAILURE: u8 = 1;

/// Written to the log file after the last line of every run
pub const RUN_BORDER: &str = "================================================================================";

/// States of the application flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    AwaitingChoice,
    Listing,
    PerPackageUpgrade,
    Summary,
    BulkUpgrade,
    Exit(u8),
}

/// Everything a finished run produced
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Process exit status
    pub exit_code: u8,
    /// The option the user picked, if any
    pub choice: Option<MenuChoice>,
    /// Results of the targeted upgrade
    pub targeted: Option<TargetedRun>,
    /// Results of the bulk upgrade
    pub bulk: Option<BulkReport>,
    /// Error that ended the run, if any
    pub error: Option<String>,
    /// Whether the run was cut short by Ctrl-C
    pub interrupted: bool,
}

/// The interactive application
pub struct App<P: PackageManager> {
    orchestrator: Orchestrator<P>,
    bulk: BulkRunner,
    menu: Menu,
    input: InputLines,
    log: LogContext,
    interrupt: Interrupt,
    pause: bool,
    states: Vec<State>,
}

impl<P: PackageManager> App<P> {
    /// Create an application from its parts
    pub fn new(
        orchestrator: Orchestrator<P>,
        bulk: BulkRunner,
        input: InputLines,
        log: LogContext,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            orchestrator,
            bulk,
            menu: Menu::new(log.clone()),
            input,
            log,
            interrupt,
            pause: false,
            states: vec![State::Idle],
        }
    }

    /// Create an application configured from CLI settings
    pub fn from_config(
        package_manager: P,
        config: &Config,
        input: InputLines,
        log: LogContext,
        interrupt: Interrupt,
    ) -> Self {
        let orchestrator = Orchestrator::new(package_manager, log.clone(), interrupt.clone())
            .with_progress(config.show_progress);
        let bulk = BulkRunner::new(config.bulk_command.clone(), log.clone(), interrupt.clone())
            .with_progress(config.show_progress);
        Self::new(orchestrator, bulk, input, log, interrupt).with_pause(config.pause)
    }

    /// Wait for Enter after an upgrade before exiting
    pub fn with_pause(mut self, pause: bool) -> Self {
        self.pause = pause;
        self
    }

    /// States visited so far, in order
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Run the menu and the chosen operation to completion
    pub async fn run(&mut self, out: &mut dyn Write) -> RunOutcome {
        let mut outcome = RunOutcome::default();
        self.enter(State::AwaitingChoice);

        let choice = match self.menu.choose(&mut self.input, &self.interrupt, out).await {
            Ok(Prompted::Answer(choice)) => choice,
            Ok(Prompted::Closed) => {
                self.log
                    .main()
                    .warn("Input closed before an option was chosen.");
                return self.finish(outcome, EXIT_FAILURE);
            }
            Ok(Prompted::Interrupted) => {
                self.log
                    .main()
                    .warn("Keyboard interrupt was triggered by user during menu process...");
                outcome.interrupted = true;
                return self.finish(outcome, EXIT_FAILURE);
            }
            Err(e) => {
                self.log
                    .main()
                    .error(format!("Failed to write the menu: {}", e));
                outcome.error = Some(e.to_string());
                return self.finish(outcome, EXIT_FAILURE);
            }
        };
        outcome.choice = Some(choice);

        let result = match choice {
            MenuChoice::TargetedUpgrade => self.targeted_upgrade(&mut outcome).await,
            MenuChoice::BulkUpgrade => self.bulk_upgrade(&mut outcome).await,
            MenuChoice::Exit => Ok(()),
        };

        if let Err(e) = result {
            outcome.interrupted = e.is_interrupt();
            outcome.error = Some(e.to_string());
            return self.finish(outcome, EXIT_FAILURE);
        }

        if choice != MenuChoice::Exit && self.pause && !self.wait_for_enter(out).await {
            outcome.interrupted = true;
            return self.finish(outcome, EXIT_FAILURE);
        }

        self.finish(outcome, EXIT_SUCCESS)
    }

    async fn targeted_upgrade(&mut self, outcome: &mut RunOutcome) -> Result<(), AppError> {
        self.enter(State::Listing);
        let listing = self.orchestrator.list_outdated().await?;

        if listing.is_empty() {
            self.log.main().info("No outdated packages found!");
            outcome.targeted = Some(TargetedRun {
                listing,
                ..Default::default()
            });
            return Ok(());
        }

        self.enter(State::PerPackageUpgrade);
        let summary = self.orchestrator.upgrade_outdated(&listing.records).await?;

        self.enter(State::Summary);
        self.orchestrator.report_summary(&summary);
        outcome.targeted = Some(TargetedRun { listing, summary });
        Ok(())
    }

    async fn bulk_upgrade(&mut self, outcome: &mut RunOutcome) -> Result<(), AppError> {
        self.enter(State::BulkUpgrade);
        let report = self.bulk.run().await?;
        outcome.bulk = Some(report);
        Ok(())
    }

    /// Returns false if interrupted while waiting
    async fn wait_for_enter(&mut self, out: &mut dyn Write) -> bool {
        let _ = write!(out, "\nPress Enter to exit...").and_then(|_| out.flush());
        match self.input.next_line(&self.interrupt).await {
            Prompted::Interrupted => {
                self.log
                    .main()
                    .warn("Keyboard interrupt was triggered by user before exit...");
                false
            }
            Prompted::Answer(_) | Prompted::Closed => {
                let _ = writeln!(out);
                true
            }
        }
    }

    fn enter(&mut self, state: State) {
        self.log.file().debug(format!("Entering state {:?}", state));
        self.states.push(state);
    }

    /// Enter `Exit` and close this run's section of the log file
    fn finish(&mut self, mut outcome: RunOutcome, exit_code: u8) -> RunOutcome {
        self.log.file().debug("Preparing to exit...");
        self.enter(State::Exit(exit_code));
        self.log
            .main()
            .info(format!("Exiting with status {}.", exit_code));
        self.log.file().debug("Closing log file...");
        self.log.file().debug(RUN_BORDER);
        outcome.exit_code = exit_code;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk::BulkCommand;
    use crate::logging::{Channel, MemorySink, Severity};
    use crate::package_manager::CommandOutput;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    const LISTING: &str = "\
Package  Version Latest Type
-------- ------- ------ -----
alpha    1.0.0   1.1.0  wheel
beta     2.0.0   3.0.0  wheel
";

    struct FakePip {
        list_code: i32,
        listing: &'static str,
    }

    #[async_trait]
    impl PackageManager for FakePip {
        async fn list_outdated(&self) -> std::io::Result<CommandOutput> {
            Ok(CommandOutput::new("pip list", Some(self.list_code), self.listing, ""))
        }

        async fn install_upgrade(&self, name: &str) -> std::io::Result<CommandOutput> {
            Ok(CommandOutput::new(
                "pip install",
                Some(0),
                format!("Successfully installed {}-9.0\n", name),
                "",
            ))
        }
    }

    fn app(pip: FakePip, bulk: BulkCommand, lines: &[&str]) -> (App<FakePip>, MemorySink) {
        app_with(pip, bulk, lines, Interrupt::new())
    }

    fn app_with<P: PackageManager>(
        pip: P,
        bulk: BulkCommand,
        lines: &[&str],
        interrupt: Interrupt,
    ) -> (App<P>, MemorySink) {
        let (log, sink) = LogContext::memory();
        let orchestrator = Orchestrator::new(pip, log.clone(), interrupt.clone());
        let bulk = BulkRunner::new(bulk, log.clone(), interrupt.clone());
        let input = InputLines::from_lines(lines.iter().copied());
        (App::new(orchestrator, bulk, input, log, interrupt), sink)
    }

    /// Raises the interrupt from inside the first upgrade, which then hangs
    /// like a slow pip would
    struct InterruptingPip {
        interrupt: Interrupt,
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl PackageManager for InterruptingPip {
        async fn list_outdated(&self) -> std::io::Result<CommandOutput> {
            Ok(CommandOutput::new("pip list", Some(0), LISTING, ""))
        }

        async fn install_upgrade(&self, name: &str) -> std::io::Result<CommandOutput> {
            self.calls.lock().unwrap().push(name.to_string());
            self.interrupt.trigger();
            std::future::pending::<std::io::Result<CommandOutput>>().await
        }
    }

    fn fake_pip() -> FakePip {
        FakePip {
            list_code: 0,
            listing: LISTING,
        }
    }

    fn unused_bulk() -> BulkCommand {
        BulkCommand::new("/nonexistent/bulk-for-tests", Vec::new())
    }

    #[tokio::test]
    async fn test_exit_choice() {
        let (mut app, _sink) = app(fake_pip(), unused_bulk(), &["3"]);
        let outcome = app.run(&mut Vec::<u8>::new()).await;
        assert_eq!(outcome.exit_code, EXIT_SUCCESS);
        assert_eq!(outcome.choice, Some(MenuChoice::Exit));
        assert_eq!(
            app.states(),
            &[State::Idle, State::AwaitingChoice, State::Exit(0)]
        );
    }

    #[tokio::test]
    async fn test_closed_input_fails() {
        let (mut app, sink) = app(fake_pip(), unused_bulk(), &[]);
        let outcome = app.run(&mut Vec::<u8>::new()).await;
        assert_eq!(outcome.exit_code, EXIT_FAILURE);
        assert!(outcome.choice.is_none());
        assert!(sink.contains(Severity::Warn, "Input closed"));
    }

    #[tokio::test]
    async fn test_targeted_upgrade_flow() {
        let (mut app, sink) = app(fake_pip(), unused_bulk(), &["x", "1"]);
        let outcome = app.run(&mut Vec::<u8>::new()).await;

        assert_eq!(outcome.exit_code, EXIT_SUCCESS);
        let targeted = outcome.targeted.unwrap();
        assert_eq!(targeted.summary.attempted(), 2);
        assert_eq!(targeted.summary.upgraded_count(), 2);
        assert_eq!(
            app.states(),
            &[
                State::Idle,
                State::AwaitingChoice,
                State::Listing,
                State::PerPackageUpgrade,
                State::Summary,
                State::Exit(0)
            ]
        );
        assert!(sink.contains(Severity::Info, "No. of packages upgraded = 2/2"));
    }

    #[tokio::test]
    async fn test_targeted_with_fetch_error_exits_cleanly() {
        let pip = FakePip {
            list_code: 1,
            listing: "",
        };
        let (mut app, sink) = app(pip, unused_bulk(), &["1"]);
        let outcome = app.run(&mut Vec::<u8>::new()).await;

        assert_eq!(outcome.exit_code, EXIT_SUCCESS);
        assert!(outcome.targeted.unwrap().listing.is_empty());
        assert!(sink.contains(Severity::Info, "No outdated packages found!"));
        assert!(!app.states().contains(&State::PerPackageUpgrade));
    }

    #[tokio::test]
    async fn test_interrupt_during_menu() {
        let (mut app, sink) = app(fake_pip(), unused_bulk(), &["1"]);
        app.interrupt.trigger();
        let outcome = app.run(&mut Vec::<u8>::new()).await;
        assert_eq!(outcome.exit_code, EXIT_FAILURE);
        assert!(outcome.interrupted);
        assert!(sink.contains(Severity::Warn, "during menu process"));
    }

    #[tokio::test]
    async fn test_bulk_spawn_failure_exits_non_zero() {
        let (mut app, _sink) = app(fake_pip(), unused_bulk(), &["2"]);
        let outcome = app.run(&mut Vec::<u8>::new()).await;
        assert_eq!(outcome.exit_code, EXIT_FAILURE);
        assert!(!outcome.interrupted);
        assert!(outcome.error.is_some());
        assert!(app.states().contains(&State::BulkUpgrade));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_bulk_success_with_pause() {
        let bulk = BulkCommand::new(
            "sh",
            vec![
                "-c".to_string(),
                "echo 'Successfully installed pip-24.0'".to_string(),
            ],
        );
        let (app, _sink) = app(fake_pip(), bulk, &["2", ""]);
        let mut app = app.with_pause(true);
        let mut out: Vec<u8> = Vec::new();

        let outcome = app.run(&mut out).await;

        assert_eq!(outcome.exit_code, EXIT_SUCCESS);
        assert_eq!(outcome.bulk.unwrap().installed.len(), 1);
        assert!(String::from_utf8(out).unwrap().contains("Press Enter to exit..."));
    }

    #[tokio::test]
    async fn test_interrupt_during_upgrade_exits_non_zero() {
        let interrupt = Interrupt::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let pip = InterruptingPip {
            interrupt: interrupt.clone(),
            calls: Arc::clone(&calls),
        };
        let (mut app, sink) = app_with(pip, unused_bulk(), &["1"], interrupt);

        let outcome = app.run(&mut Vec::<u8>::new()).await;

        assert_eq!(outcome.exit_code, EXIT_FAILURE);
        assert!(outcome.interrupted);
        assert_eq!(*calls.lock().unwrap(), vec!["alpha".to_string()]);
        assert!(sink.contains(Severity::Warn, "while upgrading 'alpha'"));
        assert!(!app.states().contains(&State::Summary));
        assert_eq!(app.states().last(), Some(&State::Exit(EXIT_FAILURE)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_interrupt_during_bulk_exits_non_zero() {
        let interrupt = Interrupt::new();
        let bulk = BulkCommand::new(
            "sh",
            vec!["-c".to_string(), "echo started; sleep 30".to_string()],
        );
        let (mut app, sink) = app_with(fake_pip(), bulk, &["2"], interrupt.clone());

        let trigger = interrupt.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            trigger.trigger();
        });

        let outcome = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            app.run(&mut Vec::<u8>::new()),
        )
        .await
        .expect("interrupt should end the bulk run promptly");

        assert_eq!(outcome.exit_code, EXIT_FAILURE);
        assert!(outcome.interrupted);
        assert!(outcome.bulk.is_none());
        assert!(sink.contains(Severity::Warn, "during the bulk upgrade"));
    }

    #[tokio::test]
    async fn test_log_file_closes_with_border() {
        let (mut app, sink) = app(fake_pip(), unused_bulk(), &["3"]);
        app.run(&mut Vec::<u8>::new()).await;

        let file_lines = sink.messages(Channel::File);
        let tail = &file_lines[file_lines.len() - 2..];
        assert_eq!(tail, &["Closing log file...".to_string(), RUN_BORDER.to_string()]);
        assert!(sink.contains(Severity::Info, "Exiting with status 0."));
    }

    #[tokio::test]
    async fn test_failed_run_still_closes_log() {
        let (mut app, sink) = app(fake_pip(), unused_bulk(), &[]);
        let outcome = app.run(&mut Vec::<u8>::new()).await;

        assert_eq!(outcome.exit_code, EXIT_FAILURE);
        assert_eq!(
            sink.messages(Channel::File).last().map(String::as_str),
            Some(RUN_BORDER)
        );
        assert!(sink.contains(Severity::Info, "Exiting with status 1."));
    }
}

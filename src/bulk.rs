//! Bulk upgrade runner
//!
//! Runs one external script that upgrades every installed package and
//! streams its output into the log line by line as it is produced.

use crate::error::BulkError;
use crate::interrupt::Interrupt;
use crate::logging::LogContext;
use crate::parser::is_success_line;
use crate::progress::{Phase, Progress};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Default bulk upgrade script for this platform
pub fn default_script() -> &'static str {
    if cfg!(windows) {
        "scripts/upgrade_all.ps1"
    } else {
        "scripts/upgrade_all.sh"
    }
}

/// Command line used to launch the bulk upgrade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl BulkCommand {
    /// Create a command from a program and its arguments
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Run `script` with the platform shell, passing the interpreter to use
    pub fn for_script(script: &Path, python: &Path) -> Self {
        let script = script.display().to_string();
        let python = python.display().to_string();
        if cfg!(windows) {
            Self::new(
                "powershell.exe",
                vec![
                    "-NoProfile".to_string(),
                    "-ExecutionPolicy".to_string(),
                    "Bypass".to_string(),
                    "-File".to_string(),
                    script,
                    python,
                ],
            )
        } else {
            Self::new("sh", vec![script, python])
        }
    }

    /// Human-readable command line
    pub fn describe(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// What the bulk run produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
    /// Number of output lines forwarded to the log
    pub lines: usize,
    /// `Successfully installed ...` lines, in output order
    pub installed: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Runs the bulk upgrade script
pub struct BulkRunner {
    command: BulkCommand,
    log: LogContext,
    interrupt: Interrupt,
    progress: Progress,
}

impl BulkRunner {
    /// Create a runner for `command`
    pub fn new(command: BulkCommand, log: LogContext, interrupt: Interrupt) -> Self {
        Self {
            command,
            log,
            interrupt,
            progress: Progress::disabled(),
        }
    }

    /// Enable or disable the progress spinner
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = Progress::new(enabled);
        self
    }

    /// Launch the script and stream its output until it exits
    pub async fn run(&mut self) -> Result<BulkReport, BulkError> {
        self.log
            .upgrade()
            .info("Upgrading all pip packages \"brute force\" one by one...");
        self.log
            .file()
            .debug(format!("Running '{}'", self.command.describe()));

        self.progress.begin(Phase::Bulk);
        let result = self.execute().await;
        self.progress.clear();

        match &result {
            Ok(report) => {
                self.log
                    .upgrade()
                    .info("Successfully completed global pip package upgrade!");
                self.log
                    .upgrade()
                    .info(format!("Upgraded packages = {}.", report.installed.len()));
                for (count, line) in report.installed.iter().enumerate() {
                    self.log.upgrade().info(format!("{}. {}", count + 1, line));
                }
            }
            Err(BulkError::Interrupted) => {
                self.log.main().warn(
                    "Keyboard interrupt was triggered by user during the bulk upgrade...",
                );
            }
            Err(e) => {
                self.log
                    .upgrade()
                    .error(format!("An error occurred during the bulk upgrade: {}", e));
            }
        }

        result
    }

    async fn execute(&self) -> Result<BulkReport, BulkError> {
        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BulkError::Spawn {
                command: self.command.describe(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("child stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("child stderr was not captured"))?;

        let report = self
            .forward(BufReader::new(stdout), BufReader::new(stderr))
            .await?;

        let status = tokio::select! {
            biased;
            _ = self.interrupt.triggered() => return Err(BulkError::Interrupted),
            status = child.wait() => status?,
        };

        if !status.success() {
            return Err(BulkError::Failed {
                code: status.code(),
            });
        }

        Ok(report)
    }

    /// Forward both output streams to the log until they are exhausted
    ///
    /// Each stream's lines are logged in the order they are read; stdout goes
    /// to `info`, stderr to `warn`. Bytes that are not UTF-8 are replaced
    /// rather than ending the run.
    pub async fn forward<O, E>(&self, stdout: O, stderr: E) -> Result<BulkReport, BulkError>
    where
        O: AsyncBufRead + Unpin,
        E: AsyncBufRead + Unpin,
    {
        let mut stdout = LossyLines::new(stdout);
        let mut stderr = LossyLines::new(stderr);
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut report = BulkReport::default();

        while stdout_open || stderr_open {
            tokio::select! {
                biased;
                _ = self.interrupt.triggered() => return Err(BulkError::Interrupted),
                line = stdout.next_line(), if stdout_open => match line? {
                    Some(line) => self.forward_line(Stream::Stdout, &line, &mut report),
                    None => stdout_open = false,
                },
                line = stderr.next_line(), if stderr_open => match line? {
                    Some(line) => self.forward_line(Stream::Stderr, &line, &mut report),
                    None => stderr_open = false,
                },
            }
        }

        Ok(report)
    }

    fn forward_line(&self, stream: Stream, line: &str, report: &mut BulkReport) {
        let line = line.trim_end();
        report.lines += 1;

        self.progress.suspend(|| match stream {
            Stream::Stdout => self.log.upgrade().info(line),
            Stream::Stderr => self.log.upgrade().warn(line),
        });

        if is_success_line(line) {
            report.installed.push(line.trim().to_string());
            self.progress.advance();
        }
    }
}

/// Line reader that decodes each line lossily
///
/// Partial lines stay in `buf` when a read is cancelled by `select!`, so the
/// next call picks up where the last one stopped.
struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LossyLines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 && self.buf.is_empty() {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Ok(Some(line))
    }
}

//! Package manager integration
//!
//! This module provides:
//! - The [`PackageManager`] seam used by the orchestrator
//! - [`Pip`], which runs `<python> -m pip` as a child process

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use tokio::process::Command;

/// Captured result of one package manager invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// The command line that was executed, for logging
    pub command: String,
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Create an output with the given exit code
    pub fn new(
        command: impl Into<String>,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Build from a finished process
    fn from_process(command: String, output: Output) -> Self {
        Self {
            command,
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            return self.stdout.clone();
        }
        let mut combined = self.stdout.clone();
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&self.stderr);
        combined
    }
}

/// Operations the orchestrator needs from a package manager
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Run the "list outdated packages" command
    async fn list_outdated(&self) -> std::io::Result<CommandOutput>;

    /// Run the "install/upgrade a named package" command
    async fn install_upgrade(&self, name: &str) -> std::io::Result<CommandOutput>;
}

/// pip, driven through `<python> -m pip`
#[derive(Debug, Clone)]
pub struct Pip {
    python: PathBuf,
}

impl Pip {
    /// Create a pip runner using the given interpreter
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// Arguments for listing outdated packages
    fn list_args() -> Vec<&'static str> {
        vec!["-m", "pip", "list", "--outdated"]
    }

    /// Arguments for upgrading one package
    fn upgrade_args(name: &str) -> Vec<&str> {
        vec!["-m", "pip", "install", "--upgrade", name]
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.python.display(), args.join(" "))
    }

    /// Run pip and capture its output
    ///
    /// The child is killed if the returned future is dropped, which is how an
    /// interrupt stops a running upgrade.
    async fn run(&self, args: &[&str]) -> std::io::Result<CommandOutput> {
        let output = Command::new(&self.python)
            .args(args)
            // Keeps the upgrade nag out of the parsed output
            .env("PIP_DISABLE_PIP_VERSION_CHECK", "1")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(CommandOutput::from_process(self.describe(args), output))
    }
}

#[async_trait]
impl PackageManager for Pip {
    async fn list_outdated(&self) -> std::io::Result<CommandOutput> {
        self.run(&Self::list_args()).await
    }

    async fn install_upgrade(&self, name: &str) -> std::io::Result<CommandOutput> {
        self.run(&Self::upgrade_args(name)).await
    }
}

/// Default interpreter name for this platform
pub fn default_python() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

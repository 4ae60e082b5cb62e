//! Application error types using thiserror
//!
//! Error hierarchy:
//! - FetchError: `pip list --outdated` could not produce a listing
//! - ParseError: a line of the listing did not have four fields
//! - UpgradeError: a targeted upgrade run was interrupted
//! - BulkError: the bulk upgrade script failed or was interrupted

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Listing outdated packages failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Per-package upgrade loop failed
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),

    /// Bulk upgrade failed
    #[error(transparent)]
    Bulk(#[from] BulkError),
}

/// Errors raised while fetching the outdated package list
#[derive(Error, Debug)]
pub enum FetchError {
    /// The package manager could not be started
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The package manager exited with a non-zero status
    #[error("'{command}' exited with {}", describe_code(*code))]
    ExitStatus {
        command: String,
        code: Option<i32>,
        output: String,
    },
}

/// A line of `pip list --outdated` output that is not a package row
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line_number}: expected 4 fields, found {field_count}: '{line}'")]
pub struct ParseError {
    /// 1-based line number within the full command output
    pub line_number: usize,
    /// The offending line, trimmed
    pub line: String,
    /// Number of whitespace-separated fields found
    pub field_count: usize,
}

/// Errors that end the per-package upgrade loop early
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// The user interrupted while the outdated list was being fetched
    #[error("interrupted while listing outdated packages")]
    ListingInterrupted,

    /// The user interrupted the run
    #[error("upgrade interrupted after {completed} of {total} packages")]
    Interrupted { completed: usize, total: usize },
}

/// Errors raised by the bulk upgrade runner
#[derive(Error, Debug)]
pub enum BulkError {
    /// The script could not be started
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the script output or waiting for it failed
    #[error("I/O error while running bulk upgrade: {0}")]
    Io(#[from] std::io::Error),

    /// The script exited with a non-zero status
    #[error("bulk upgrade script exited with {}", describe_code(*code))]
    Failed { code: Option<i32> },

    /// The user interrupted the run
    #[error("bulk upgrade interrupted")]
    Interrupted,
}

impl FetchError {
    /// Creates a new Spawn error
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        FetchError::Spawn {
            command: command.into(),
            source,
        }
    }

    /// Creates a new ExitStatus error
    pub fn exit_status(
        command: impl Into<String>,
        code: Option<i32>,
        output: impl Into<String>,
    ) -> Self {
        FetchError::ExitStatus {
            command: command.into(),
            code,
            output: output.into(),
        }
    }
}

impl ParseError {
    /// Creates a new ParseError for a line
    pub fn new(line_number: usize, line: &str, field_count: usize) -> Self {
        Self {
            line_number,
            line: line.trim().to_string(),
            field_count,
        }
    }
}

impl AppError {
    /// Returns true if the error came from a user interrupt
    pub fn is_interrupt(&self) -> bool {
        matches!(
            self,
            AppError::Upgrade(_) | AppError::Bulk(BulkError::Interrupted)
        )
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_exit_status() {
        let err = FetchError::exit_status("python3 -m pip list --outdated", Some(2), "boom");
        let msg = format!("{}", err);
        assert!(msg.contains("pip list --outdated"));
        assert!(msg.contains("status 2"));
    }

    #[test]
    fn test_fetch_error_signal() {
        let err = FetchError::exit_status("pip", None, "");
        assert!(format!("{}", err).contains("terminated by signal"));
    }

    #[test]
    fn test_fetch_error_spawn() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = FetchError::spawn("python9", io);
        let msg = format!("{}", err);
        assert!(msg.contains("failed to run 'python9'"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(5, "  broken line  ", 2);
        assert_eq!(err.line, "broken line");
        let msg = format!("{}", err);
        assert!(msg.contains("line 5"));
        assert!(msg.contains("found 2"));
    }

    #[test]
    fn test_upgrade_error_interrupted() {
        let err = UpgradeError::Interrupted {
            completed: 2,
            total: 5,
        };
        assert_eq!(
            format!("{}", err),
            "upgrade interrupted after 2 of 5 packages"
        );
    }

    #[test]
    fn test_bulk_error_failed() {
        let err = BulkError::Failed { code: Some(3) };
        assert!(format!("{}", err).contains("status 3"));
    }

    #[test]
    fn test_app_error_is_interrupt() {
        let err: AppError = BulkError::Interrupted.into();
        assert!(err.is_interrupt());

        let err: AppError = UpgradeError::Interrupted {
            completed: 0,
            total: 1,
        }
        .into();
        assert!(err.is_interrupt());

        let err: AppError = UpgradeError::ListingInterrupted.into();
        assert!(err.is_interrupt());

        let err: AppError = BulkError::Failed { code: Some(1) }.into();
        assert!(!err.is_interrupt());
    }

    #[test]
    fn test_app_error_from_fetch_error() {
        let err: AppError = FetchError::exit_status("pip", Some(1), "").into();
        assert!(format!("{}", err).contains("status 1"));
    }
}

//! Logging context and subscriber setup
//!
//! Components never log through a global handle. Each one receives a
//! [`LogContext`] and writes to one of three [`Channel`]s:
//! - `main`: program flow, shown on the console and written to the log file
//! - `upgrade`: upgrade progress and results, console and file
//! - `file`: debug detail that only goes to the log file
//!
//! In production the context forwards to `tracing`, where the channel becomes
//! the event target. Tests use [`MemorySink`] to inspect what was logged.

use anyhow::Context;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

const MAIN_TARGET: &str = "main";
const UPGRADE_TARGET: &str = "upgrade";
const FILE_TARGET: &str = "file";

/// Destination of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Main,
    Upgrade,
    File,
}

impl Channel {
    /// tracing target used for this channel
    pub fn target(&self) -> &'static str {
        match self {
            Channel::Main => MAIN_TARGET,
            Channel::Upgrade => UPGRADE_TARGET,
            Channel::File => FILE_TARGET,
        }
    }
}

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// A single recorded log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub channel: Channel,
    pub severity: Severity,
    pub message: String,
}

/// Destination for log lines
pub trait LogSink: Send + Sync {
    /// Record one line
    fn record(&self, channel: Channel, severity: Severity, message: &str);
}

/// Sink that forwards to the installed `tracing` subscriber
#[derive(Debug, Default)]
pub struct TracingSink;

macro_rules! emit {
    ($target:expr, $severity:expr, $message:expr) => {
        match $severity {
            Severity::Debug => tracing::debug!(target: $target, "{}", $message),
            Severity::Info => tracing::info!(target: $target, "{}", $message),
            Severity::Warn => tracing::warn!(target: $target, "{}", $message),
            Severity::Error => tracing::error!(target: $target, "{}", $message),
        }
    };
}

impl LogSink for TracingSink {
    fn record(&self, channel: Channel, severity: Severity, message: &str) {
        // tracing targets must be constants
        match channel {
            Channel::Main => emit!(MAIN_TARGET, severity, message),
            Channel::Upgrade => emit!(UPGRADE_TARGET, severity, message),
            Channel::File => emit!(FILE_TARGET, severity, message),
        }
    }
}

/// Sink that keeps every line in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries recorded so far, in order
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Messages recorded on one channel, in order
    pub fn messages(&self, channel: Channel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.channel == channel)
            .map(|e| e.message)
            .collect()
    }

    /// Returns true if any entry at `severity` contains `needle`
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.entries()
            .iter()
            .any(|e| e.severity == severity && e.message.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn record(&self, channel: Channel, severity: Severity, message: &str) {
        let entry = LogEntry {
            channel,
            severity,
            message: message.to_string(),
        };
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

/// Logging handle passed to every component
#[derive(Clone)]
pub struct LogContext {
    sink: Arc<dyn LogSink>,
}

impl LogContext {
    /// Create a context writing to `sink`
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Create a context that forwards to `tracing`
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    /// Create a context backed by a [`MemorySink`], returning both
    pub fn memory() -> (Self, MemorySink) {
        let sink = MemorySink::new();
        (Self::new(Arc::new(sink.clone())), sink)
    }

    /// Logger for the `main` channel
    pub fn main(&self) -> ChannelLog<'_> {
        self.channel(Channel::Main)
    }

    /// Logger for the `upgrade` channel
    pub fn upgrade(&self) -> ChannelLog<'_> {
        self.channel(Channel::Upgrade)
    }

    /// Logger for the file-only channel
    pub fn file(&self) -> ChannelLog<'_> {
        self.channel(Channel::File)
    }

    fn channel(&self, channel: Channel) -> ChannelLog<'_> {
        ChannelLog { ctx: self, channel }
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogContext").finish_non_exhaustive()
    }
}

/// A [`LogContext`] bound to one channel
pub struct ChannelLog<'a> {
    ctx: &'a LogContext,
    channel: Channel,
}

impl ChannelLog<'_> {
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(Severity::Debug, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(Severity::Info, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(Severity::Warn, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(Severity::Error, message);
    }

    fn log(&self, severity: Severity, message: impl AsRef<str>) {
        self.ctx
            .sink
            .record(self.channel, severity, message.as_ref());
    }
}

/// Line format shared by the console and the file:
/// `[2024-01-31 12:00:00 :: INFO] message`
struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        write!(writer, "[{} :: {}] ", now, event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Open the log file for appending, creating its directory if needed
pub fn file_appender(path: &Path) -> anyhow::Result<RollingFileAppender> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .with_context(|| format!("log file path has no file name: {}", path.display()))?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy().into_owned())
        .build(dir)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

/// Install the global subscriber: console on stderr plus the log file
///
/// `RUST_LOG` overrides the default levels (`info` on the console, `debug` in
/// the file). The returned guard flushes the file writer when dropped.
pub fn init(log_file: &Path) -> anyhow::Result<WorkerGuard> {
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender(log_file)?);

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(format!("{}=off", FILE_TARGET).parse()?);
    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let console_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);
    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(file_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {}", e))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_targets() {
        assert_eq!(Channel::Main.target(), "main");
        assert_eq!(Channel::Upgrade.target(), "upgrade");
        assert_eq!(Channel::File.target(), "file");
    }

    #[test]
    fn test_memory_sink_records_in_order() {
        let (log, sink) = LogContext::memory();
        log.main().info("first");
        log.upgrade().warn("second");
        log.file().debug("third");
        log.main().error("fourth");

        let entries = sink.entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].channel, Channel::Upgrade);
        assert_eq!(entries[1].severity, Severity::Warn);
        assert_eq!(entries[2].channel, Channel::File);
        assert_eq!(sink.messages(Channel::Main), vec!["first", "fourth"]);
        assert!(sink.contains(Severity::Error, "four"));
        assert!(!sink.contains(Severity::Info, "four"));
    }

    #[test]
    fn test_context_clones_share_sink() {
        let (log, sink) = LogContext::memory();
        let other = log.clone();
        other.main().info("from clone");
        assert_eq!(sink.messages(Channel::Main), vec!["from clone"]);
    }

    #[test]
    fn test_tracing_sink_without_subscriber() {
        // No subscriber installed: events are dropped silently.
        let log = LogContext::tracing();
        log.main().info("hello");
        log.file().debug("detail");
    }

    #[test]
    fn test_file_appender_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("logs").join("upgrade.log");
        let _appender = file_appender(&path).unwrap();
        assert!(temp_dir.path().join("logs").is_dir());
    }

    #[test]
    fn test_file_appender_rejects_directory_path() {
        assert!(file_appender(Path::new("/")).is_err());
    }
}

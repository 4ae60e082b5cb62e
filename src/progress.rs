//! Progress display for upgrade runs
//!
//! One bar at a time, shaped by the phase of the run:
//! - `Listing`: a spinner while `pip list --outdated` runs
//! - `Upgrading`: a bar over the outdated packages
//! - `Bulk`: a spinner counting "Successfully installed" lines

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// What the run is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Listing,
    Upgrading { total: u64 },
    Bulk,
}

impl Phase {
    fn template(&self) -> &'static str {
        match self {
            Phase::Listing => "{spinner:.cyan} Retrieving outdated packages...",
            Phase::Upgrading { .. } => {
                "{spinner:.cyan} Upgrading {msg} [{bar:30.cyan/blue}] {pos}/{len} ({eta})"
            }
            Phase::Bulk => "{spinner:.cyan} Upgrading all packages ({pos} upgraded, {elapsed})",
        }
    }

    fn bar(&self) -> ProgressBar {
        match self {
            Phase::Upgrading { total } => ProgressBar::new(*total),
            Phase::Listing | Phase::Bulk => ProgressBar::new_spinner(),
        }
    }
}

/// Progress reporter, silent unless enabled
pub struct Progress {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    /// Never draws anything
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Replace the current bar with one for `phase`
    pub fn begin(&mut self, phase: Phase) {
        self.clear();
        if !self.enabled {
            return;
        }

        let style = match ProgressStyle::with_template(phase.template()) {
            Ok(style) => style.tick_chars(TICKS).progress_chars("█▓▒░"),
            Err(_) => ProgressStyle::default_spinner(),
        };
        let bar = phase.bar().with_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    /// Name the package currently being upgraded
    pub fn package(&self, name: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(name.to_string());
        }
    }

    /// Count one finished package
    pub fn advance(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Run `f` with the bar hidden so log lines do not interleave with it
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        match &self.bar {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    /// Remove the current bar from the terminal
    pub fn clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.clear();
    }
}

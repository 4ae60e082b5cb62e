//! Interactive menu
//!
//! Presents the numbered options, reads one line at a time and keeps asking
//! until it gets a valid choice, the input closes, or the user interrupts.

use crate::interrupt::Interrupt;
use crate::logging::LogContext;
use colored::Colorize;
use std::io::{BufRead, Write};
use tokio::sync::mpsc;

/// One entry of the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// List outdated packages, then upgrade them one at a time
    TargetedUpgrade,
    /// Run the bulk upgrade script
    BulkUpgrade,
    /// Leave without doing anything
    Exit,
}

impl MenuChoice {
    /// All choices in display order
    pub const ALL: [MenuChoice; 3] = [
        MenuChoice::TargetedUpgrade,
        MenuChoice::BulkUpgrade,
        MenuChoice::Exit,
    ];

    /// Parse a line of user input (`1`, `2` or `3`)
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::TargetedUpgrade),
            "2" => Some(MenuChoice::BulkUpgrade),
            "3" => Some(MenuChoice::Exit),
            _ => None,
        }
    }

    /// Number the user types for this choice
    pub fn number(&self) -> usize {
        match self {
            MenuChoice::TargetedUpgrade => 1,
            MenuChoice::BulkUpgrade => 2,
            MenuChoice::Exit => 3,
        }
    }

    /// Menu text
    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::TargetedUpgrade => "List outdated pip packages, then upgrade them",
            MenuChoice::BulkUpgrade => "\"Brute-force-upgrade\" all packages (one by one)",
            MenuChoice::Exit => "Exit",
        }
    }
}

/// Outcome of waiting for a line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompted<T> {
    /// The user answered
    Answer(T),
    /// The input stream ended
    Closed,
    /// Ctrl-C arrived first
    Interrupted,
}

/// Lines of user input, delivered asynchronously
///
/// Reading a terminal blocks, so stdin is read on its own OS thread and the
/// lines are handed over through a channel. That keeps the async side free
/// to notice an interrupt while waiting for the user.
pub struct InputLines {
    rx: mpsc::UnboundedReceiver<String>,
}

impl InputLines {
    /// Read lines from stdin
    pub fn from_stdin() -> Self {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    /// Read lines from any blocking reader on a background thread
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self { rx }
    }

    /// Use a fixed set of lines, then report end of input
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        for line in lines {
            let _ = tx.send(line.into());
        }
        Self { rx }
    }

    /// Wait for the next line, or for an interrupt
    pub async fn next_line(&mut self, interrupt: &Interrupt) -> Prompted<String> {
        tokio::select! {
            biased;
            _ = interrupt.triggered() => Prompted::Interrupted,
            line = self.rx.recv() => match line {
                Some(line) => Prompted::Answer(line),
                None => Prompted::Closed,
            },
        }
    }
}

/// The numbered option menu
pub struct Menu {
    log: LogContext,
    color: bool,
}

impl Menu {
    /// Create a menu logging to `log`
    pub fn new(log: LogContext) -> Self {
        Self { log, color: true }
    }

    /// Disable colored output
    pub fn without_color(mut self) -> Self {
        self.color = false;
        self
    }

    /// Write the option list and prompt
    pub fn display(&self, out: &mut dyn Write) -> std::io::Result<()> {
        self.log.file().debug("Displaying user options menu...");

        let border = format!("|{}|", "*".repeat(78));
        writeln!(out, "{}", border)?;
        for choice in MenuChoice::ALL {
            let number = format!("[{}]", choice.number());
            let number = if self.color {
                number.cyan().bold().to_string()
            } else {
                number
            };
            writeln!(out, "| > Enter {} to {}", number, choice.label())?;
        }
        writeln!(out, "{}", border)?;
        write!(out, ">>> ")?;
        out.flush()
    }

    /// Ask until a valid choice is made
    pub async fn choose(
        &self,
        input: &mut InputLines,
        interrupt: &Interrupt,
        out: &mut dyn Write,
    ) -> std::io::Result<Prompted<MenuChoice>> {
        loop {
            self.display(out)?;
            match input.next_line(interrupt).await {
                Prompted::Answer(line) => match MenuChoice::parse(&line) {
                    Some(choice) => {
                        writeln!(out)?;
                        self.log
                            .file()
                            .debug(format!("User selected option {}.", choice.number()));
                        return Ok(Prompted::Answer(choice));
                    }
                    None => {
                        self.log.main().warn(format!(
                            "Incorrect response: \"{}\". Accepted values are limited to: \"1\", \"2\" or \"3\". Please try again.",
                            line.trim()
                        ));
                    }
                },
                Prompted::Closed => {
                    writeln!(out)?;
                    return Ok(Prompted::Closed);
                }
                Prompted::Interrupted => {
                    writeln!(out)?;
                    return Ok(Prompted::Interrupted);
                }
            }
        }
    }
}

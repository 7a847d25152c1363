// Notifications - user-facing messages with a level
//
// The controller queues notifications; the CLI prints them with ANSI colors
// and the dashboard shows them as toasts. Every notification is also logged.

use std::fmt;
use std::io::{self, IsTerminal, Write};

/// Tracing target of notification events (kept off the stderr log layer)
pub const LOG_TARGET: &str = "pdetect::notify";

/// ANSI color codes for terminal output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const RED: &str = "\x1b[31m";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Error,
}

impl Level {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Info => "ℹ",
            Self::Error => "✗",
        }
    }

    fn color(&self) -> &'static str {
        match self {
            Self::Success => colors::GREEN,
            Self::Info => colors::CYAN,
            Self::Error => colors::RED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        let notification = Self {
            level,
            message: message.into(),
        };
        notification.log();
        notification
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    fn log(&self) {
        match self.level {
            Level::Success | Level::Info => tracing::info!(target: LOG_TARGET, "{}", self.message),
            Level::Error => tracing::error!(target: LOG_TARGET, "{}", self.message),
        }
    }

    /// Print to stdout (errors to stderr), colored when attached to a terminal
    pub fn print(&self) {
        let result = if self.level == Level::Error {
            let stderr = io::stderr();
            let color = stderr.is_terminal();
            self.write_to(&mut stderr.lock(), color)
        } else {
            let stdout = io::stdout();
            let color = stdout.is_terminal();
            self.write_to(&mut stdout.lock(), color)
        };
        if let Err(e) = result {
            tracing::debug!("Failed to print notification: {}", e);
        }
    }

    pub fn write_to(&self, out: &mut impl Write, color: bool) -> io::Result<()> {
        if color {
            let c = self.level.color();
            writeln!(
                out,
                "  {c}{}{RESET} {}",
                self.level.icon(),
                self.message,
                RESET = colors::RESET
            )
        } else {
            writeln!(out, "  {} {}", self.level.icon(), self.message)
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level.icon(), self.message)
    }
}

/// Bold heading line used by CLI output blocks
pub fn heading(text: &str, color: bool) -> String {
    if color {
        format!("{}{}{}", colors::BOLD, text, colors::RESET)
    } else {
        text.to_string()
    }
}

/// Dimmed label used by CLI output blocks
pub fn dim(text: &str, color: bool) -> String {
    if color {
        format!("{}{}{}", colors::DIM, text, colors::RESET)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output() {
        let mut out = Vec::new();
        Notification::info("Using demo data for analysis...")
            .write_to(&mut out, false)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "  ℹ Using demo data for analysis...\n"
        );
    }

    #[test]
    fn test_colored_output() {
        let mut out = Vec::new();
        Notification::error("boom").write_to(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("  \x1b[31m✗\x1b[0m boom"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Notification::success("Saved").to_string(), "✓ Saved");
    }
}

//! Severity carried by a [`LogEvent`](super::LogEvent)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl LogLevel {
    /// Every level, least severe first
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    pub const fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Levels routed to stderr by console targets
    pub fn is_error(&self) -> bool {
        *self >= LogLevel::Error
    }

    #[cfg(feature = "console")]
    pub(crate) fn color_code(&self) -> colored::Color {
        match self {
            LogLevel::Trace => colored::Color::BrightBlack,
            LogLevel::Debug => colored::Color::Blue,
            LogLevel::Info => colored::Color::Green,
            LogLevel::Warn => colored::Color::Yellow,
            LogLevel::Error => colored::Color::Red,
            LogLevel::Fatal => colored::Color::BrightRed,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("warning") {
            return Ok(LogLevel::Warn);
        }
        LogLevel::ALL
            .into_iter()
            .find(|level| s.eq_ignore_ascii_case(level.to_str()))
            .ok_or_else(|| format!("Invalid log level: '{}'", s))
    }
}

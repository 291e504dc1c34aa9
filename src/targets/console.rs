//! Console target implementation

use crate::core::{LogEvent, Result, Target};
use colored::Colorize;
use std::io::Write;

const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub struct ConsoleTarget {
    use_colors: bool,
    timestamp_format: String,
}

impl ConsoleTarget {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    /// Set a custom timestamp format using a strftime-compatible format string
    ///
    /// # Examples
    ///
    /// ```
    /// use async_target_wrapper::targets::ConsoleTarget;
    ///
    /// let target = ConsoleTarget::new()
    ///     .with_timestamp_format("%d/%b/%Y:%H:%M:%S %z");
    /// ```
    #[must_use]
    pub fn with_timestamp_format(mut self, format_str: &str) -> Self {
        self.timestamp_format = format_str.to_string();
        self
    }

    fn format_line(&self, event: &LogEvent) -> String {
        let level_str = if self.use_colors {
            format!("{:5}", event.level.to_str())
                .color(event.level.color_code())
                .to_string()
        } else {
            format!("{:5}", event.level.to_str())
        };

        let mut line = format!(
            "[{}] [{}] {}",
            event.timestamp.format(&self.timestamp_format),
            level_str,
            event.thread_label(),
        );
        if let Some(ref logger_name) = event.logger_name {
            line.push(' ');
            line.push_str(logger_name);
        }
        line.push_str(" - ");
        line.push_str(&event.message);
        line
    }
}

impl Default for ConsoleTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for ConsoleTarget {
    fn name(&self) -> &str {
        "console"
    }

    fn write(&mut self, event: &LogEvent) -> Result<()> {
        let line = self.format_line(event);

        // Route Error and Fatal levels to stderr, others to stdout
        if event.level.is_error() {
            writeln!(std::io::stderr().lock(), "{}", line)?;
        } else {
            writeln!(std::io::stdout().lock(), "{}", line)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }
}

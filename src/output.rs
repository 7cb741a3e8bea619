//! Output formatting utilities for the CLI.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Create an output format from a JSON flag.
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Print a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print a key-value pair.
pub fn key_value(key: &str, value: &str) {
    println!("  {}: {}", key.bold(), value);
}

/// Print a section header.
pub fn section(title: &str) {
    println!("\n{}", title.bold().underline());
}

/// Print a status indicator.
pub fn status(label: &str, ok: bool) {
    let indicator = if ok { "●".green() } else { "●".red() };
    println!("  {indicator} {label}");
}

/// Print JSON output.
pub fn json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let output = serde_json::to_string_pretty(value)?;
    println!("{output}");
    Ok(())
}

/// Print a table of data.
pub fn table<T: tabled::Tabled>(data: &[T]) {
    use tabled::{settings::Style, Table};

    if data.is_empty() {
        println!("  (no data)");
        return;
    }

    let table = Table::new(data).with(Style::rounded()).to_string();
    println!("{table}");
}

/// Format a latency for tables.
pub fn format_latency(ms: &u64) -> String {
    format!("{ms}ms")
}

/// Format an optional value, `-` when absent.
pub fn format_optional<T: std::fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string)
}

/// Format a timestamp for tables.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Result output that can be formatted as text or JSON.
#[derive(Debug, Serialize)]
pub struct CommandResult<T: Serialize> {
    /// Whether the command succeeded.
    pub success: bool,
    /// Result data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Informational message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    /// Create a successful result with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// Create a failed result carrying data.
    pub fn failure_with(data: T, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(error.into()),
            message: None,
        }
    }

    /// Attach an informational message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Print the result in the specified format.
    ///
    /// Text output only covers the message and error lines; commands
    /// render their data themselves.
    pub fn print(&self, format: OutputFormat) -> anyhow::Result<()> {
        match format {
            OutputFormat::Json => json(self),
            OutputFormat::Text => {
                if let Some(ref msg) = self.message {
                    if self.success {
                        success(msg);
                    } else {
                        warning(msg);
                    }
                }
                if let Some(ref err) = self.error {
                    error(err);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_json_shape() {
        let result = CommandResult::success(vec![1, 2]).with_message("two items");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"], serde_json::json!([1, 2]));
        assert_eq!(value["message"], "two items");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_failure_keeps_data() {
        let result = CommandResult::failure_with("partial", "all providers failed");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["data"], "partial");
        assert_eq!(value["error"], "all providers failed");
    }

    #[test]
    fn test_formatters() {
        assert_eq!(format_latency(&120), "120ms");
        assert_eq!(format_optional::<u32>(&None), "-");
        assert_eq!(format_optional(&Some(3)), "3");
    }
}

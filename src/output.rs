//! # Output Configuration
//!
//! This module provides utilities for controlling CLI output appearance
//! and the per-repository report lines, with color support based on
//! terminal capabilities and user preferences.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Report Lines
//!
//! Every repository event is a single line of the form
//! `[<name><padding>] <message>`, with the name colored by severity:
//! green for info, yellow for warnings, red for errors.

use std::env;

use console::style;

/// Width the repository name is padded to inside the brackets.
const NAME_COLUMN: usize = 15;

/// Severity of a per-repository report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Output configuration for controlling colors.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// # Behavior
    /// - `--color=always`: Force colors on (overrides NO_COLOR)
    /// - `--color=never`: Force colors off
    /// - `--color=auto`: Detect based on environment
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // Check NO_COLOR first (https://no-color.org/)
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        // Check CLICOLOR=0 disables colors
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        // Check CLICOLOR_FORCE=1 forces colors
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        // Check TERM=dumb
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        // Use console crate's detection for TTY and color support
        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Print a single per-repository report line.
///
/// The name is padded to a fixed column so messages line up across
/// repositories of different name lengths.
pub fn report(config: &OutputConfig, severity: Severity, name: &str, message: &str) {
    println!("{}", format_report(config, severity, name, message));
}

/// Format a report line without printing it.
pub fn format_report(
    config: &OutputConfig,
    severity: Severity,
    name: &str,
    message: &str,
) -> String {
    let padding = " ".repeat(NAME_COLUMN.saturating_sub(name.chars().count()));
    let colored = if config.use_color {
        let styled = match severity {
            Severity::Info => style(name).green(),
            Severity::Warning => style(name).yellow(),
            Severity::Error => style(name).red(),
        };
        styled.force_styling(true).to_string()
    } else {
        name.to_string()
    };

    format!("[{}{}] {}", colored, padding, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
    }

    #[test]
    fn test_format_report_plain() {
        let config = OutputConfig::without_color();
        let line = format_report(&config, Severity::Info, "proj", "success");
        assert_eq!(line, "[proj           ] success");
    }

    #[test]
    fn test_format_report_pads_to_column() {
        let config = OutputConfig::without_color();
        let line = format_report(&config, Severity::Warning, "repo", "does not exist");
        // 4-char name + 11 spaces = 15 columns inside the brackets
        assert!(line.starts_with("[repo           ]"));
    }

    #[test]
    fn test_format_report_long_name_not_truncated() {
        let config = OutputConfig::without_color();
        let line = format_report(
            &config,
            Severity::Error,
            "a-very-long-repository-name",
            "oops",
        );
        assert_eq!(line, "[a-very-long-repository-name] oops");
    }

    #[test]
    fn test_format_report_colored_contains_ansi() {
        let config = OutputConfig::with_color();
        let line = format_report(&config, Severity::Info, "proj", "success");
        assert!(line.contains("\u{1b}["));
        assert!(line.ends_with("success"));
    }
}

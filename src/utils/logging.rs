//! Logging Module
//!
//! Structured logging through `tracing`. The framework crates (burn and its
//! compute runtime) are held at `error` unless verbose output is requested,
//! so the console shows pipeline progress rather than kernel chatter.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose logs are limited to errors in non-verbose runs
const FRAMEWORK_TARGETS: [&str; 5] = ["burn", "burn_core", "burn_ndarray", "cubecl", "wgpu"];

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level for this crate
    pub level: LogLevel,
    /// Whether to include target (module path)
    pub include_target: bool,
    /// Whether to use ANSI colors
    pub ansi_colors: bool,
    /// Whether framework crates are limited to errors
    pub quiet_framework: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            include_target: false,
            ansi_colors: true,
            quiet_framework: true,
        }
    }
}

impl LogConfig {
    /// Create a verbose logging config for debugging
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            include_target: true,
            ansi_colors: true,
            quiet_framework: false,
        }
    }

    /// Create a quiet logging config (errors only)
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            include_target: false,
            ansi_colors: true,
            quiet_framework: true,
        }
    }

    /// Build the env-filter directive string for this config
    pub fn directives(&self) -> String {
        let level = self.level.as_directive();
        let mut directives = vec![level.to_string()];
        if self.quiet_framework {
            directives.extend(FRAMEWORK_TARGETS.iter().map(|t| format!("{t}=error")));
        }
        directives.join(",")
    }
}

/// Log level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parse a level name, defaulting to `Info`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_directive().to_uppercase())
    }
}

/// Initialize logging with the given configuration
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let filter = EnvFilter::try_new(config.directives())
        .map_err(|e| format!("Invalid log filter: {}", e))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_ansi(config.ansi_colors)
                .with_target(config.include_target),
        )
        .with(filter)
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::parse("INFO"), LogLevel::Info);
        assert_eq!(LogLevel::parse("Warning"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("unknown"), LogLevel::Info);
    }

    #[test]
    fn test_default_quiets_framework() {
        let directives = LogConfig::default().directives();
        assert!(directives.starts_with("info"));
        assert!(directives.contains("burn=error"));
        assert!(directives.contains("cubecl=error"));
    }

    #[test]
    fn test_verbose_keeps_framework_logs() {
        let directives = LogConfig::verbose().directives();
        assert_eq!(directives, "debug");
    }

    #[test]
    fn test_level_display() {
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
        assert_eq!(LogLevel::Error.to_string(), "ERROR");
    }
}

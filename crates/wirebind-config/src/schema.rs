//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};

/// Application behaviour.
///
/// # Example
///
/// ```
/// use wirebind_config::AppSettings;
///
/// let app = AppSettings::default();
/// assert!(!app.debug);
/// assert!(app.validate_patterns);
/// assert_eq!(app.default_content_type, "text/html; charset=UTF-8");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppSettings {
    /// Debug mode: pretty JSON output and `_debug` details in error bodies.
    #[serde(default)]
    pub debug: bool,

    /// Include error details in rendered 5xx responses. Always on in debug
    /// mode.
    #[serde(default)]
    pub display_error_details: bool,

    /// Reject route patterns that neither end with `/` nor contain a `.`,
    /// or that do both.
    #[serde(default = "default_true")]
    pub validate_patterns: bool,

    /// Content type of the default response.
    #[serde(default = "default_content_type")]
    pub default_content_type: String,

    /// HTTP version of the default response ("1.0", "1.1" or "2").
    #[serde(default = "default_http_version")]
    pub http_version: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            debug: false,
            display_error_details: false,
            validate_patterns: true,
            default_content_type: default_content_type(),
            http_version: default_http_version(),
        }
    }
}

fn default_content_type() -> String {
    "text/html; charset=UTF-8".to_string()
}

fn default_http_version() -> String {
    "1.1".to_string()
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}

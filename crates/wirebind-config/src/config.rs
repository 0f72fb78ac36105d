//! Top-level settings.
//!
//! This module provides the root [`Settings`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{AppSettings, ConfigError, LogFormat, LoggingSettings};

const HTTP_VERSIONS: [&str; 4] = ["1.0", "1.1", "2", "2.0"];
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete Wirebind settings.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load settings from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use wirebind_config::Settings;
///
/// let settings = Settings::default();
/// assert!(!settings.app.debug);
/// assert_eq!(settings.logging.level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Application behaviour.
    #[serde(default)]
    pub app: AppSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Create a new settings builder.
    #[must_use]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Development preset: debug on, verbose pretty logs.
    #[must_use]
    pub fn development() -> Self {
        let mut settings = Self::default();
        settings.app.debug = true;
        settings.logging.level = "debug".to_string();
        settings.logging.format = LogFormat::Pretty;
        settings.normalize();
        settings
    }

    /// Production preset: defaults with JSON logs.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Applies derived settings: error details are always shown in debug
    /// mode.
    pub fn normalize(&mut self) {
        if self.app.debug {
            self.app.display_error_details = true;
        }
    }

    /// Returns `true` if rendered errors should carry details.
    #[must_use]
    pub const fn shows_error_details(&self) -> bool {
        self.app.debug || self.app.display_error_details
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `app.http_version` is not a supported version
    /// - `app.default_content_type` is empty
    /// - `logging.level` is not a known level
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !HTTP_VERSIONS.contains(&self.app.http_version.as_str()) {
            return Err(ConfigError::invalid_value(
                "app.http_version",
                format!("unsupported HTTP version: {}", self.app.http_version),
            ));
        }

        if self.app.default_content_type.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "app.default_content_type",
                "must not be empty",
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown level: {}", self.logging.level),
            ));
        }

        Ok(())
    }
}

/// Builder for [`Settings`].
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Create a builder seeded with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application section.
    #[must_use]
    pub fn app(mut self, app: AppSettings) -> Self {
        self.settings.app = app;
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingSettings) -> Self {
        self.settings.logging = logging;
        self
    }

    /// Toggle debug mode.
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.settings.app.debug = debug;
        self
    }

    /// Build the settings, applying derived values.
    #[must_use]
    pub fn build(mut self) -> Settings {
        self.settings.normalize();
        self.settings
    }
}

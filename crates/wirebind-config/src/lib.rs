//! Typed settings for Wirebind applications.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use wirebind_config::ConfigLoader;
//!
//! # fn main() -> Result<(), wirebind_config::ConfigError> {
//! let settings = ConfigLoader::new()
//!     .with_optional_file("wirebind.toml")?
//!     .with_env_prefix("WIREBIND")
//!     .load()?;
//!
//! if settings.app.debug {
//!     // pretty JSON and `_debug` error details
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [app]
//! debug = false
//! display_error_details = false
//! validate_patterns = true
//! default_content_type = "text/html; charset=UTF-8"
//! http_version = "1.1"
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `WIREBIND__APP__DEBUG=true`
//! - `WIREBIND__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{Settings, SettingsBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{AppSettings, LogFormat, LoggingSettings};

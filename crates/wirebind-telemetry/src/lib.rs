//! Logging setup for Wirebind.
//!
//! Wirebind crates emit `tracing` events; this crate installs the
//! subscriber that formats them.
//!
//! | Level | Emitted when |
//! |-------|--------------|
//! | `trace` | a handler parameter is bound, with its source |
//! | `debug` | a scope guard skips its middleware, a converter rewrites an argument, an instance is constructed or reused |
//! | `warn` | a request ends in a not-found response |
//! | `error` | a 5xx error is rendered |
//!
//! # Example
//!
//! ```rust,no_run
//! use wirebind_config::Settings;
//! use wirebind_telemetry::{init_logging, LogConfig};
//!
//! let settings = Settings::development();
//! init_logging(&LogConfig::from_settings(&settings.logging)).unwrap();
//! ```

#![doc(html_root_url = "https://docs.rs/wirebind-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

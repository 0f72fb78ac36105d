//! Error types for Wirebind.
//!
//! This module provides the [`WireError`] type, the single error type
//! surfaced by pattern compilation, middleware scoping, argument conversion
//! and dependency resolution.
//!
//! # Categories
//!
//! | `ErrorCategory` | Raised by | HTTP status |
//! |---|---|---|
//! | `Configuration` | unknown class/method, bad pattern, missing service | 500 |
//! | `Resolution` | a handler parameter no source can satisfy | 500 |
//! | `NotFound` | a required converted argument is missing, no route matched | 404 |
//! | `Internal` | invariants broken inside the framework | 500 |
//! | `Application` | user converters and handlers | 500, or the status given to [`WireError::http`] |
//!
//! Only the `NotFound` category is an expected, routine failure. Every other
//! category is a programmer error and is surfaced immediately.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`WireError`].
pub type WireResult<T> = Result<T, WireError>;

/// Categories of errors for classification and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Misconfiguration: unknown class, uncallable method, invalid pattern.
    Configuration,
    /// A declared parameter could not be satisfied.
    Resolution,
    /// The request addresses something that does not exist.
    NotFound,
    /// Internal framework errors.
    Internal,
    /// Errors raised by user-supplied converters or handlers.
    Application,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Configuration | Self::Resolution | Self::Internal | Self::Application => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Standard error type for Wirebind.
///
/// # Example
///
/// ```
/// use wirebind_core::{ErrorCategory, WireError};
///
/// let err = WireError::required_conversion_missing("id");
/// assert_eq!(err.category(), ErrorCategory::NotFound);
/// assert_eq!(err.to_string(), "Required value \"id\" not loaded");
/// ```
#[derive(Error, Debug)]
pub enum WireError {
    /// A class-method target names a class that was never registered.
    #[error("Controller \"{class}\" does not exist")]
    ClassNotFound {
        /// The class name as written in the target.
        class: String,
    },

    /// The derived method does not exist on the class.
    #[error("Unknown method \"{method}\" on class {class}")]
    MethodNotCallable {
        /// The class name.
        class: String,
        /// The method stub as written in the target.
        method: String,
    },

    /// An instance method was targeted on a class without a constructor.
    #[error("\"{class}\" is not instantiable")]
    NotInstantiable {
        /// The class name.
        class: String,
    },

    /// A path pattern could not be compiled or failed validation.
    #[error("Pattern is invalid ({pattern}): {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No route carries the requested name.
    #[error("Named route does not exist for name: {name}")]
    RouteNotNamed {
        /// The requested route name.
        name: String,
    },

    /// A placeholder has neither supplied data nor a default segment.
    #[error("Missing data for URL segment: {segment}")]
    MissingRouteData {
        /// The pattern being filled.
        pattern: String,
        /// The placeholder name.
        segment: String,
    },

    /// A named service was requested but is not registered.
    #[error("Service \"{name}\" is not registered")]
    ServiceNotFound {
        /// The service name.
        name: String,
    },

    /// No source in the precedence chain could supply a parameter.
    #[error("Cannot resolve parameter \"{parameter}\"")]
    UnresolvableParameter {
        /// The declared parameter name.
        parameter: String,
    },

    /// A converter flagged as required produced no value.
    #[error("Required value \"{argument}\" not loaded")]
    RequiredConversionMissing {
        /// The route argument name.
        argument: String,
    },

    /// Generic not-found signal.
    #[error("Not found: {message}")]
    NotFound {
        /// Diagnostic message (only shown in debug mode).
        message: String,
    },

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// An error a handler raised with an explicit HTTP status.
    #[error("{message}")]
    Http {
        /// Status to render.
        status: StatusCode,
        /// Public message.
        message: String,
    },

    /// Error raised by a user-supplied converter or handler.
    #[error(transparent)]
    Application(anyhow::Error),
}

impl WireError {
    /// Creates a class-not-found error.
    #[must_use]
    pub fn class_not_found(class: impl Into<String>) -> Self {
        Self::ClassNotFound {
            class: class.into(),
        }
    }

    /// Creates a method-not-callable error.
    #[must_use]
    pub fn method_not_callable(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::MethodNotCallable {
            class: class.into(),
            method: method.into(),
        }
    }

    /// Creates a not-instantiable error.
    #[must_use]
    pub fn not_instantiable(class: impl Into<String>) -> Self {
        Self::NotInstantiable {
            class: class.into(),
        }
    }

    /// Creates an invalid pattern error.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Creates a route-not-named error.
    #[must_use]
    pub fn route_not_named(name: impl Into<String>) -> Self {
        Self::RouteNotNamed { name: name.into() }
    }

    /// Creates a missing-route-data error.
    #[must_use]
    pub fn missing_route_data(pattern: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::MissingRouteData {
            pattern: pattern.into(),
            segment: segment.into(),
        }
    }

    /// Creates a service-not-found error.
    #[must_use]
    pub fn service_not_found(name: impl Into<String>) -> Self {
        Self::ServiceNotFound { name: name.into() }
    }

    /// Creates an unresolvable parameter error.
    #[must_use]
    pub fn unresolvable_parameter(parameter: impl Into<String>) -> Self {
        Self::UnresolvableParameter {
            parameter: parameter.into(),
        }
    }

    /// Creates the not-found error raised by a required converter.
    #[must_use]
    pub fn required_conversion_missing(argument: impl Into<String>) -> Self {
        Self::RequiredConversionMissing {
            argument: argument.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an error rendered with `status`.
    #[must_use]
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Wraps an error raised by user code.
    pub fn application(source: impl Into<anyhow::Error>) -> Self {
        Self::Application(source.into())
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ClassNotFound { .. }
            | Self::MethodNotCallable { .. }
            | Self::NotInstantiable { .. }
            | Self::InvalidPattern { .. }
            | Self::RouteNotNamed { .. }
            | Self::MissingRouteData { .. }
            | Self::ServiceNotFound { .. } => ErrorCategory::Configuration,
            Self::UnresolvableParameter { .. } => ErrorCategory::Resolution,
            Self::RequiredConversionMissing { .. } | Self::NotFound { .. } => {
                ErrorCategory::NotFound
            }
            Self::Internal { .. } => ErrorCategory::Internal,
            Self::Http { .. } | Self::Application(_) => ErrorCategory::Application,
        }
    }

    /// Returns `true` for the not-found category.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.category(), ErrorCategory::NotFound)
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Http { status, .. } => *status,
            _ => self.category().default_status_code(),
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ClassNotFound { .. } => "CLASS_NOT_FOUND",
            Self::MethodNotCallable { .. } => "METHOD_NOT_CALLABLE",
            Self::NotInstantiable { .. } => "NOT_INSTANTIABLE",
            Self::InvalidPattern { .. } => "INVALID_PATTERN",
            Self::RouteNotNamed { .. } => "ROUTE_NOT_NAMED",
            Self::MissingRouteData { .. } => "MISSING_ROUTE_DATA",
            Self::ServiceNotFound { .. } => "SERVICE_NOT_FOUND",
            Self::UnresolvableParameter { .. } => "UNRESOLVABLE_PARAMETER",
            Self::RequiredConversionMissing { .. } | Self::NotFound { .. } => "NOT_FOUND",
            Self::Internal { .. } => "INTERNAL_ERROR",
            Self::Http { .. } => "HTTP_ERROR",
            Self::Application(_) => "APPLICATION_ERROR",
        }
    }

    /// Describes this error and its source chain as JSON debug data.
    #[must_use]
    pub fn debug_data(&self) -> serde_json::Value {
        let mut chain = Vec::new();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }

        serde_json::json!({
            "exception": {
                "code": self.error_code(),
                "category": self.category(),
                "message": self.to_string(),
                "chain": chain,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors() {
        let err = WireError::class_not_found("UserController");
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.to_string(), "Controller \"UserController\" does not exist");

        let err = WireError::method_not_callable("UserController", "list");
        assert!(err.to_string().contains("list"));
        assert!(err.to_string().contains("UserController"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_url_generation_errors() {
        let err = WireError::route_not_named("home");
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.to_string(), "Named route does not exist for name: home");

        let err = WireError::missing_route_data("/users/{id}/", "id");
        assert_eq!(err.error_code(), "MISSING_ROUTE_DATA");
        assert_eq!(err.to_string(), "Missing data for URL segment: id");
    }

    #[test]
    fn test_unresolvable_parameter() {
        let err = WireError::unresolvable_parameter("db");
        assert_eq!(err.category(), ErrorCategory::Resolution);
        assert_eq!(err.to_string(), "Cannot resolve parameter \"db\"");
    }

    #[test]
    fn test_not_found_category() {
        assert!(WireError::required_conversion_missing("id").is_not_found());
        assert!(WireError::not_found("nothing here").is_not_found());
        assert!(!WireError::internal("boom").is_not_found());
        assert_eq!(
            WireError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_application_error_is_transparent() {
        let err = WireError::application(anyhow::anyhow!("database offline"));
        assert_eq!(err.to_string(), "database offline");
        assert_eq!(err.category(), ErrorCategory::Application);
    }

    #[test]
    fn test_http_error_keeps_status() {
        let err = WireError::http(StatusCode::FORBIDDEN, "Members only");
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Members only");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_debug_data_contains_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = WireError::internal_with_source("cannot load", io);
        let data = err.debug_data();

        assert_eq!(data["exception"]["code"], "INTERNAL_ERROR");
        assert_eq!(data["exception"]["category"], "internal");
        assert_eq!(data["exception"]["chain"][0], "disk gone");
    }
}

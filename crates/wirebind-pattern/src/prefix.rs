//! Group prefixes and route pattern validation.

use std::sync::Arc;
use wirebind_core::{WireError, WireResult};

/// Joins group patterns (outermost first) and a relative pattern.
///
/// Patterns are concatenated verbatim, so `["/api", "/v1"]` and `"/users/"`
/// yield `/api/v1/users/`.
///
/// ```
/// use wirebind_pattern::join_prefix;
///
/// assert_eq!(join_prefix(&["/api", "/v1"], "/users/"), "/api/v1/users/");
/// assert_eq!(join_prefix::<&str>(&[], "/health/"), "/health/");
/// ```
#[must_use]
pub fn join_prefix<S: AsRef<str>>(groups: &[S], pattern: &str) -> String {
    let mut full: String = groups.iter().map(AsRef::as_ref).collect();
    full.push_str(pattern);
    full
}

/// Predicate deciding whether a route pattern may be registered.
pub type ValidatorFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Checks route patterns at registration time.
#[derive(Clone)]
pub struct PatternValidator {
    check: Option<ValidatorFn>,
}

impl PatternValidator {
    /// The default rule: a pattern ends with `/` or contains a `.`, not both.
    #[must_use]
    pub fn trailing_slash_xor_extension() -> Self {
        Self::custom(|pattern| pattern.ends_with('/') ^ pattern.contains('.'))
    }

    /// A validator using a custom predicate.
    pub fn custom<F>(check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            check: Some(Arc::new(check)),
        }
    }

    /// A validator that accepts everything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { check: None }
    }

    /// Returns `true` if the pattern passes.
    #[must_use]
    pub fn accepts(&self, pattern: &str) -> bool {
        self.check.as_ref().map_or(true, |check| check(pattern))
    }

    /// Checks a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidPattern`] if the pattern is rejected.
    pub fn validate(&self, pattern: &str) -> WireResult<()> {
        if self.accepts(pattern) {
            Ok(())
        } else {
            Err(WireError::invalid_pattern(
                pattern,
                "must end with a trailing slash or contain an extension",
            ))
        }
    }
}

impl Default for PatternValidator {
    fn default() -> Self {
        Self::trailing_slash_xor_extension()
    }
}

impl std::fmt::Debug for PatternValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternValidator")
            .field("enabled", &self.check.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule() {
        let validator = PatternValidator::default();

        assert!(validator.accepts("/users/"));
        assert!(validator.accepts("/feed.xml"));
        assert!(!validator.accepts("/users"));
        assert!(!validator.accepts("/v1.0/users/"));
    }

    #[test]
    fn test_validate_error() {
        let err = PatternValidator::default().validate("/users").unwrap_err();
        assert!(matches!(err, WireError::InvalidPattern { .. }));
        assert!(err.to_string().contains("/users"));
    }

    #[test]
    fn test_disabled_and_custom() {
        assert!(PatternValidator::disabled().accepts("anything"));

        let only_api = PatternValidator::custom(|p| p.starts_with("/api"));
        assert!(only_api.validate("/api/x").is_ok());
        assert!(only_api.validate("/x").is_err());
    }

    #[test]
    fn test_join_prefix_nested() {
        assert_eq!(join_prefix(&["/a", "/b", "/c"], "/"), "/a/b/c/");
        assert_eq!(join_prefix(&["/api"], ""), "/api");
    }
}

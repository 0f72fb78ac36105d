//! Path pattern matching for Wirebind.
//!
//! This crate decides whether a path falls inside a middleware scope. It does
//! not route requests; it only answers "does this path match".
//!
//! # Pattern syntax
//!
//! - A spec without `{` is a literal and is compared by prefix or equality.
//! - `{name}` matches one path segment (`[^/]+`).
//! - `{name:expr}` matches the regular expression `expr`.
//!
//! Captures are never extracted. Template patterns are always anchored at the
//! start, and at the end only when compiled for exact matching.
//! [`expand_template`] goes the other way and fills placeholders to build a
//! path.
//!
//! # Example
//!
//! ```rust
//! use wirebind_pattern::{ExclusionSet, PathPattern};
//!
//! let scope = PathPattern::compile("/api", true).unwrap();
//! let excluded = ExclusionSet::compile(["/api/health"]).unwrap();
//!
//! let applies = |path: &str| scope.matches(path) && !excluded.excludes(path);
//!
//! assert!(applies("/api/users"));
//! assert!(applies("/api/health/detail"));
//! assert!(!applies("/api/health"));
//! assert!(!applies("/public"));
//! ```

mod pattern;
mod prefix;

pub use pattern::{expand_template, ExclusionSet, MatchMode, PathPattern};
pub use prefix::{join_prefix, PatternValidator, ValidatorFn};

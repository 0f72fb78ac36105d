//! The matched route.
//!
//! A [`RouteContext`] is created by the host once a request has been matched
//! to a registered route. It carries the captured path arguments, which the
//! argument converters rewrite in place before the handler runs.

use crate::Value;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Handle to the route matched for the current request.
///
/// Clones share the same argument table, so a conversion performed through
/// one handle is observed by every other handle for the same match.
///
/// # Example
///
/// ```
/// use wirebind_core::{RouteContext, Value};
///
/// let route = RouteContext::new("/users/{id}").with_raw_argument("id", "42");
/// assert_eq!(route.argument("id").and_then(|v| v.as_str().map(str::to_owned)), Some("42".into()));
///
/// route.set_argument("id", Some(Value::new(42_u64)));
/// assert_eq!(route.argument("id").and_then(|v| v.downcast_ref::<u64>().copied()), Some(42));
/// ```
#[derive(Clone)]
pub struct RouteContext {
    inner: Arc<Inner>,
}

struct Inner {
    pattern: String,
    name: Option<String>,
    arguments: RwLock<IndexMap<String, Option<Value>>>,
}

impl RouteContext {
    /// Creates a context for a route with no captured arguments.
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self::build(pattern.into(), None, IndexMap::new())
    }

    /// Creates a context from raw captured strings.
    #[must_use]
    pub fn with_arguments<I, K, V>(pattern: impl Into<String>, name: Option<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let arguments = arguments
            .into_iter()
            .map(|(key, value)| (key.into(), Some(Value::new(value.into()))))
            .collect();
        Self::build(pattern.into(), name, arguments)
    }

    fn build(pattern: String, name: Option<String>, arguments: IndexMap<String, Option<Value>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                pattern,
                name,
                arguments: RwLock::new(arguments),
            }),
        }
    }

    /// Adds a raw string argument and returns the context.
    #[must_use]
    pub fn with_raw_argument(self, name: impl Into<String>, raw: impl Into<String>) -> Self {
        self.set_argument(name, Some(Value::new(raw.into())));
        self
    }

    /// Returns the full route pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.inner.pattern
    }

    /// Returns the route name, if one was given.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Returns the argument stored under `name`. Absent and null both yield `None`.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<Value> {
        self.inner.arguments.read().get(name).cloned().flatten()
    }

    /// Returns `true` if an argument slot exists under `name`, even a null one.
    #[must_use]
    pub fn has_argument(&self, name: &str) -> bool {
        self.inner.arguments.read().contains_key(name)
    }

    /// Stores `value` under `name`, replacing the previous value.
    pub fn set_argument(&self, name: impl Into<String>, value: Option<Value>) {
        self.inner.arguments.write().insert(name.into(), value);
    }

    /// Returns a snapshot of all arguments in capture order.
    #[must_use]
    pub fn arguments(&self) -> Vec<(String, Option<Value>)> {
        self.inner
            .arguments
            .read()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Returns `true` if both handles refer to the same match.
    #[must_use]
    pub fn same_match(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for RouteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteContext")
            .field("pattern", &self.inner.pattern)
            .field("name", &self.inner.name)
            .field("arguments", &*self.inner.arguments.read())
            .finish()
    }
}

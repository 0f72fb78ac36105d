//! Named service registry.
//!
//! The [`Container`] stores services under string names. It is consulted by
//! the dependency resolver when a handler parameter is not satisfied by the
//! request, the response, the continuation, request attributes or route
//! arguments.
//!
//! Entries are either shared values or factories. A factory runs on the
//! first `get` and its result is memoised for the lifetime of the container.
//!
//! # Example
//!
//! ```rust
//! use wirebind_core::di::Container;
//! use wirebind_core::Value;
//! use std::sync::Arc;
//!
//! struct Database {
//!     dsn: String,
//! }
//!
//! let mut container = Container::new();
//! container.set("db", Database { dsn: "postgres://localhost/app".to_string() });
//! container.factory("greeting", |_| Ok(Value::from("hello")));
//!
//! assert!(container.has("db"));
//! let db: Arc<Database> = container.get_as("db").unwrap();
//! assert_eq!(db.dsn, "postgres://localhost/app");
//! assert_eq!(container.get("greeting").unwrap().as_str(), Some("hello"));
//! ```

use crate::{Value, WireError, WireResult};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A lazily evaluated service constructor.
pub type Factory = Arc<dyn Fn(&Container) -> WireResult<Value> + Send + Sync>;

enum Entry {
    Shared(Value),
    Factory {
        factory: Factory,
        resolved: OnceLock<Value>,
    },
}

/// A named service registry.
///
/// # Thread Safety
///
/// The container is `Send + Sync`. Registration needs `&mut self`, so the
/// usual lifecycle is: register everything at startup, then share the
/// container behind an `Arc`. Factory memoisation is first-writer-wins.
#[derive(Default)]
pub struct Container {
    entries: HashMap<String, Entry>,
}

impl Container {
    /// Creates a new empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers a shared service under `name`, replacing any previous entry.
    pub fn set<T: Any + Send + Sync>(&mut self, name: impl Into<String>, service: T) {
        self.set_value(name, Value::new(service));
    }

    /// Registers an already wrapped value under `name`.
    pub fn set_value(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), Entry::Shared(value));
    }

    /// Registers a factory under `name`, replacing any previous entry.
    pub fn factory<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Container) -> WireResult<Value> + Send + Sync + 'static,
    {
        self.entries.insert(
            name.into(),
            Entry::Factory {
                factory: Arc::new(factory),
                resolved: OnceLock::new(),
            },
        );
    }

    /// Registers a factory only if nothing is registered under `name` yet.
    pub fn factory_if_absent<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Container) -> WireResult<Value> + Send + Sync + 'static,
    {
        if !self.has(name) {
            self.factory(name, factory);
        }
    }

    /// Registers a service keyed by its type name.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.set_value(std::any::type_name::<T>(), Value::from_arc(service));
    }

    /// Resolves a service registered with [`Container::register`].
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.get(std::any::type_name::<T>())
            .ok()
            .and_then(|value| value.downcast::<T>())
    }

    /// Checks if an entry exists under `name`.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the service registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::ServiceNotFound`] if nothing is registered, or the
    /// factory's error if it fails.
    pub fn get(&self, name: &str) -> WireResult<Value> {
        match self.entries.get(name) {
            None => Err(WireError::service_not_found(name)),
            Some(Entry::Shared(value)) => Ok(value.clone()),
            Some(Entry::Factory { factory, resolved }) => {
                if let Some(value) = resolved.get() {
                    return Ok(value.clone());
                }
                let value = factory(self)?;
                // A concurrent first call may have won; keep whichever landed.
                let _ = resolved.set(value);
                resolved
                    .get()
                    .cloned()
                    .ok_or_else(|| WireError::internal(format!("factory \"{name}\" lost its value")))
            }
        }
    }

    /// Returns the service registered under `name` as an `Arc<T>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is missing or is not a `T`.
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> WireResult<Arc<T>> {
        let value = self.get(name)?;
        value.downcast::<T>().ok_or_else(|| {
            WireError::internal(format!(
                "service \"{name}\" is a {}, not a {}",
                value.tag().name(),
                std::any::type_name::<T>()
            ))
        })
    }

    /// Returns the number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the registered names in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestService {
        value: String,
    }

    #[test]
    fn test_container_new() {
        let container = Container::new();
        assert!(container.is_empty());
        assert_eq!(container.len(), 0);
    }

    #[test]
    fn test_set_and_get() {
        let mut container = Container::new();
        container.set(
            "service",
            TestService {
                value: "hello".to_string(),
            },
        );

        assert!(container.has("service"));
        let service: Arc<TestService> = container.get_as("service").unwrap();
        assert_eq!(service.value, "hello");
    }

    #[test]
    fn test_get_missing() {
        let container = Container::new();
        let err = container.get("missing").unwrap_err();
        assert!(matches!(err, WireError::ServiceNotFound { .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_get_as_wrong_type() {
        let mut container = Container::new();
        container.set("number", 5_u32);
        let err = container.get_as::<String>("number").unwrap_err();
        assert!(err.to_string().contains("u32"));
    }

    #[test]
    fn test_factory_is_memoised() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut container = Container::new();
        container.factory("counter", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::new(7_u32))
        });

        let first = container.get("counter").unwrap();
        let second = container.get("counter").unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory_can_use_container() {
        let mut container = Container::new();
        container.set("name", "wirebind".to_string());
        container.factory("greeting", |c| {
            let name = c.get_as::<String>("name")?;
            Ok(Value::new(format!("hello {name}")))
        });

        assert_eq!(
            container.get("greeting").unwrap().as_str(),
            Some("hello wirebind")
        );
    }

    #[test]
    fn test_factory_if_absent_keeps_existing() {
        let mut container = Container::new();
        container.set("response", "custom".to_string());
        container.factory_if_absent("response", |_| Ok(Value::from("default")));

        assert_eq!(container.get("response").unwrap().as_str(), Some("custom"));
    }

    #[test]
    fn test_typed_register_and_resolve() {
        let mut container = Container::new();
        container.register(Arc::new(TestService {
            value: "typed".to_string(),
        }));

        let service = container.resolve::<TestService>().unwrap();
        assert_eq!(service.value, "typed");
        assert!(container.resolve::<String>().is_none());
    }

    #[test]
    fn test_container_debug() {
        let mut container = Container::new();
        container.set("a", 1_u8);
        let debug = format!("{:?}", container);
        assert!(debug.contains("Container"));
        assert!(debug.contains("service_count"));
    }
}

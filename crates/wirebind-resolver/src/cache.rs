//! Per-resolver instance cache.

use crate::class::Instance;
use dashmap::DashMap;
use std::fmt;
use tracing::debug;
use wirebind_core::WireResult;

/// At most one constructed instance per class.
///
/// The cache is owned by the application and shared by every resolution it
/// performs. Construction happens outside any lock; if two calls race to
/// build the same class, the first insert wins and the other instance is
/// dropped.
#[derive(Default)]
pub struct InstanceCache {
    instances: DashMap<String, Instance>,
}

impl InstanceCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached instance of `class`, building it if absent.
    ///
    /// # Errors
    ///
    /// Returns the error of `build`; nothing is cached in that case.
    pub fn get_or_try_insert<F>(&self, class: &str, build: F) -> WireResult<Instance>
    where
        F: FnOnce() -> WireResult<Instance>,
    {
        if let Some(instance) = self.instances.get(class) {
            debug!(class, "reusing cached instance");
            return Ok(instance.value().clone());
        }

        let built = build()?;
        let instance = self
            .instances
            .entry(class.to_string())
            .or_insert(built)
            .value()
            .clone();
        debug!(class, "constructed instance");
        Ok(instance)
    }

    /// Returns the cached instance of `class`, if any.
    #[must_use]
    pub fn get(&self, class: &str) -> Option<Instance> {
        self.instances.get(class).map(|entry| entry.value().clone())
    }

    /// Returns `true` if `class` has been constructed.
    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.instances.contains_key(class)
    }

    /// Returns the number of cached instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` if nothing has been constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceCache")
            .field("instance_count", &self.instances.len())
            .finish()
    }
}

//! Route groups.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use wirebind_core::WireResult;
use wirebind_middleware::{ArgumentConverters, BoxedMiddleware, ConverterSpec, Middleware};
use wirebind_resolver::{CallableResolver, Target};

/// A pattern prefix shared by the routes registered inside it.
///
/// Middleware and converters added to a group apply to every route the
/// group callback registers, including routes of nested groups.
pub struct RouteGroup {
    pattern: String,
    resolver: CallableResolver,
    middleware: RwLock<Vec<BoxedMiddleware>>,
    converters: ArgumentConverters,
}

impl RouteGroup {
    pub(crate) fn new(pattern: impl Into<String>, resolver: CallableResolver) -> Self {
        Self {
            pattern: pattern.into(),
            resolver,
            middleware: RwLock::new(Vec::new()),
            converters: ArgumentConverters::new(),
        }
    }

    /// Returns the group's own pattern, without enclosing groups.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Resolves `target` and adds it as group middleware.
    ///
    /// # Errors
    ///
    /// Returns the resolution error.
    pub fn add(&self, target: Target) -> WireResult<&Self> {
        let middleware = self.resolver.resolve(target)?;
        Ok(self.add_middleware(middleware))
    }

    /// Adds group middleware.
    pub fn add_middleware<M: Middleware>(&self, middleware: M) -> &Self {
        self.push(Arc::new(middleware));
        self
    }

    /// Registers a converter for the route argument `argument`.
    ///
    /// The converter middleware joins the group on the first registration;
    /// later registrations reuse it.
    pub fn convert(&self, argument: impl Into<String>, spec: ConverterSpec) -> &Self {
        if let Some(middleware) = self.converters.register(argument, spec) {
            self.push(middleware);
        }
        self
    }

    /// Returns the group's converters.
    #[must_use]
    pub const fn converters(&self) -> &ArgumentConverters {
        &self.converters
    }

    /// Returns a snapshot of the group middleware in registration order.
    #[must_use]
    pub fn middleware(&self) -> Vec<BoxedMiddleware> {
        self.middleware.read().clone()
    }

    fn push(&self, middleware: BoxedMiddleware) {
        self.middleware.write().push(middleware);
    }
}

impl fmt::Debug for RouteGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteGroup")
            .field("pattern", &self.pattern)
            .field("middleware", &self.middleware.read().len())
            .field("converters", &self.converters)
            .finish_non_exhaustive()
    }
}

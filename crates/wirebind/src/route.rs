//! Registered routes.
//!
//! Matching a request to a route is the host's job: it reads
//! [`App::routes`](crate::App::routes), matches the request however it
//! likes, and hands the result to [`App::handle`](crate::App::handle) as a
//! [`RouteMatch`].

use crate::group::RouteGroup;
use http::Method;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use wirebind_core::WireResult;
use wirebind_middleware::{BoxedMiddleware, Middleware};
use wirebind_resolver::{CallableResolver, ResolvedCallable, Target};

/// Methods registered by [`App::any`](crate::App::any).
pub const ANY_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// A route matched by the host, with its raw captured arguments.
///
/// # Example
///
/// ```
/// use wirebind::RouteMatch;
///
/// let matched = RouteMatch::new(0, [("id", "42")]);
/// assert_eq!(matched.route_id(), 0);
/// assert_eq!(matched.argument("id"), Some("42"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    route_id: usize,
    arguments: Vec<(String, String)>,
}

impl RouteMatch {
    /// Creates a match for the route with `route_id`.
    pub fn new<I, K, V>(route_id: usize, arguments: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            route_id,
            arguments: arguments
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    /// Creates a match for a route without captured arguments.
    #[must_use]
    pub const fn empty(route_id: usize) -> Self {
        Self {
            route_id,
            arguments: Vec::new(),
        }
    }

    /// Returns the matched route id.
    #[must_use]
    pub const fn route_id(&self) -> usize {
        self.route_id
    }

    /// Returns the raw captured arguments.
    #[must_use]
    pub fn arguments(&self) -> &[(String, String)] {
        &self.arguments
    }

    /// Returns one raw captured argument.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Listing entry for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// Route id, used in [`RouteMatch`].
    pub id: usize,
    /// Route name, if set.
    pub name: Option<String>,
    /// Accepted methods.
    pub methods: Vec<Method>,
    /// Pattern with all group prefixes applied.
    pub pattern: String,
}

/// A registered route.
pub struct Route {
    id: usize,
    methods: Vec<Method>,
    pattern: String,
    name: RwLock<Option<String>>,
    handler: ResolvedCallable,
    middleware: RwLock<Vec<BoxedMiddleware>>,
    groups: Vec<Arc<RouteGroup>>,
    resolver: CallableResolver,
}

impl Route {
    pub(crate) fn new(
        id: usize,
        methods: Vec<Method>,
        pattern: String,
        handler: ResolvedCallable,
        groups: Vec<Arc<RouteGroup>>,
        resolver: CallableResolver,
    ) -> Self {
        Self {
            id,
            methods,
            pattern,
            name: RwLock::new(None),
            handler,
            middleware: RwLock::new(Vec::new()),
            groups,
            resolver,
        }
    }

    /// Returns the route id.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Returns the accepted methods.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Returns the pattern with group prefixes applied.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the route name.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.name.read().clone()
    }

    /// Names the route.
    pub fn set_name(&self, name: impl Into<String>) -> &Self {
        *self.name.write() = Some(name.into());
        self
    }

    /// Resolves `target` and adds it as route middleware.
    ///
    /// # Errors
    ///
    /// Returns the resolution error.
    pub fn add(&self, target: Target) -> WireResult<&Self> {
        let middleware = self.resolver.resolve(target)?;
        Ok(self.add_middleware(middleware))
    }

    /// Adds route middleware.
    pub fn add_middleware<M: Middleware>(&self, middleware: M) -> &Self {
        self.middleware.write().push(Arc::new(middleware));
        self
    }

    /// Returns the listing entry.
    #[must_use]
    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            id: self.id,
            name: self.name(),
            methods: self.methods.clone(),
            pattern: self.pattern.clone(),
        }
    }

    pub(crate) const fn handler(&self) -> &ResolvedCallable {
        &self.handler
    }

    /// Group middleware from the outermost group inwards, then route
    /// middleware; the most recently added runs first within each level.
    pub(crate) fn stages(&self) -> Vec<BoxedMiddleware> {
        let mut stages: Vec<BoxedMiddleware> = Vec::new();
        for group in &self.groups {
            stages.extend(group.middleware().into_iter().rev());
        }
        stages.extend(self.middleware.read().iter().rev().cloned());
        stages
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("methods", &self.methods)
            .field("pattern", &self.pattern)
            .field("name", &self.name())
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

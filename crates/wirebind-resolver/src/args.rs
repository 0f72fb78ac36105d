//! Raw call arguments.
//!
//! A resolved handler is called with one of two argument shapes, modelled as
//! [`RawArguments`] variants instead of being told apart at runtime:
//!
//! - `Call`: a request, a response and either a continuation (middleware)
//!   or an extra-arguments list (terminal handler).
//! - `Root`: a single root-context value, used when a group callback runs at
//!   registration time with no request in scope.

use std::any::Any;
use std::sync::Arc;
use wirebind_core::{Request, Response, RouteContext, TypeTag, Value};
use wirebind_middleware::Next;

/// Extra arguments passed to a handler, in order, optionally named.
///
/// Type matching scans entries by [`TypeTag`] equality; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct ExtraArgs {
    entries: Vec<(Option<String>, Option<Value>)>,
}

impl ExtraArgs {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a named list from the route's current arguments.
    #[must_use]
    pub fn from_route(route: &RouteContext) -> Self {
        Self {
            entries: route
                .arguments()
                .into_iter()
                .map(|(name, value)| (Some(name), value))
                .collect(),
        }
    }

    /// Appends an unnamed value.
    #[must_use]
    pub fn with(mut self, value: Value) -> Self {
        self.entries.push((None, Some(value)));
        self
    }

    /// Appends a named value, which may be null.
    #[must_use]
    pub fn with_named(mut self, name: impl Into<String>, value: Option<Value>) -> Self {
        self.entries.push((Some(name.into()), value));
        self
    }

    /// Returns the first non-null value named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.entries
            .iter()
            .filter(|(key, _)| key.as_deref() == Some(name))
            .find_map(|(_, value)| value.clone())
    }

    /// Returns the first value whose tag equals `tag`.
    #[must_use]
    pub fn find_by_tag(&self, tag: TypeTag) -> Option<Value> {
        self.entries
            .iter()
            .filter_map(|(_, value)| value.as_ref())
            .find(|value| value.tag() == tag)
            .cloned()
    }

    /// Returns the first value of type `T`.
    #[must_use]
    pub fn find<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.find_by_tag(TypeTag::of::<T>())
            .and_then(|value| value.downcast::<T>())
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, Option<&Value>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_deref(), value.as_ref()))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What follows the request and response in a `Call`.
#[derive(Debug, Clone)]
pub enum Tail {
    /// Invoked as middleware.
    Next(Next),
    /// Invoked as a terminal handler.
    Args(ExtraArgs),
}

/// The arguments a resolved handler is called with.
#[derive(Debug, Clone)]
pub enum RawArguments {
    /// A normal request-time call.
    Call {
        /// The active request.
        request: Request,
        /// The active response.
        response: Response,
        /// Continuation or extra arguments.
        tail: Tail,
    },
    /// A registration-time call carrying only the root context.
    Root(Value),
}

impl RawArguments {
    /// A middleware-shaped call.
    #[must_use]
    pub fn middleware(request: Request, response: Response, next: Next) -> Self {
        Self::Call {
            request,
            response,
            tail: Tail::Next(next),
        }
    }

    /// A handler-shaped call.
    #[must_use]
    pub fn handler(request: Request, response: Response, args: ExtraArgs) -> Self {
        Self::Call {
            request,
            response,
            tail: Tail::Args(args),
        }
    }
}

/// Normalised view of the raw arguments used during resolution.
#[derive(Debug, Clone, Default)]
pub(crate) struct Frame {
    pub(crate) request: Option<Request>,
    pub(crate) response: Option<Response>,
    pub(crate) next: Option<Next>,
    pub(crate) route: Option<RouteContext>,
    pub(crate) args: ExtraArgs,
}

impl Frame {
    /// Normalises `raw`. `route` is the matched route of a terminal call;
    /// middleware calls take theirs from the continuation.
    pub(crate) fn from_raw(raw: RawArguments, route: Option<RouteContext>) -> Self {
        match raw {
            RawArguments::Root(root) => Self {
                args: ExtraArgs::new().with(root),
                ..Self::default()
            },
            RawArguments::Call {
                request,
                response,
                tail: Tail::Next(next),
            } => Self {
                request: Some(request),
                response: Some(response),
                route: next.route().cloned(),
                next: Some(next),
                args: ExtraArgs::new(),
            },
            RawArguments::Call {
                request,
                response,
                tail: Tail::Args(args),
            } => Self {
                request: Some(request),
                response: Some(response),
                next: None,
                route,
                args,
            },
        }
    }

    /// A frame for constructor dependencies: no continuation, no route, no
    /// extra arguments.
    pub(crate) fn for_constructor(&self) -> Self {
        Self {
            request: self.request.clone(),
            response: self.response.clone(),
            ..Self::default()
        }
    }
}

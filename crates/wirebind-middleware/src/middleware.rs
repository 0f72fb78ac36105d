//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait for request-processing units
//! that run before a handler, the [`Endpoint`] trait for the handler itself,
//! and the [`Next`] continuation that links them.
//!
//! # Example
//!
//! ```ignore
//! use wirebind_middleware::{BoxFuture, Middleware, Next};
//! use wirebind_core::{Request, Response, WireResult};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         request: Request,
//!         response: Response,
//!         next: Next,
//!     ) -> BoxFuture<'a, WireResult<Response>> {
//!         Box::pin(async move {
//!             let start = std::time::Instant::now();
//!             let response = next.run(request, response).await?;
//!             tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "request handled");
//!             Ok(response)
//!         })
//!     }
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use wirebind_core::{Container, Request, Response, RouteContext, WireResult};

/// A boxed future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A request-processing unit that runs around the handler.
///
/// # Invariants
///
/// - Middleware either calls `next.run()` once or short-circuits with its own
///   response or error
/// - Middleware does not suppress errors from downstream
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request.
    ///
    /// # Arguments
    ///
    /// * `request` - The incoming request
    /// * `response` - The response built so far
    /// * `next` - The rest of the pipeline
    fn process<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, WireResult<Response>>;
}

/// The terminal handler of a pipeline.
pub trait Endpoint: Send + Sync + 'static {
    /// Handles the request. `route` is the matched route, if any.
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        route: Option<RouteContext>,
    ) -> BoxFuture<'a, WireResult<Response>>;
}

/// Shared, immutable description of one pipeline run.
pub(crate) struct Chain {
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
    pub(crate) endpoint: Arc<dyn Endpoint>,
    pub(crate) route: Option<RouteContext>,
}

/// Continuation representing the rest of the pipeline.
///
/// `Next` is owned and cheap to clone. Besides the remaining stages it
/// carries the matched route and the service container that middleware
/// should resolve contextual services through.
#[derive(Clone)]
pub struct Next {
    chain: Arc<Chain>,
    index: usize,
    container: Arc<Container>,
}

impl Next {
    pub(crate) fn start(chain: Arc<Chain>, container: Arc<Container>) -> Self {
        Self {
            chain,
            index: 0,
            container,
        }
    }

    /// Invokes the next middleware, or the endpoint once middleware is exhausted.
    pub fn run(self, request: Request, response: Response) -> BoxFuture<'static, WireResult<Response>> {
        Box::pin(async move {
            match self.chain.middleware.get(self.index).cloned() {
                Some(middleware) => {
                    let next = Self {
                        chain: Arc::clone(&self.chain),
                        index: self.index + 1,
                        container: Arc::clone(&self.container),
                    };
                    middleware.process(request, response, next).await
                }
                None => {
                    let endpoint = Arc::clone(&self.chain.endpoint);
                    endpoint
                        .handle(request, response, self.chain.route.clone())
                        .await
                }
            }
        })
    }

    /// Returns the matched route, if the pipeline runs for one.
    #[must_use]
    pub fn route(&self) -> Option<&RouteContext> {
        self.chain.route.as_ref()
    }

    /// Returns the container services resolve through.
    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Returns a continuation whose context resolves through `container`.
    #[must_use]
    pub fn with_container(self, container: Arc<Container>) -> Self {
        Self { container, ..self }
    }

    /// Returns the number of middleware still to run before the endpoint.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chain.middleware.len().saturating_sub(self.index)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.remaining())
            .field("route", &self.chain.route)
            .finish()
    }
}

/// A middleware created from an async function.
///
/// # Example
///
/// ```ignore
/// let middleware = FnMiddleware::new("tag", |request: Request, response, next: Next| async move {
///     let request = request.with_attribute("tagged", Value::new(true));
///     next.run(request, response).await
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Request, Response, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = WireResult<Response>> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, WireResult<Response>> {
        Box::pin((self.func)(request, response, next))
    }
}

/// An endpoint created from an async function.
pub struct FnEndpoint<F> {
    func: F,
}

impl<F> FnEndpoint<F> {
    /// Creates a new function-based endpoint.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Endpoint for FnEndpoint<F>
where
    F: Fn(Request, Response, Option<RouteContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = WireResult<Response>> + Send + 'static,
{
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        route: Option<RouteContext>,
    ) -> BoxFuture<'a, WireResult<Response>> {
        Box::pin((self.func)(request, response, route))
    }
}

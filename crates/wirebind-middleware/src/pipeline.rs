//! Middleware pipeline assembly.
//!
//! A [`Pipeline`] is the ordered middleware stack for one dispatch, plus the
//! endpoint it ends in. Middleware runs in the order it was added to the
//! builder; callers that want "last added runs first" reverse before adding.

use crate::middleware::{Chain, Endpoint, Middleware, Next};
use std::sync::Arc;
use wirebind_core::{Container, Request, Response, RouteContext, WireResult};

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An assembled pipeline ready to run.
///
/// # Example
///
/// ```ignore
/// let pipeline = Pipeline::builder()
///     .container(container)
///     .route(route)
///     .middleware(auth)
///     .build(handler);
///
/// let response = pipeline.run(request, Response::new()).await?;
/// ```
pub struct Pipeline {
    chain: Arc<Chain>,
    container: Arc<Container>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs the request through every stage and the endpoint.
    pub async fn run(&self, request: Request, response: Response) -> WireResult<Response> {
        self.entry().run(request, response).await
    }

    /// Returns the continuation positioned at the first stage.
    #[must_use]
    pub fn entry(&self) -> Next {
        Next::start(Arc::clone(&self.chain), Arc::clone(&self.container))
    }

    /// Returns the names of all middleware stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.chain.middleware.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.chain.middleware.len()
    }
}

/// Builder for constructing a [`Pipeline`].
pub struct PipelineBuilder {
    middleware: Vec<BoxedMiddleware>,
    route: Option<RouteContext>,
    container: Option<Arc<Container>>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            middleware: Vec::new(),
            route: None,
            container: None,
        }
    }

    /// Appends a middleware stage.
    #[must_use]
    pub fn middleware<M: Middleware>(self, middleware: M) -> Self {
        self.boxed(Arc::new(middleware))
    }

    /// Appends an already shared middleware stage.
    #[must_use]
    pub fn boxed(mut self, middleware: BoxedMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Appends several shared stages in order.
    #[must_use]
    pub fn extend<I: IntoIterator<Item = BoxedMiddleware>>(mut self, stages: I) -> Self {
        self.middleware.extend(stages);
        self
    }

    /// Sets the matched route exposed through [`Next::route`].
    #[must_use]
    pub fn route(mut self, route: RouteContext) -> Self {
        self.route = Some(route);
        self
    }

    /// Sets the container exposed through [`Next::container`].
    #[must_use]
    pub fn container(mut self, container: Arc<Container>) -> Self {
        self.container = Some(container);
        self
    }

    /// Finishes the pipeline with `endpoint`.
    pub fn build<E: Endpoint>(self, endpoint: E) -> Pipeline {
        self.build_shared(Arc::new(endpoint))
    }

    /// Finishes the pipeline with a shared endpoint.
    pub fn build_shared(self, endpoint: Arc<dyn Endpoint>) -> Pipeline {
        Pipeline {
            chain: Arc::new(Chain {
                middleware: self.middleware,
                endpoint,
                route: self.route,
            }),
            container: self
                .container
                .unwrap_or_else(|| Arc::new(Container::new())),
        }
    }
}

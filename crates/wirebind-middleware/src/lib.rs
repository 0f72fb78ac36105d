//! # Wirebind Middleware
//!
//! Middleware plumbing for Wirebind.
//!
//! ## Flow
//!
//! ```text
//! Request → [ScopeGuard → mw]* → ArgumentConverters → Endpoint
//!                 │ outside scope
//!                 └──────────→ next stage
//! ```
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Middleware`] / [`Endpoint`] | Pipeline stages and the terminal handler |
//! | [`Next`] | Owned continuation carrying the route and container |
//! | [`Pipeline`] | Ordered stages plus endpoint |
//! | [`ScopeGuard`] | Runs a middleware only inside a path scope |
//! | [`ArgumentConverters`] | Converts route arguments before the handler |
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use wirebind_core::{Container, Request, Response, RouteContext};
//! use wirebind_middleware::{FnEndpoint, Pipeline};
//!
//! # tokio_test::block_on(async {
//! let pipeline = Pipeline::builder()
//!     .container(Arc::new(Container::new()))
//!     .build(FnEndpoint::new(
//!         |_req: Request, res: Response, _route: Option<RouteContext>| async move {
//!             Ok(res.with_body_string("hello"))
//!         },
//!     ));
//!
//! let request = Request::new(http::Method::GET, http::Uri::from_static("/"));
//! let response = pipeline.run(request, Response::new()).await.unwrap();
//! assert_eq!(response.body_text(), "hello");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/wirebind-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod convert;
mod middleware;
mod pipeline;
mod scope;

pub use convert::{ArgumentConverters, ConvertFn, ConverterSpec};
pub use middleware::{BoxFuture, Endpoint, FnEndpoint, FnMiddleware, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use scope::{ScopeGuard, ScopeGuardBuilder};

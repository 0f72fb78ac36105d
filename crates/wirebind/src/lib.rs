//! # Wirebind
//!
//! Handler binding for HTTP applications: resolve handlers and middleware
//! from class names or closures, bind their parameters by name and type,
//! scope middleware to path prefixes and convert route arguments before the
//! handler runs.
//!
//! Wirebind does not listen on sockets or match URLs. The host matches a
//! request against [`App::routes`] and hands the result to [`App::handle`].
//!
//! ## Quick Start
//!
//! ```
//! use http::{Method, Uri};
//! use wirebind::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let app = App::new(Settings::development());
//! let greet = app
//!     .get(
//!         "/hello/{name}/",
//!         Target::callable(
//!             Signature::names_only(["response", "name"]),
//!             |inv| async move {
//!                 let name = inv.str("name").unwrap_or_default();
//!                 let response = inv.response().unwrap_or_default();
//!                 Ok(Reply::from(response.with_body_string(format!("hello {name}"))))
//!             },
//!         ),
//!     )
//!     .unwrap();
//!
//! let request = Request::new(Method::GET, Uri::from_static("/hello/ada/"));
//! let matched = RouteMatch::new(greet.id(), [("name", "ada")]);
//! let response = app.handle(request, Some(matched)).await;
//! assert_eq!(response.body_text(), "hello ada");
//! # });
//! ```
//!
//! ## Dispatch order
//!
//! ```text
//! app middleware (last added first)
//!   → group middleware (outermost group first)
//!     → route middleware
//!       → handler
//! ```

#![doc(html_root_url = "https://docs.rs/wirebind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod group;
mod route;

pub use app::{App, AppBuilder};
pub use group::RouteGroup;
pub use route::{Route, RouteInfo, RouteMatch, ANY_METHODS};

pub use wirebind_config as config;
pub use wirebind_core as core;
pub use wirebind_middleware as middleware;
pub use wirebind_pattern as pattern;
pub use wirebind_resolver as resolver;
pub use wirebind_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use wirebind::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{App, AppBuilder, Route, RouteGroup, RouteInfo, RouteMatch};

    pub use wirebind_config::{ConfigLoader, Settings};

    pub use wirebind_core::{
        Container, Request, Response, RouteContext, Value, WireError, WireResult,
    };

    pub use wirebind_middleware::{ConverterSpec, Middleware, Next};

    pub use wirebind_resolver::{
        ClassBuilder, Controller, ControllerState, Invocation, ParamSpec, Reply, Signature,
        Target,
    };
}

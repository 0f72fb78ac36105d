//! # Wirebind Resolver
//!
//! Turns handler references into invokable units and binds every declared
//! parameter from the request-scoped context.
//!
//! ## Targets
//!
//! | Target | Resolved to |
//! |--------|-------------|
//! | [`Target::Method`] | a method of a registered [`ClassDescriptor`]; controllers derive `endpoint*`/`middleware*` names |
//! | [`Target::Callable`] | an async function with an explicit [`Signature`] |
//!
//! Instance methods run on one shared instance per class, held in the
//! resolver's [`InstanceCache`]. Constructor parameters are bound through the
//! same precedence chain as method parameters.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use wirebind_core::{Container, Request, Response, RouteContext};
//! use wirebind_middleware::Endpoint;
//! use wirebind_resolver::{CallableResolver, ClassRegistry, Reply, Signature, Target};
//!
//! let mut container = Container::new();
//! container.set("greeting", "hello".to_string());
//! let resolver = CallableResolver::new(Arc::new(container), Arc::new(ClassRegistry::new()));
//!
//! let handler = resolver
//!     .resolve(Target::callable(
//!         Signature::names_only(["greeting", "name"]),
//!         |inv| async move {
//!             let body = format!(
//!                 "{} {}",
//!                 inv.str("greeting").unwrap_or_default(),
//!                 inv.str("name").unwrap_or_default()
//!             );
//!             Ok(Reply::from(Response::new().with_body_string(body)))
//!         },
//!     ))
//!     .unwrap();
//!
//! # tokio_test::block_on(async {
//! let route = RouteContext::new("/hello/{name}").with_raw_argument("name", "world");
//! let request = Request::new(http::Method::GET, http::Uri::from_static("/hello/world"));
//! let response = handler.handle(request, Response::new(), Some(route)).await.unwrap();
//! assert_eq!(response.body_text(), "hello world");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/wirebind-resolver/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod args;
mod cache;
mod class;
mod invocation;
mod resolver;
mod signature;

pub use args::{ExtraArgs, RawArguments, Tail};
pub use cache::InstanceCache;
pub use class::{ClassBuilder, ClassDescriptor, ClassRegistry, Controller, ControllerState, Instance};
pub use invocation::{Invocation, Reply};
pub use resolver::{Callable, CallableResolver, ResolvedCallable, Target};
pub use signature::{ParamSpec, Signature};

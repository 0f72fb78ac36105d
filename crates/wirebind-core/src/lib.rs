//! # Wirebind Core
//!
//! Core types shared by every Wirebind crate.
//!
//! - [`WireError`] - Categorised error type
//! - [`Value`] / [`TypeTag`] - Type-erased, tag-matched values
//! - [`di::Container`] - Named service registry
//! - [`Request`] / [`Response`] - Immutable message values
//! - [`RouteContext`] - The matched route and its mutable arguments

#![doc(html_root_url = "https://docs.rs/wirebind-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod di;
mod error;
mod message;
pub mod render;
mod route;
mod value;

pub use di::Container;
pub use error::{ErrorCategory, WireError, WireResult};
pub use message::{Request, Response};
pub use route::RouteContext;
pub use value::{TypeTag, Value};

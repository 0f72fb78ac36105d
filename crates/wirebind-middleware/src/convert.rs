//! Route argument conversion.
//!
//! [`ArgumentConverters`] rewrites raw captured route arguments into typed
//! values before the handler runs. It is a gate: a converter marked
//! `required_if_null` that yields nothing aborts the request with a
//! not-found error and the handler never runs.

use crate::middleware::{BoxFuture, Middleware, Next};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use wirebind_core::{Request, Response, RouteContext, Value, WireError, WireResult};

/// A conversion function: `(raw, argument name, route) -> converted`.
pub type ConvertFn =
    Arc<dyn Fn(Option<Value>, &str, &RouteContext) -> WireResult<Option<Value>> + Send + Sync>;

/// One registered conversion.
#[derive(Clone)]
pub struct ConverterSpec {
    convert: ConvertFn,
    skip_if_null: bool,
    required_if_null: bool,
}

impl ConverterSpec {
    /// Creates a spec that always runs and accepts a null result.
    pub fn new<F>(convert: F) -> Self
    where
        F: Fn(Option<Value>, &str, &RouteContext) -> WireResult<Option<Value>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            convert: Arc::new(convert),
            skip_if_null: false,
            required_if_null: false,
        }
    }

    /// Leaves an absent raw argument untouched instead of converting it.
    #[must_use]
    pub const fn skip_if_null(mut self, skip: bool) -> Self {
        self.skip_if_null = skip;
        self
    }

    /// Aborts with a not-found error if the conversion yields nothing.
    #[must_use]
    pub const fn required_if_null(mut self, required: bool) -> Self {
        self.required_if_null = required;
        self
    }
}

impl fmt::Debug for ConverterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterSpec")
            .field("skip_if_null", &self.skip_if_null)
            .field("required_if_null", &self.required_if_null)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Inner {
    specs: RwLock<IndexMap<String, ConverterSpec>>,
    bound: AtomicBool,
}

/// Converters keyed by argument name; the last registration for a name wins.
///
/// Clones share the same registrations, so converters added after the
/// middleware was bound still apply.
///
/// # Example
///
/// ```
/// use wirebind_core::{RouteContext, Value};
/// use wirebind_middleware::{ArgumentConverters, ConverterSpec};
///
/// let converters = ArgumentConverters::new();
/// converters.register(
///     "id",
///     ConverterSpec::new(|raw, _, _| {
///         Ok(raw.and_then(|v| v.as_str().and_then(|s| s.parse::<u64>().ok())).map(Value::new))
///     })
///     .required_if_null(true),
/// );
///
/// let route = RouteContext::new("/items/{id}").with_raw_argument("id", "42");
/// converters.apply(&route).unwrap();
/// assert_eq!(route.argument("id").unwrap().downcast_ref::<u64>(), Some(&42));
///
/// let bad = RouteContext::new("/items/{id}").with_raw_argument("id", "bad");
/// assert!(converters.apply(&bad).unwrap_err().is_not_found());
/// ```
#[derive(Clone, Default)]
pub struct ArgumentConverters {
    inner: Arc<Inner>,
}

impl ArgumentConverters {
    /// Creates an empty converter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a converter for `argument`.
    ///
    /// Returns the middleware to bind on the first registration only; later
    /// calls return `None` because the bound middleware already sees them.
    pub fn register(
        &self,
        argument: impl Into<String>,
        spec: ConverterSpec,
    ) -> Option<Arc<dyn Middleware>> {
        self.inner.specs.write().insert(argument.into(), spec);

        if self.inner.bound.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Arc::new(self.clone()))
        }
    }

    /// Returns `true` once the converters have been bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.bound.load(Ordering::Acquire)
    }

    /// Returns the registered argument names in registration order.
    #[must_use]
    pub fn arguments(&self) -> Vec<String> {
        self.inner.specs.read().keys().cloned().collect()
    }

    /// Runs every converter against `route`, writing results back.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::RequiredConversionMissing`] when a required
    /// conversion yields nothing, or the converter's own error.
    pub fn apply(&self, route: &RouteContext) -> WireResult<()> {
        let specs: Vec<(String, ConverterSpec)> = self
            .inner
            .specs
            .read()
            .iter()
            .map(|(name, spec)| (name.clone(), spec.clone()))
            .collect();

        for (argument, spec) in specs {
            let raw = route.argument(&argument);
            if raw.is_none() && spec.skip_if_null {
                continue;
            }

            let converted = (spec.convert)(raw, &argument, route)?;
            if converted.is_none() && spec.required_if_null {
                return Err(WireError::required_conversion_missing(argument));
            }

            debug!(
                argument = %argument,
                route = %route.pattern(),
                converted = converted.is_some(),
                "route argument converted"
            );
            route.set_argument(argument, converted);
        }

        Ok(())
    }
}

impl Middleware for ArgumentConverters {
    fn name(&self) -> &'static str {
        "argument_converters"
    }

    fn process<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, WireResult<Response>> {
        Box::pin(async move {
            let route = next
                .route()
                .cloned()
                .ok_or_else(|| WireError::internal("Route instance not provided"))?;
            self.apply(&route)?;
            next.run(request, response).await
        })
    }
}

impl fmt::Debug for ArgumentConverters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentConverters")
            .field("arguments", &self.arguments())
            .field("bound", &self.is_bound())
            .finish()
    }
}

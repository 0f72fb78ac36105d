//! Callable resolution and parameter binding.
//!
//! [`CallableResolver::resolve`] turns a [`Target`] into a [`ResolvedCallable`]
//! that can be used as middleware, as a route endpoint, or called directly
//! with [`RawArguments`].
//!
//! Each declared parameter is bound from the first source that supplies it:
//!
//! | Step | Source |
//! |------|--------|
//! | 1 | name `request`: active request, else container `request` |
//! | 2 | name `response`: active response, else container `response` |
//! | 3 | name `next`: active continuation, or null |
//! | 4 | name `args`: the extra arguments |
//! | 5 | request attribute with the same name |
//! | 6 | non-null route argument with the same name |
//! | 7 | container entry with the same name: the continuation's container for middleware, the resolver's otherwise |
//! | 8 | first extra argument whose type tag equals the declared type |
//! | 9 | declared default |
//! | 10 | null, if nullable |
//! | 11 | [`WireError::UnresolvableParameter`] |

use crate::args::{ExtraArgs, Frame, RawArguments};
use crate::cache::InstanceCache;
use crate::class::{ClassDescriptor, ClassRegistry, Instance, MethodKind};
use crate::invocation::{Invocation, Reply};
use crate::signature::{ParamSpec, Signature};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::trace;
use wirebind_core::{Container, Request, Response, RouteContext, Value, WireError, WireResult};
use wirebind_middleware::{
    BoxFuture, Endpoint, Middleware, Next, ScopeGuard, ScopeGuardBuilder,
};

const REQUEST: &str = "request";
const RESPONSE: &str = "response";
const NEXT: &str = "next";
const ARGS: &str = "args";

type CallFn = Arc<dyn Fn(Invocation) -> BoxFuture<'static, WireResult<Reply>> + Send + Sync>;

/// A free-standing handler with its declared parameters.
#[derive(Clone)]
pub struct Callable {
    signature: Signature,
    func: CallFn,
}

impl Callable {
    /// Wraps an async function taking the bound [`Invocation`].
    pub fn new<F, Fut>(signature: Signature, func: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WireResult<Reply>> + Send + 'static,
    {
        Self {
            signature,
            func: Arc::new(
                move |inv: Invocation| -> BoxFuture<'static, WireResult<Reply>> {
                    Box::pin(func(inv))
                },
            ),
        }
    }

    /// Returns the declared parameters.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("params", &self.signature.names())
            .finish_non_exhaustive()
    }
}

/// Something the resolver can turn into an invokable unit.
#[derive(Debug, Clone)]
pub enum Target {
    /// A method stub on a registered class.
    Method {
        /// Registered class name.
        class: String,
        /// Method stub; controllers derive the concrete name from it.
        method: String,
    },
    /// A free-standing callable.
    Callable(Callable),
}

impl Target {
    /// Targets `method` on `class`.
    pub fn method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Method {
            class: class.into(),
            method: method.into(),
        }
    }

    /// Targets an async function.
    pub fn callable<F, Fut>(signature: Signature, func: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WireResult<Reply>> + Send + 'static,
    {
        Self::Callable(Callable::new(signature, func))
    }
}

impl From<Callable> for Target {
    fn from(callable: Callable) -> Self {
        Self::Callable(callable)
    }
}

/// Resolves targets against a class registry and service container.
///
/// One resolver serves the whole application; its [`InstanceCache`] is
/// shared by every [`ResolvedCallable`] it produces.
#[derive(Clone)]
pub struct CallableResolver {
    container: Arc<Container>,
    classes: Arc<ClassRegistry>,
    instances: Arc<InstanceCache>,
}

impl CallableResolver {
    /// Creates a resolver with a fresh instance cache.
    #[must_use]
    pub fn new(container: Arc<Container>, classes: Arc<ClassRegistry>) -> Self {
        Self::with_cache(container, classes, Arc::new(InstanceCache::new()))
    }

    /// Creates a resolver sharing an existing instance cache.
    #[must_use]
    pub const fn with_cache(
        container: Arc<Container>,
        classes: Arc<ClassRegistry>,
        instances: Arc<InstanceCache>,
    ) -> Self {
        Self {
            container,
            classes,
            instances,
        }
    }

    /// Returns the instance cache.
    #[must_use]
    pub const fn instances(&self) -> &Arc<InstanceCache> {
        &self.instances
    }

    /// Returns the service container.
    #[must_use]
    pub const fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Returns the class registry.
    #[must_use]
    pub const fn classes(&self) -> &Arc<ClassRegistry> {
        &self.classes
    }

    /// Resolves `target`.
    ///
    /// The concrete method of a class target depends on how it is called,
    /// so only the class is checked here.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::ClassNotFound`] if a class target names an
    /// unregistered class.
    pub fn resolve(&self, target: Target) -> WireResult<ResolvedCallable> {
        let kind = match target {
            Target::Method { class, method } => {
                let descriptor = self
                    .classes
                    .get(&class)
                    .ok_or_else(|| WireError::class_not_found(&class))?;
                Kind::Method {
                    class: descriptor,
                    stub: method,
                }
            }
            Target::Callable(callable) => Kind::Callable(callable),
        };

        Ok(ResolvedCallable {
            inner: Arc::new(ResolvedInner {
                kind,
                container: Arc::clone(&self.container),
                instances: Arc::clone(&self.instances),
            }),
        })
    }

    /// Resolves `target` and wraps it in a scope guard.
    ///
    /// # Errors
    ///
    /// Returns the resolution error, or [`WireError::InvalidPattern`] if a
    /// scope or exclusion pattern does not compile.
    pub fn resolve_scoped(
        &self,
        target: Target,
        guard: ScopeGuardBuilder,
    ) -> WireResult<ScopeGuard> {
        let resolved = self.resolve(target)?;
        guard.build(Arc::new(resolved))
    }
}

impl fmt::Debug for CallableResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableResolver")
            .field("classes", &self.classes)
            .field("instances", &self.instances)
            .finish_non_exhaustive()
    }
}

enum Kind {
    Method {
        class: Arc<ClassDescriptor>,
        stub: String,
    },
    Callable(Callable),
}

struct ResolvedInner {
    kind: Kind,
    container: Arc<Container>,
    instances: Arc<InstanceCache>,
}

/// A resolved, invokable target.
#[derive(Clone)]
pub struct ResolvedCallable {
    inner: Arc<ResolvedInner>,
}

impl ResolvedCallable {
    /// Calls the target. `route` is the matched route of a terminal call;
    /// middleware calls read theirs from the continuation.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::MethodNotCallable`] if the derived method does
    /// not exist, [`WireError::NotInstantiable`] for an instance method on a
    /// class without a constructor, [`WireError::UnresolvableParameter`] if a
    /// parameter cannot be bound, or whatever the target itself returns.
    pub async fn call(&self, raw: RawArguments, route: Option<RouteContext>) -> WireResult<Reply> {
        let frame = Frame::from_raw(raw, route);
        match &self.inner.kind {
            Kind::Callable(callable) => {
                let inv = self.bind(&callable.signature, &frame)?;
                (callable.func)(inv).await
            }
            Kind::Method { class, stub } => {
                let name = class.method_name(stub, frame.next.is_some());
                let method = class
                    .method(&name)
                    .ok_or_else(|| WireError::method_not_callable(class.name(), stub))?;

                match &method.kind {
                    MethodKind::Static(func) => {
                        let inv = self.bind(&method.signature, &frame)?;
                        func(inv).await
                    }
                    MethodKind::Instance(func) => {
                        let instance = self.instance(class, &frame)?;
                        if let (Some(request), Some(response)) = (&frame.request, &frame.response)
                        {
                            class.inject(&instance, request.clone(), response.clone());
                        }
                        let inv = self.bind(&method.signature, &frame)?;
                        func(instance, inv).await
                    }
                }
            }
        }
    }

    /// Returns a short description of the target, used in logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.inner.kind {
            Kind::Method { class, stub } => format!("{}:{stub}", class.name()),
            Kind::Callable(callable) => format!("callable({})", callable.signature.names().join(", ")),
        }
    }

    fn instance(&self, class: &ClassDescriptor, frame: &Frame) -> WireResult<Instance> {
        self.inner.instances.get_or_try_insert(class.name(), || {
            let constructor = class.constructor()?;
            let inv = self.bind(&constructor.signature, &frame.for_constructor())?;
            (constructor.build)(&inv)
        })
    }

    fn bind(&self, signature: &Signature, frame: &Frame) -> WireResult<Invocation> {
        let params = signature
            .params()
            .iter()
            .map(|param| Ok((param.name().to_string(), self.bind_param(param, frame)?)))
            .collect::<WireResult<Vec<_>>>()?;

        Ok(Invocation::new(
            params,
            frame.request.clone(),
            frame.response.clone(),
            frame.args.clone(),
        ))
    }

    /// Container for step 7. A middleware call resolves through its
    /// continuation, which a scope guard may have rebound; endpoints, group
    /// callbacks and constructors have no continuation and resolve through
    /// the resolver's own container.
    fn container<'a>(&'a self, frame: &'a Frame) -> &'a Container {
        frame
            .next
            .as_ref()
            .map_or(&*self.inner.container, |next| &**next.container())
    }

    fn bind_param(&self, param: &ParamSpec, frame: &Frame) -> WireResult<Option<Value>> {
        let name = param.name();
        let container = self.container(frame);

        match name {
            REQUEST => {
                if let Some(request) = &frame.request {
                    return Ok(Some(Value::new(request.clone())));
                }
                return from_container_or_fallback(container, param);
            }
            RESPONSE => {
                if let Some(response) = &frame.response {
                    return Ok(Some(Value::new(response.clone())));
                }
                return from_container_or_fallback(container, param);
            }
            NEXT => return Ok(frame.next.clone().map(Value::new)),
            ARGS => return Ok(Some(Value::new(frame.args.clone()))),
            _ => {}
        }

        if let Some(value) = frame
            .request
            .as_ref()
            .and_then(|request| request.attribute(name))
        {
            trace!(parameter = name, source = "request_attribute", "parameter bound");
            return Ok(Some(value.clone()));
        }

        if let Some(value) = frame.route.as_ref().and_then(|route| route.argument(name)) {
            trace!(parameter = name, source = "route_argument", "parameter bound");
            return Ok(Some(value));
        }

        if container.has(name) {
            trace!(parameter = name, source = "container", "parameter bound");
            return container.get(name).map(Some);
        }

        if let Some(value) = param
            .type_tag()
            .and_then(|tag| frame.args.find_by_tag(tag))
        {
            trace!(parameter = name, source = "extra_arguments", "parameter bound");
            return Ok(Some(value));
        }

        fallback(param)
    }
}

fn from_container_or_fallback(container: &Container, param: &ParamSpec) -> WireResult<Option<Value>> {
    if container.has(param.name()) {
        trace!(parameter = param.name(), source = "container_default", "parameter bound");
        return container.get(param.name()).map(Some);
    }
    fallback(param)
}

fn fallback(param: &ParamSpec) -> WireResult<Option<Value>> {
    if let Some(default) = param.default_value() {
        trace!(parameter = param.name(), source = "default", "parameter bound");
        return Ok(Some(default.clone()));
    }
    if param.is_nullable() {
        return Ok(None);
    }
    Err(WireError::unresolvable_parameter(param.name()))
}

impl fmt::Debug for ResolvedCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResolvedCallable")
            .field(&self.describe())
            .finish()
    }
}

impl Middleware for ResolvedCallable {
    fn name(&self) -> &'static str {
        "resolved"
    }

    fn process<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, WireResult<Response>> {
        Box::pin(async move {
            let fallback = response.clone();
            let reply = self
                .call(RawArguments::middleware(request, response, next), None)
                .await?;
            Ok(reply.into_response(fallback))
        })
    }
}

impl Endpoint for ResolvedCallable {
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        route: Option<RouteContext>,
    ) -> BoxFuture<'a, WireResult<Response>> {
        Box::pin(async move {
            let args = route
                .as_ref()
                .map(ExtraArgs::from_route)
                .unwrap_or_default();
            let fallback = response.clone();
            let reply = self
                .call(RawArguments::handler(request, response, args), route)
                .await?;
            Ok(reply.into_response(fallback))
        })
    }
}

//! Class descriptors.
//!
//! Classes are registered explicitly: a name, an optional constructor with
//! its declared dependencies, and named static or instance methods. A class
//! built with [`ClassBuilder::controller`] gets the controller conventions:
//! derived method names and request/response injection.

use crate::invocation::{Invocation, Reply};
use crate::signature::Signature;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use wirebind_core::{Request, Response, WireError, WireResult};
use wirebind_middleware::BoxFuture;

/// A constructed, shared class instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

type Construct = Arc<dyn Fn(&Invocation) -> WireResult<Instance> + Send + Sync>;
type StaticFn = Arc<dyn Fn(Invocation) -> BoxFuture<'static, WireResult<Reply>> + Send + Sync>;
type InstanceFn =
    Arc<dyn Fn(Instance, Invocation) -> BoxFuture<'static, WireResult<Reply>> + Send + Sync>;
type InjectFn = Arc<dyn Fn(&Instance, Request, Response) + Send + Sync>;

const ENDPOINT_PREFIX: &str = "endpoint";
const MIDDLEWARE_PREFIX: &str = "middleware";

/// Types that accept the active request and response before each call.
pub trait Controller: Send + Sync + 'static {
    /// Stores the active request and response.
    fn set_request_response(&self, request: Request, response: Response);
}

/// Request/response storage for controller types.
///
/// ```
/// use wirebind_core::{Request, Response};
/// use wirebind_resolver::{Controller, ControllerState};
///
/// #[derive(Default)]
/// struct Users {
///     state: ControllerState,
/// }
///
/// impl Controller for Users {
///     fn set_request_response(&self, request: Request, response: Response) {
///         self.state.set(request, response);
///     }
/// }
/// ```
#[derive(Debug, Default)]
pub struct ControllerState {
    current: RwLock<Option<(Request, Response)>>,
}

impl ControllerState {
    /// Creates empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored request and response.
    pub fn set(&self, request: Request, response: Response) {
        *self.current.write() = Some((request, response));
    }

    /// Returns the stored request.
    #[must_use]
    pub fn request(&self) -> Option<Request> {
        self.current.read().as_ref().map(|(request, _)| request.clone())
    }

    /// Returns the stored response.
    #[must_use]
    pub fn response(&self) -> Option<Response> {
        self.current.read().as_ref().map(|(_, response)| response.clone())
    }
}

pub(crate) struct Constructor {
    pub(crate) signature: Signature,
    pub(crate) build: Construct,
}

pub(crate) enum MethodKind {
    Static(StaticFn),
    Instance(InstanceFn),
}

pub(crate) struct Method {
    pub(crate) signature: Signature,
    pub(crate) kind: MethodKind,
}

/// A registered class.
pub struct ClassDescriptor {
    name: String,
    constructor: Option<Constructor>,
    methods: HashMap<String, Method>,
    inject: Option<InjectFn>,
}

impl ClassDescriptor {
    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the class follows controller conventions.
    #[must_use]
    pub fn is_controller(&self) -> bool {
        self.inject.is_some()
    }

    /// Returns `true` if the class can be instantiated.
    #[must_use]
    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }

    /// Returns `true` if a method with this exact name exists.
    #[must_use]
    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Derives the concrete method name for `stub`.
    ///
    /// Controllers prefix the capitalised stub with `endpoint`, or with
    /// `middleware` when called with a continuation. Other classes use the
    /// stub verbatim.
    #[must_use]
    pub fn method_name(&self, stub: &str, with_next: bool) -> String {
        if !self.is_controller() {
            return stub.to_string();
        }
        let prefix = if with_next {
            MIDDLEWARE_PREFIX
        } else {
            ENDPOINT_PREFIX
        };
        format!("{prefix}{}", capitalize(stub))
    }

    pub(crate) fn method(&self, method: &str) -> Option<&Method> {
        self.methods.get(method)
    }

    pub(crate) fn constructor(&self) -> WireResult<&Constructor> {
        self.constructor
            .as_ref()
            .ok_or_else(|| WireError::not_instantiable(&self.name))
    }

    pub(crate) fn inject(&self, instance: &Instance, request: Request, response: Response) {
        if let Some(inject) = &self.inject {
            inject(instance, request, response);
        }
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("controller", &self.is_controller())
            .field("instantiable", &self.is_instantiable())
            .field("methods", &methods)
            .finish()
    }
}

fn capitalize(stub: &str) -> String {
    let mut chars = stub.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Typed builder for a [`ClassDescriptor`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use wirebind_resolver::{ClassBuilder, ParamSpec, Reply, Signature};
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// let class = ClassBuilder::<Greeter>::new("Greeter")
///     .constructor(Signature::new().param(ParamSpec::named("greeting")), |inv| {
///         Ok(Greeter { greeting: inv.str("greeting").unwrap_or_default() })
///     })
///     .method("greet", Signature::new(), |this: Arc<Greeter>, inv| async move {
///         let response = inv.response().unwrap_or_default();
///         Ok(Reply::from(response.with_body_string(this.greeting.clone())))
///     })
///     .build();
///
/// assert!(class.has_method("greet"));
/// assert!(!class.is_controller());
/// ```
pub struct ClassBuilder<T> {
    name: String,
    constructor: Option<Constructor>,
    methods: HashMap<String, Method>,
    inject: Option<InjectFn>,
    _type: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ClassBuilder<T> {
    /// Starts a class named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: None,
            methods: HashMap::new(),
            inject: None,
            _type: PhantomData,
        }
    }

    /// Sets the constructor and its declared dependencies.
    #[must_use]
    pub fn constructor<F>(mut self, signature: Signature, build: F) -> Self
    where
        F: Fn(&Invocation) -> WireResult<T> + Send + Sync + 'static,
    {
        self.constructor = Some(Constructor {
            signature,
            build: Arc::new(move |inv: &Invocation| -> WireResult<Instance> {
                build(inv).map(|instance| Arc::new(instance) as Instance)
            }),
        });
        self
    }

    /// Adds an instance method.
    #[must_use]
    pub fn method<F, Fut>(mut self, name: impl Into<String>, signature: Signature, func: F) -> Self
    where
        F: Fn(Arc<T>, Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WireResult<Reply>> + Send + 'static,
    {
        let class = self.name.clone();
        let call: InstanceFn = Arc::new(
            move |instance: Instance, inv: Invocation| -> BoxFuture<'static, WireResult<Reply>> {
                match instance.downcast::<T>() {
                    Ok(this) => Box::pin(func(this, inv)),
                    Err(_) => {
                        let class = class.clone();
                        Box::pin(async move {
                            Err(WireError::internal(format!(
                                "cached instance of \"{class}\" has the wrong type"
                            )))
                        })
                    }
                }
            },
        );
        self.methods.insert(
            name.into(),
            Method {
                signature,
                kind: MethodKind::Instance(call),
            },
        );
        self
    }

    /// Adds a static method, called without an instance.
    #[must_use]
    pub fn static_method<F, Fut>(
        mut self,
        name: impl Into<String>,
        signature: Signature,
        func: F,
    ) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WireResult<Reply>> + Send + 'static,
    {
        let call: StaticFn = Arc::new(
            move |inv: Invocation| -> BoxFuture<'static, WireResult<Reply>> { Box::pin(func(inv)) },
        );
        self.methods.insert(
            name.into(),
            Method {
                signature,
                kind: MethodKind::Static(call),
            },
        );
        self
    }

    /// Finishes the descriptor.
    #[must_use]
    pub fn build(self) -> ClassDescriptor {
        ClassDescriptor {
            name: self.name,
            constructor: self.constructor,
            methods: self.methods,
            inject: self.inject,
        }
    }
}

impl<T: Controller> ClassBuilder<T> {
    /// Marks the class as a controller.
    #[must_use]
    pub fn controller(mut self) -> Self {
        self.inject = Some(Arc::new(
            |instance: &Instance, request: Request, response: Response| {
                if let Some(controller) = (**instance).downcast_ref::<T>() {
                    controller.set_request_response(request, response);
                }
            },
        ));
        self
    }
}

/// All registered classes, by name.
#[derive(Default)]
pub struct ClassRegistry {
    classes: HashMap<String, Arc<ClassDescriptor>>,
}

impl ClassRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class, replacing any class with the same name.
    pub fn register(&mut self, class: ClassDescriptor) {
        self.classes.insert(class.name.clone(), Arc::new(class));
    }

    /// Returns the class named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(name).cloned()
    }

    /// Returns `true` if a class named `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Returns the number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no classes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("class_count", &self.classes.len())
            .finish()
    }
}

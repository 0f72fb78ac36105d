//! The application facade.
//!
//! [`App`] owns the service container, the callable resolver and everything
//! registered on it: app middleware, routes and groups. The host matches
//! requests against [`App::routes`] and calls [`App::handle`].

use crate::group::RouteGroup;
use crate::route::{Route, RouteInfo, RouteMatch, ANY_METHODS};
use bytes::Bytes;
use http::header::HeaderValue;
use http::{Method, StatusCode, Uri, Version};
use parking_lot::RwLock;
use serde_json::{json, Map, Value as Json};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};
use wirebind_config::{AppSettings, Settings};
use wirebind_core::{Container, Request, Response, RouteContext, Value, WireError, WireResult};
use wirebind_middleware::{BoxFuture, BoxedMiddleware, Endpoint, Middleware, Pipeline, ScopeGuard};
use wirebind_pattern::{expand_template, join_prefix, PatternValidator};
use wirebind_resolver::{
    CallableResolver, ClassDescriptor, ClassRegistry, RawArguments, ResolvedCallable, Target,
};
use wirebind_telemetry::{init_logging, LogConfig, TelemetryResult};

/// Builder for [`App`].
pub struct AppBuilder {
    settings: Settings,
    container: Container,
    classes: ClassRegistry,
    validator: Option<PatternValidator>,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            container: Container::new(),
            classes: ClassRegistry::new(),
            validator: None,
        }
    }

    /// Sets the settings.
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Registers a shared service.
    #[must_use]
    pub fn service<T: Any + Send + Sync>(mut self, name: impl Into<String>, service: T) -> Self {
        self.container.set(name, service);
        self
    }

    /// Registers an already wrapped service.
    #[must_use]
    pub fn service_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.container.set_value(name, value);
        self
    }

    /// Registers a lazily built service.
    #[must_use]
    pub fn factory<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Container) -> WireResult<Value> + Send + Sync + 'static,
    {
        self.container.factory(name, factory);
        self
    }

    /// Registers a class that `Target::method` can name.
    #[must_use]
    pub fn class(mut self, class: ClassDescriptor) -> Self {
        self.classes.register(class);
        self
    }

    /// Replaces the route pattern validator.
    #[must_use]
    pub fn pattern_validator(mut self, validator: PatternValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Builds the app.
    ///
    /// Registers `settings` and, unless already present, `debug` and the
    /// default `request` and `response` factories.
    #[must_use]
    pub fn build(self) -> App {
        let mut settings = self.settings;
        settings.normalize();

        let mut container = self.container;
        container.set("settings", settings.clone());
        if !container.has("debug") {
            container.set("debug", settings.app.debug);
        }
        let response = default_response(&settings.app);
        container.factory_if_absent("response", move |_| Ok(Value::new(response.clone())));
        container.factory_if_absent("request", |_| {
            Ok(Value::new(Request::new(Method::GET, Uri::from_static("/"))))
        });

        let validator = self.validator.unwrap_or_else(|| {
            if settings.app.validate_patterns {
                PatternValidator::trailing_slash_xor_extension()
            } else {
                PatternValidator::disabled()
            }
        });

        let container = Arc::new(container);
        let resolver = CallableResolver::new(Arc::clone(&container), Arc::new(self.classes));

        App {
            inner: Arc::new(AppInner {
                settings,
                container,
                resolver,
                validator,
                registry: RwLock::new(Registry::default()),
            }),
            groups: Vec::new(),
        }
    }
}

fn default_response(app: &AppSettings) -> Response {
    let version = match app.http_version.as_str() {
        "1.0" => Version::HTTP_10,
        "2" | "2.0" => Version::HTTP_2,
        _ => Version::HTTP_11,
    };
    let response = Response::new().with_version(version).with_debug(app.debug);
    match HeaderValue::from_str(&app.default_content_type) {
        Ok(content_type) => response.with_content_type(content_type),
        Err(_) => response,
    }
}

#[derive(Default)]
struct Registry {
    middleware: Vec<BoxedMiddleware>,
    routes: Vec<Arc<Route>>,
    default_segments: HashMap<String, String>,
}

struct AppInner {
    settings: Settings,
    container: Arc<Container>,
    resolver: CallableResolver,
    validator: PatternValidator,
    registry: RwLock<Registry>,
}

/// The application.
///
/// Cloning is cheap; clones share all registrations. A handle passed to a
/// group callback also carries the chain of groups it registers into.
///
/// # Example
///
/// ```
/// use http::{Method, Uri};
/// use wirebind::prelude::*;
///
/// # tokio_test::block_on(async {
/// let app = App::builder().build();
/// let route = app
///     .get(
///         "/hello/",
///         Target::callable(Signature::names_only(["response"]), |inv| async move {
///             let response = inv.response().unwrap_or_default();
///             Ok(Reply::from(response.with_body_string("hello")))
///         }),
///     )
///     .unwrap();
///
/// let request = Request::new(Method::GET, Uri::from_static("/hello/"));
/// let response = app.handle(request, Some(RouteMatch::empty(route.id()))).await;
/// assert_eq!(response.body_text(), "hello");
/// # });
/// ```
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
    groups: Vec<Arc<RouteGroup>>,
}

impl App {
    /// Starts building an app.
    #[must_use]
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Builds an app from settings alone.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        AppBuilder::new().settings(settings).build()
    }

    /// Returns the normalised settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Returns the service container.
    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        &self.inner.container
    }

    /// Returns the callable resolver.
    #[must_use]
    pub fn resolver(&self) -> &CallableResolver {
        &self.inner.resolver
    }

    /// Returns `true` in debug mode.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.inner.settings.app.debug
    }

    /// Installs the global subscriber from the logging settings.
    ///
    /// # Errors
    ///
    /// Fails if the level is invalid or a subscriber is already installed.
    pub fn init_logging(&self) -> TelemetryResult<()> {
        init_logging(&LogConfig::from_settings(&self.inner.settings.logging))
    }

    /// Resolves `target` and adds it as app middleware.
    ///
    /// # Errors
    ///
    /// Returns the resolution error.
    pub fn add(&self, target: Target) -> WireResult<&Self> {
        let middleware = self.inner.resolver.resolve(target)?;
        Ok(self.add_middleware(middleware))
    }

    /// Adds app middleware. The most recently added runs first.
    pub fn add_middleware<M: Middleware>(&self, middleware: M) -> &Self {
        self.inner.registry.write().middleware.push(Arc::new(middleware));
        self
    }

    /// Adds app middleware that only runs under `pattern`.
    ///
    /// Inside a group callback the pattern is prefixed with every active
    /// group pattern. Exclusions are exact matches and are not prefixed.
    ///
    /// # Errors
    ///
    /// Returns the resolution error, or [`WireError::InvalidPattern`] if a
    /// pattern does not compile.
    pub fn add_scoped<I, S>(&self, pattern: &str, target: Target, exclusions: I) -> WireResult<&Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scope = join_prefix(&self.group_patterns(), pattern);
        let guard = ScopeGuard::builder(Arc::clone(&self.inner.container), scope).exclude(exclusions);
        let guard = self.inner.resolver.resolve_scoped(target, guard)?;
        debug!(scope = guard.scope(), "scoped middleware added");
        Ok(self.add_middleware(guard))
    }

    /// Registers a `GET` route.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidPattern`] if the validator rejects the
    /// pattern, or the resolution error.
    pub fn get(&self, pattern: &str, target: Target) -> WireResult<Arc<Route>> {
        self.route(vec![Method::GET], pattern, target)
    }

    /// Registers a `POST` route.
    ///
    /// # Errors
    ///
    /// See [`App::get`].
    pub fn post(&self, pattern: &str, target: Target) -> WireResult<Arc<Route>> {
        self.route(vec![Method::POST], pattern, target)
    }

    /// Registers a `PUT` route.
    ///
    /// # Errors
    ///
    /// See [`App::get`].
    pub fn put(&self, pattern: &str, target: Target) -> WireResult<Arc<Route>> {
        self.route(vec![Method::PUT], pattern, target)
    }

    /// Registers a `PATCH` route.
    ///
    /// # Errors
    ///
    /// See [`App::get`].
    pub fn patch(&self, pattern: &str, target: Target) -> WireResult<Arc<Route>> {
        self.route(vec![Method::PATCH], pattern, target)
    }

    /// Registers a `DELETE` route.
    ///
    /// # Errors
    ///
    /// See [`App::get`].
    pub fn delete(&self, pattern: &str, target: Target) -> WireResult<Arc<Route>> {
        self.route(vec![Method::DELETE], pattern, target)
    }

    /// Registers an `OPTIONS` route.
    ///
    /// # Errors
    ///
    /// See [`App::get`].
    pub fn options(&self, pattern: &str, target: Target) -> WireResult<Arc<Route>> {
        self.route(vec![Method::OPTIONS], pattern, target)
    }

    /// Registers a route for every method in [`ANY_METHODS`].
    ///
    /// # Errors
    ///
    /// See [`App::get`].
    pub fn any(&self, pattern: &str, target: Target) -> WireResult<Arc<Route>> {
        self.route(ANY_METHODS.to_vec(), pattern, target)
    }

    /// Registers one route per pattern, all sharing `target`.
    ///
    /// Every pattern is validated before anything is registered.
    ///
    /// # Errors
    ///
    /// See [`App::get`].
    pub fn map<M, P, S>(&self, methods: M, patterns: P, target: Target) -> WireResult<Vec<Arc<Route>>>
    where
        M: IntoIterator<Item = Method>,
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<S> = patterns.into_iter().collect();
        for pattern in &patterns {
            self.inner.validator.validate(pattern.as_ref())?;
        }
        let methods: Vec<Method> = methods.into_iter().collect();
        let handler = self.inner.resolver.resolve(target)?;

        Ok(patterns
            .iter()
            .map(|pattern| self.push_route(methods.clone(), pattern.as_ref(), handler.clone()))
            .collect())
    }

    fn route(&self, methods: Vec<Method>, pattern: &str, target: Target) -> WireResult<Arc<Route>> {
        self.inner.validator.validate(pattern)?;
        let handler = self.inner.resolver.resolve(target)?;
        Ok(self.push_route(methods, pattern, handler))
    }

    fn push_route(
        &self,
        methods: Vec<Method>,
        pattern: &str,
        handler: ResolvedCallable,
    ) -> Arc<Route> {
        let full = join_prefix(&self.group_patterns(), pattern);
        let mut registry = self.inner.registry.write();
        let route = Arc::new(Route::new(
            registry.routes.len(),
            methods,
            full,
            handler,
            self.groups.clone(),
            self.inner.resolver.clone(),
        ));
        registry.routes.push(Arc::clone(&route));
        debug!(id = route.id(), pattern = route.pattern(), "route registered");
        route
    }

    /// Opens a group under `pattern` and runs `target` to populate it.
    ///
    /// The callback is called with an app handle as its only extra
    /// argument, so it receives it through a parameter typed as [`App`].
    /// Routes, scoped middleware and nested groups registered through that
    /// handle are prefixed with `pattern`; other handles are unaffected.
    ///
    /// # Errors
    ///
    /// Returns the resolution error or whatever the callback returns.
    pub async fn group(&self, pattern: &str, target: Target) -> WireResult<Arc<RouteGroup>> {
        let callback = self.inner.resolver.resolve(target)?;
        let group = Arc::new(RouteGroup::new(pattern, self.inner.resolver.clone()));

        let mut groups = self.groups.clone();
        groups.push(Arc::clone(&group));
        let scoped = Self {
            inner: Arc::clone(&self.inner),
            groups,
        };
        callback
            .call(RawArguments::Root(Value::new(scoped)), None)
            .await?;
        Ok(group)
    }

    /// Returns the innermost group this handle registers into.
    #[must_use]
    pub fn current_group(&self) -> Option<Arc<RouteGroup>> {
        self.groups.last().cloned()
    }

    fn group_patterns(&self) -> Vec<String> {
        self.groups
            .iter()
            .map(|group| group.pattern().to_string())
            .collect()
    }

    /// Returns the route registered under `id`.
    #[must_use]
    pub fn route_by_id(&self, id: usize) -> Option<Arc<Route>> {
        self.inner.registry.read().routes.get(id).cloned()
    }

    /// Lists every registered route in registration order.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.inner
            .registry
            .read()
            .routes
            .iter()
            .map(|route| route.info())
            .collect()
    }

    /// Sets the value used for placeholder `name` when [`App::path_for`]
    /// is not given one.
    pub fn set_default_segment(&self, name: impl Into<String>, value: impl Into<String>) -> &Self {
        self.inner
            .registry
            .write()
            .default_segments
            .insert(name.into(), value.into());
        self
    }

    /// Builds the path of the first route named `name`.
    ///
    /// Placeholders take their value from `data`, then from the default
    /// segments. A non-empty `query` is appended URL-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::RouteNotNamed`] if no route has the name, or
    /// [`WireError::MissingRouteData`] if a placeholder has no value.
    ///
    /// # Example
    ///
    /// ```
    /// use wirebind::prelude::*;
    ///
    /// let app = App::builder().build();
    /// app.get(
    ///     "/{lang}/posts/{slug}/",
    ///     Target::callable(Signature::new(), |_inv| async { Ok(Reply::Empty) }),
    /// )
    /// .unwrap()
    /// .set_name("post");
    /// app.set_default_segment("lang", "en");
    ///
    /// let path = app.path_for("post", &[("slug", "hello")], &[("page", "2")]).unwrap();
    /// assert_eq!(path, "/en/posts/hello/?page=2");
    /// ```
    pub fn path_for(
        &self,
        name: &str,
        data: &[(&str, &str)],
        query: &[(&str, &str)],
    ) -> WireResult<String> {
        let registry = self.inner.registry.read();
        let route = registry
            .routes
            .iter()
            .find(|route| route.name().as_deref() == Some(name))
            .ok_or_else(|| WireError::route_not_named(name))?;

        let mut path = expand_template(route.pattern(), |segment| {
            data.iter()
                .find(|(key, _)| *key == segment)
                .map(|(_, value)| (*value).to_string())
                .or_else(|| registry.default_segments.get(segment).cloned())
        })?;

        if !query.is_empty() {
            let encoded = serde_urlencoded::to_string(query)
                .map_err(|err| WireError::internal_with_source("failed to encode query string", err))?;
            path.push('?');
            path.push_str(&encoded);
        }
        Ok(path)
    }

    /// A not-found error for handlers to return.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> WireError {
        WireError::not_found(message)
    }

    /// An error rendered with `status`, for handlers to return.
    #[must_use]
    pub fn error(message: impl Into<String>, status: StatusCode) -> WireError {
        WireError::http(status, message)
    }

    /// Dispatches `request` to the matched route, or to the not-found
    /// handler when there is none.
    ///
    /// App middleware runs first, most recently added first, then group
    /// middleware from the outermost group inwards, then the route's own
    /// middleware. Errors are rendered into the response.
    pub async fn handle(&self, request: Request, matched: Option<RouteMatch>) -> Response {
        let response = self.base_response();

        let app_stages: Vec<BoxedMiddleware> = self
            .inner
            .registry
            .read()
            .middleware
            .iter()
            .rev()
            .cloned()
            .collect();
        let builder = Pipeline::builder()
            .container(Arc::clone(&self.inner.container))
            .extend(app_stages);

        let target = matched.and_then(|matched| {
            self.route_by_id(matched.route_id())
                .map(|route| (route, matched))
        });
        let pipeline = match target {
            Some((route, matched)) => {
                let context = RouteContext::with_arguments(
                    route.pattern(),
                    route.name(),
                    matched.arguments().iter().cloned(),
                );
                builder
                    .extend(route.stages())
                    .route(context)
                    .build(route.handler().clone())
            }
            None => builder.build(NotFoundEndpoint),
        };

        let fallback = response.clone();
        match pipeline.run(request.clone(), response).await {
            Ok(response) => response,
            Err(err) => self.render_error(&request, &fallback, &err),
        }
    }

    /// [`App::handle`] over plain `http` types.
    ///
    /// # Errors
    ///
    /// Fails if the rendered response has an invalid header.
    pub async fn handle_http(
        &self,
        request: http::Request<Bytes>,
        matched: Option<RouteMatch>,
    ) -> Result<http::Response<Bytes>, http::Error> {
        self.handle(Request::from(request), matched).await.into_http()
    }

    fn base_response(&self) -> Response {
        self.inner
            .container
            .get_as::<Response>("response")
            .map(|response| (*response).clone())
            .unwrap_or_else(|err| {
                warn!(error = %err, "default response unavailable");
                default_response(&self.inner.settings.app)
            })
    }

    fn render_error(&self, request: &Request, response: &Response, err: &WireError) -> Response {
        let status = err.status_code();

        let rendered = if err.is_not_found() {
            warn!(path = request.path(), error = %err, "request ended in not found");
            response.with_not_found(&err.to_string(), Some(request_debug_data(request)))
        } else {
            if status.is_server_error() {
                error!(
                    path = request.path(),
                    status = status.as_u16(),
                    error_code = err.error_code(),
                    error = %err,
                    "request failed"
                );
            } else {
                warn!(
                    path = request.path(),
                    status = status.as_u16(),
                    error_code = err.error_code(),
                    error = %err,
                    "request rejected"
                );
            }

            let details = self.inner.settings.shows_error_details();
            let message = match err {
                WireError::Http { message, .. } => message.clone(),
                _ if details => err.to_string(),
                _ => status.canonical_reason().unwrap_or("Error").to_string(),
            };
            let extra = details.then(|| {
                let mut extra = Map::new();
                extra.insert("code".to_string(), Json::from(err.error_code()));
                extra
            });
            response.with_api_error(&message, status, extra, &err.to_string(), Some(err.debug_data()))
        };

        rendered.unwrap_or_else(|render_err| {
            error!(error = %render_err, "failed to render error response");
            response.with_status(status)
        })
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry.read();
        f.debug_struct("App")
            .field("debug", &self.inner.settings.app.debug)
            .field("middleware", &registry.middleware.len())
            .field("routes", &registry.routes.len())
            .finish_non_exhaustive()
    }
}

fn request_debug_data(request: &Request) -> Json {
    json!({
        "uri": request.uri().to_string(),
        "attributes": request.attribute_names(),
    })
}

/// Endpoint used when no route matched.
struct NotFoundEndpoint;

impl Endpoint for NotFoundEndpoint {
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        _route: Option<RouteContext>,
    ) -> BoxFuture<'a, WireResult<Response>> {
        Box::pin(async move {
            warn!(path = request.path(), "no route matched");
            response
                .with_not_found("Not found", Some(request_debug_data(&request)))
                .map_err(|err| WireError::internal_with_source("failed to render not-found page", err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wirebind_resolver::Signature;

    #[test]
    fn test_default_response_follows_settings() {
        let mut settings = Settings::development();
        settings.app.http_version = "2".to_string();
        settings.app.default_content_type = "application/json".to_string();

        let response = default_response(&settings.app);
        assert_eq!(response.version(), Version::HTTP_2);
        assert!(response.is_debug());
        assert_eq!(
            response.header_line(&http::header::CONTENT_TYPE),
            "application/json"
        );
    }

    #[test]
    fn test_build_registers_defaults() {
        let app = App::builder().service("debug", "custom".to_string()).build();
        let container = app.container();

        assert!(container.has("settings"));
        assert!(container.has("request"));
        assert_eq!(
            container.get_as::<String>("debug").unwrap().as_str(),
            "custom"
        );
        let response = container.get_as::<Response>("response").unwrap();
        assert_eq!(
            response.header_line(&http::header::CONTENT_TYPE),
            "text/html; charset=UTF-8"
        );
    }

    #[test]
    fn test_validator_rejects_and_can_be_disabled() {
        let noop = || {
            Target::callable(Signature::new(), |_inv| async move {
                Ok(wirebind_resolver::Reply::Empty)
            })
        };

        let strict = App::builder().build();
        let err = strict.get("/users", noop()).unwrap_err();
        assert!(matches!(err, WireError::InvalidPattern { .. }));
        assert!(strict.get("/users/", noop()).is_ok());
        assert!(strict.get("/feed.xml", noop()).is_ok());
        assert!(strict.get("/feed.xml/", noop()).is_err());

        let mut settings = Settings::default();
        settings.app.validate_patterns = false;
        let lax = App::new(settings);
        assert!(lax.get("/users", noop()).is_ok());
    }

    #[test]
    fn test_map_validates_all_patterns_first() {
        let app = App::builder().build();
        let target = Target::callable(Signature::new(), |_inv| async move {
            Ok(wirebind_resolver::Reply::Empty)
        });

        let err = app
            .map([Method::GET], ["/ok/", "/bad"], target)
            .unwrap_err();
        assert!(matches!(err, WireError::InvalidPattern { .. }));
        assert!(app.routes().is_empty());
    }

    #[test]
    fn test_path_for_fills_segments_and_query() {
        let app = App::builder().build();
        let noop = || {
            Target::callable(Signature::new(), |_inv| async move {
                Ok(wirebind_resolver::Reply::Empty)
            })
        };
        app.get("/{lang}/users/{id:\\d+}/", noop())
            .unwrap()
            .set_name("user");
        app.get("/about/", noop()).unwrap().set_name("about");
        app.set_default_segment("lang", "en");

        assert_eq!(app.path_for("about", &[], &[]).unwrap(), "/about/");
        assert_eq!(
            app.path_for("user", &[("id", "7")], &[]).unwrap(),
            "/en/users/7/"
        );
        assert_eq!(
            app.path_for("user", &[("id", "7"), ("lang", "fr")], &[("tab", "a b"), ("x", "1&2")])
                .unwrap(),
            "/fr/users/7/?tab=a+b&x=1%262"
        );

        let err = app.path_for("user", &[], &[]).unwrap_err();
        assert!(matches!(
            err,
            WireError::MissingRouteData { ref segment, .. } if segment == "id"
        ));
        let err = app.path_for("nobody", &[], &[]).unwrap_err();
        assert!(matches!(err, WireError::RouteNotNamed { ref name } if name == "nobody"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(App::not_found("gone").is_not_found());
        let err = App::error("teapot", StatusCode::IM_A_TEAPOT);
        assert_eq!(err.status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(err.to_string(), "teapot");
    }
}

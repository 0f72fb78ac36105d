//! End-to-end resolution through a pipeline: scoped middleware, converted
//! route arguments and controller instances.

use http::{Method, StatusCode, Uri};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wirebind_core::{Container, Request, Response, RouteContext, Value, WireError};
use wirebind_middleware::{ArgumentConverters, ConverterSpec, Pipeline, ScopeGuard};
use wirebind_resolver::{
    CallableResolver, ClassBuilder, ClassRegistry, Controller, ControllerState, ParamSpec, Reply,
    Signature, Target,
};

#[derive(Debug, PartialEq)]
struct Item {
    id: u64,
}

#[derive(Default)]
struct Items {
    state: ControllerState,
    calls: AtomicUsize,
}

impl Controller for Items {
    fn set_request_response(&self, request: Request, response: Response) {
        self.state.set(request, response);
    }
}

fn registry(constructed: Arc<AtomicUsize>) -> ClassRegistry {
    let mut classes = ClassRegistry::new();
    classes.register(
        ClassBuilder::<Items>::new("Items")
            .constructor(
                Signature::new().param(ParamSpec::named("request").nullable()),
                move |_inv| {
                    constructed.fetch_add(1, Ordering::SeqCst);
                    Ok(Items::default())
                },
            )
            .method(
                "endpointShow",
                Signature::new().param(ParamSpec::typed::<Item>("item")),
                |this: Arc<Items>, inv| async move {
                    let calls = this.calls.fetch_add(1, Ordering::SeqCst) + 1;
                    let id = inv.get::<Item>("item").map_or(0, |item| item.id);
                    let response = inv.response().unwrap_or_default();
                    Ok(Reply::from(
                        response.with_body_string(format!("item {id} call {calls}")),
                    ))
                },
            )
            .controller()
            .build(),
    );
    classes
}

fn request(path: &'static str) -> Request {
    Request::new(Method::GET, Uri::from_static(path))
}

fn item_converters() -> (ArgumentConverters, Arc<AtomicUsize>) {
    let converted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&converted);
    let converters = ArgumentConverters::new();
    converters.register(
        "item",
        ConverterSpec::new(move |raw, _name, _route| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(raw
                .and_then(|value| value.as_str().and_then(|s| s.parse::<u64>().ok()))
                .map(|id| Value::new(Item { id })))
        })
        .required_if_null(true),
    );
    (converters, converted)
}

#[tokio::test]
async fn converted_argument_reaches_controller_and_instance_is_shared() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let container = Arc::new(Container::new());
    let resolver = CallableResolver::new(Arc::clone(&container), Arc::new(registry(constructed.clone())));
    let (converters, _) = item_converters();
    let show = Arc::new(resolver.resolve(Target::method("Items", "show")).unwrap());

    for (path, expected) in [("/items/7", "item 7 call 1"), ("/items/9", "item 9 call 2")] {
        let route = RouteContext::new("/items/{item}").with_raw_argument("item", &path[7..]);
        let pipeline = Pipeline::builder()
            .boxed(Arc::new(converters.clone()))
            .route(route)
            .container(Arc::clone(&container))
            .build_shared(show.clone());

        let response = pipeline
            .run(Request::new(Method::GET, Uri::from_static(path)), Response::new())
            .await
            .unwrap();
        assert_eq!(response.body_text(), expected);
    }

    assert_eq!(constructed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn required_conversion_short_circuits_before_construction() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let resolver = CallableResolver::new(
        Arc::new(Container::new()),
        Arc::new(registry(constructed.clone())),
    );
    let (converters, converted) = item_converters();
    let show = resolver.resolve(Target::method("Items", "show")).unwrap();

    let pipeline = Pipeline::builder()
        .boxed(Arc::new(converters))
        .route(RouteContext::new("/items/{item}").with_raw_argument("item", "bad"))
        .build(show);

    let err = pipeline
        .run(request("/items/bad"), Response::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WireError::RequiredConversionMissing { ref argument } if argument == "item"));
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(converted.load(Ordering::SeqCst), 1);
    assert_eq!(constructed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn scoped_resolved_middleware_sees_guard_container() {
    let mut guard_services = Container::new();
    guard_services.set("tenant", "acme".to_string());
    let guard_container = Arc::new(guard_services);

    let resolver = CallableResolver::new(Arc::new(Container::new()), Arc::new(ClassRegistry::new()));
    let tag_tenant = Target::callable(
        Signature::names_only(["request", "response", "next", "tenant"]),
        |inv| async move {
            let (Some(request), Some(response), Some(next)) =
                (inv.request(), inv.response(), inv.next())
            else {
                return Err(WireError::internal("middleware called without continuation"));
            };
            let tenant = inv.str("tenant").unwrap_or_default();
            let request = request.with_attribute("tenant", Value::new(tenant));
            Ok(Reply::from(next.run(request, response).await?))
        },
    );
    let guard: ScopeGuard = resolver
        .resolve_scoped(
            tag_tenant,
            ScopeGuard::builder(guard_container, "/api").exclude(["/api/health"]),
        )
        .unwrap();

    let echo = resolver
        .resolve(Target::callable(
            Signature::new().param(ParamSpec::named("tenant").with_default(Value::from("none"))),
            |inv| async move {
                Ok(Reply::from(
                    Response::new().with_body_string(inv.str("tenant").unwrap_or_default()),
                ))
            },
        ))
        .unwrap();
    let pipeline = Pipeline::builder().middleware(guard).build(echo);

    let inside = pipeline.run(request("/api/users"), Response::new()).await.unwrap();
    assert_eq!(inside.body_text(), "acme");

    let excluded = pipeline.run(request("/api/health"), Response::new()).await.unwrap();
    assert_eq!(excluded.body_text(), "none");

    let nested = pipeline
        .run(request("/api/health/detail"), Response::new())
        .await
        .unwrap();
    assert_eq!(nested.body_text(), "acme");
}

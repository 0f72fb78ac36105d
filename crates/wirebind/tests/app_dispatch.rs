//! Integration tests for the app facade: registration, groups, dispatch
//! order and error rendering.

use bytes::Bytes;
use http::header::{HeaderName, CONTENT_TYPE};
use http::{HeaderValue, Method, StatusCode, Uri};
use serde_json::Value as Json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wirebind::middleware::FnMiddleware;
use wirebind::prelude::*;

type Trail = Arc<Mutex<Vec<&'static str>>>;

fn request(path: &str) -> Request {
    Request::new(Method::GET, path.parse::<Uri>().unwrap())
}

fn json_settings(debug: bool) -> Settings {
    let mut settings = if debug {
        Settings::development()
    } else {
        Settings::production()
    };
    settings.app.default_content_type = "application/json".to_string();
    settings
}

fn body_json(response: &Response) -> Json {
    serde_json::from_slice(response.body()).unwrap()
}

/// Middleware that records `name` on the way in.
fn mark(trail: &Trail, name: &'static str) -> impl Middleware {
    let trail = Arc::clone(trail);
    FnMiddleware::new(name, move |req: Request, res: Response, next: Next| {
        trail.lock().unwrap().push(name);
        next.run(req, res)
    })
}

/// Signature of a group callback.
fn group_signature() -> Signature {
    Signature::new().param(ParamSpec::typed::<App>("app"))
}

fn app_of(inv: &Invocation) -> WireResult<Arc<App>> {
    inv.get::<App>("app")
        .ok_or_else(|| WireError::internal("group callback without app"))
}

/// Handler that echoes the `id` route argument.
fn echo_id(trail: &Trail) -> Target {
    let trail = Arc::clone(trail);
    Target::callable(Signature::names_only(["response", "id"]), move |inv| {
        let trail = Arc::clone(&trail);
        async move {
            trail.lock().unwrap().push("handler");
            let id = inv.str("id").unwrap_or_default();
            let response = inv.response().unwrap_or_default();
            Ok(Reply::from(response.with_body_string(format!("item {id}"))))
        }
    })
}

fn text(body: &'static str) -> Target {
    Target::callable(Signature::names_only(["response"]), move |inv| async move {
        let response = inv.response().unwrap_or_default();
        Ok(Reply::from(response.with_body_string(body)))
    })
}

fn failing(error: fn() -> WireError) -> Target {
    Target::callable(Signature::new(), move |_inv| async move { Err(error()) })
}

#[tokio::test]
async fn dispatch_runs_app_group_and_route_middleware_in_order() {
    let trail: Trail = Arc::default();
    let app = App::builder().build();
    app.add_middleware(mark(&trail, "app-first"));
    app.add_middleware(mark(&trail, "app-second"));

    let outer_trail = Arc::clone(&trail);
    let outer = app
        .group(
            "/api",
            Target::callable(group_signature(), move |inv| {
                let trail = Arc::clone(&outer_trail);
                async move {
                    let app = app_of(&inv)?;
                    let inner_trail = Arc::clone(&trail);
                    let inner = app
                        .group(
                            "/v1",
                            Target::callable(group_signature(), move |inv| {
                                let trail = Arc::clone(&inner_trail);
                                async move {
                                    let app = app_of(&inv)?;
                                    let route = app.get("/items/{id}/", echo_id(&trail))?;
                                    route.add_middleware(mark(&trail, "route-first"));
                                    route.add_middleware(mark(&trail, "route-second"));
                                    Ok(Reply::Empty)
                                }
                            }),
                        )
                        .await?;
                    inner.add_middleware(mark(&trail, "inner"));
                    Ok(Reply::Empty)
                }
            }),
        )
        .await
        .unwrap();
    outer.add_middleware(mark(&trail, "outer"));
    assert!(app.current_group().is_none());

    let routes = app.routes();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].pattern, "/api/v1/items/{id}/");

    let matched = RouteMatch::new(routes[0].id, [("id", "7")]);
    let response = app.handle(request("/api/v1/items/7/"), Some(matched)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body_text(), "item 7");
    assert_eq!(
        *trail.lock().unwrap(),
        [
            "app-second",
            "app-first",
            "outer",
            "inner",
            "route-second",
            "route-first",
            "handler"
        ]
    );
}

#[derive(Debug)]
struct User(String);

fn user_of(route: &RouteContext) -> Option<Arc<User>> {
    route.argument("user").and_then(|value| value.downcast::<User>())
}

#[tokio::test]
async fn nested_group_converter_sees_parent_conversion() {
    let app = App::builder().build();
    let outer = app
        .group(
            "/users/{user}",
            Target::callable(group_signature(), |inv| async move {
                let app = app_of(&inv)?;
                let inner = app
                    .group(
                        "/posts",
                        Target::callable(group_signature(), |inv| async move {
                            let route = app_of(&inv)?.get(
                                "/{post}/",
                                Target::callable(
                                    Signature::names_only(["response", "post"]),
                                    |inv| async move {
                                        let post = inv.str("post").unwrap_or_default();
                                        let response = inv.response().unwrap_or_default();
                                        Ok(Reply::from(response.with_body_string(post)))
                                    },
                                ),
                            )?;
                            route.add_middleware(FnMiddleware::new(
                                "user-check",
                                |req: Request, res: Response, next: Next| {
                                    let converted = next.route().and_then(user_of).is_some();
                                    async move {
                                        let res = next.run(req, res).await?;
                                        Ok(res.with_header(
                                            HeaderName::from_static("x-user-converted"),
                                            HeaderValue::from_static(if converted {
                                                "yes"
                                            } else {
                                                "no"
                                            }),
                                        ))
                                    }
                                },
                            ));
                            Ok(Reply::Empty)
                        }),
                    )
                    .await?;
                inner.convert(
                    "post",
                    ConverterSpec::new(|raw, _name, route| {
                        let owner = user_of(route)
                            .map_or_else(|| "unconverted".to_string(), |user| user.0.clone());
                        let post = raw
                            .as_ref()
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string();
                        Ok(Some(Value::from(format!("{owner}/{post}"))))
                    }),
                );
                Ok(Reply::Empty)
            }),
        )
        .await
        .unwrap();
    outer.convert(
        "user",
        ConverterSpec::new(|raw, _name, _route| {
            Ok(raw.and_then(|value| value.as_str().map(|name| Value::new(User(name.to_uppercase())))))
        }),
    );

    let routes = app.routes();
    let route = &routes[0];
    assert_eq!(route.pattern, "/users/{user}/posts/{post}/");

    let matched = RouteMatch::new(route.id, [("user", "ada"), ("post", "1")]);
    let response = app.handle(request("/users/ada/posts/1/"), Some(matched)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body_text(), "ADA/1");
    assert_eq!(
        response.header_line(&HeaderName::from_static("x-user-converted")),
        "yes"
    );
}

async fn register_pair(app: &App, prefix: &str) -> WireResult<Arc<RouteGroup>> {
    app.group(
        prefix,
        Target::callable(group_signature(), |inv| async move {
            let app = app_of(&inv)?;
            tokio::task::yield_now().await;
            app.get("/x/", text("x"))?;
            tokio::task::yield_now().await;
            app.get("/y/", text("y"))?;
            Ok(Reply::Empty)
        }),
    )
    .await
}

#[tokio::test]
async fn concurrent_groups_keep_their_own_prefixes() {
    let app = App::builder().build();
    let (first, second) = tokio::join!(register_pair(&app, "/a"), register_pair(&app, "/b"));
    first.unwrap();
    second.unwrap();

    let mut patterns: Vec<String> = app.routes().into_iter().map(|route| route.pattern).collect();
    patterns.sort();
    assert_eq!(patterns, ["/a/x/", "/a/y/", "/b/x/", "/b/y/"]);
    assert!(app.current_group().is_none());
}

#[tokio::test]
async fn scoped_middleware_in_group_is_prefixed() {
    let app = App::builder().build();
    app.group(
        "/admin",
        Target::callable(group_signature(), |inv| async move {
            let app = app_of(&inv)?;
            app.add_scoped(
                "/",
                Target::callable(
                    Signature::names_only(["request", "response", "next"]),
                    |inv| async move {
                        let (Some(request), Some(response), Some(next)) =
                            (inv.request(), inv.response(), inv.next())
                        else {
                            return Err(WireError::internal("middleware without continuation"));
                        };
                        let response = next.run(request, response).await?;
                        Ok(Reply::from(response.with_header(
                            HeaderName::from_static("x-admin"),
                            HeaderValue::from_static("1"),
                        )))
                    },
                ),
                ["/admin/login/"],
            )?;
            app.get("/users/", text("users"))?;
            app.get("/login/", text("login"))?;
            Ok(Reply::Empty)
        }),
    )
    .await
    .unwrap();
    let public = app.get("/public/", text("public")).unwrap();

    let routes = app.routes();
    let dispatch = |path: &'static str, id: usize| {
        let app = app.clone();
        async move { app.handle(request(path), Some(RouteMatch::empty(id))).await }
    };

    let users = dispatch("/admin/users/", routes[0].id).await;
    assert_eq!(users.body_text(), "users");
    assert_eq!(users.header_line(&HeaderName::from_static("x-admin")), "1");

    let login = dispatch("/admin/login/", routes[1].id).await;
    assert_eq!(login.body_text(), "login");
    assert_eq!(login.header_line(&HeaderName::from_static("x-admin")), "");

    let outside = dispatch("/public/", public.id()).await;
    assert_eq!(outside.body_text(), "public");
    assert_eq!(outside.header_line(&HeaderName::from_static("x-admin")), "");
}

#[derive(Default)]
struct Items {
    state: ControllerState,
}

impl Controller for Items {
    fn set_request_response(&self, request: Request, response: Response) {
        self.state.set(request, response);
    }
}

#[tokio::test]
async fn group_converter_feeds_controller_endpoint() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&constructed);
    let app = App::builder()
        .class(
            ClassBuilder::<Items>::new("Items")
                .constructor(Signature::new(), move |_inv| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Items::default())
                })
                .method(
                    "endpointShow",
                    Signature::new().param(ParamSpec::typed::<u64>("id")),
                    |this: Arc<Items>, inv| async move {
                        let id = inv.get::<u64>("id").map_or(0, |id| *id);
                        let response = this.state.response().unwrap_or_default();
                        Ok(Reply::from(response.with_body_string(format!("item {id}"))))
                    },
                )
                .controller()
                .build(),
        )
        .build();

    let group = app
        .group(
            "/items",
            Target::callable(group_signature(), |inv| async move {
                app_of(&inv)?.get("/{id}/", Target::method("Items", "show"))?;
                Ok(Reply::Empty)
            }),
        )
        .await
        .unwrap();
    group.convert(
        "id",
        ConverterSpec::new(|raw, _name, _route| {
            Ok(raw
                .and_then(|value| value.as_str().and_then(|s| s.parse::<u64>().ok()))
                .map(Value::new))
        })
        .required_if_null(true),
    );

    let id = app.routes()[0].id;
    let found = app
        .handle(request("/items/5/"), Some(RouteMatch::new(id, [("id", "5")])))
        .await;
    assert_eq!(found.body_text(), "item 5");

    let missing = app
        .handle(request("/items/x/"), Some(RouteMatch::new(id, [("id", "x")])))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(constructed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_match_renders_not_found_with_request_details() {
    let trail: Trail = Arc::default();
    let app = App::new(json_settings(true));
    app.add_middleware(mark(&trail, "app"));

    let req = request("/nowhere").with_attribute("user", Value::from("ada"));
    let response = app.handle(req.clone(), None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(*trail.lock().unwrap(), ["app"]);
    let body = body_json(&response);
    assert_eq!(body["error"], 404);
    assert_eq!(body["message"], "Not Found");
    assert_eq!(body["_debug"]["message"], "Not found");
    assert_eq!(body["_debug"]["data"]["uri"], "/nowhere");
    assert_eq!(body["_debug"]["data"]["attributes"][0], "user");

    let unknown = app.handle(req, Some(RouteMatch::empty(99))).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn not_found_html_hides_details_outside_debug() {
    let app = App::new(Settings::production());
    let response = app.handle(request("/nowhere"), None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.body_text(), "Not Found");
    assert_eq!(
        response.header_line(&CONTENT_TYPE),
        "text/html; charset=UTF-8"
    );
}

#[tokio::test]
async fn handler_errors_render_with_their_status() {
    let app = App::new(json_settings(false));
    let teapot = app
        .get("/teapot/", failing(|| App::error("short and stout", StatusCode::IM_A_TEAPOT)))
        .unwrap();
    let gone = app
        .get("/gone/", failing(|| App::not_found("no such item")))
        .unwrap();
    let broken = app
        .get("/broken/", failing(|| WireError::internal("database down")))
        .unwrap();

    let response = app
        .handle(request("/teapot/"), Some(RouteMatch::empty(teapot.id())))
        .await;
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    let body = body_json(&response);
    assert_eq!(body["error"], "short and stout");
    assert_eq!(body["status"], 418);

    let response = app
        .handle(request("/gone/"), Some(RouteMatch::empty(gone.id())))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .handle(request("/broken/"), Some(RouteMatch::empty(broken.id())))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(&response);
    assert_eq!(body["error"], "Internal Server Error");
    assert!(body.get("code").is_none());
    assert!(body.get("_debug").is_none());
}

#[tokio::test]
async fn debug_mode_exposes_error_details() {
    let app = App::new(json_settings(true));
    let broken = app
        .get("/broken/", failing(|| WireError::internal("database down")))
        .unwrap();

    let response = app
        .handle(request("/broken/"), Some(RouteMatch::empty(broken.id())))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(&response);
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert!(body["error"].as_str().unwrap().contains("database down"));
    assert_eq!(body["_debug"]["data"]["exception"]["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn route_listing_and_http_round_trip() {
    let app = App::builder().build();
    app.any("/ping/", text("pong")).unwrap().set_name("ping");
    let mapped = app
        .map([Method::GET, Method::POST], ["/a/", "/b.json"], text("mapped"))
        .unwrap();
    assert_eq!(mapped.len(), 2);

    let routes = app.routes();
    assert_eq!(routes.len(), 3);
    assert_eq!(routes[0].name.as_deref(), Some("ping"));
    assert_eq!(routes[0].methods.len(), 6);
    assert_eq!(routes[2].pattern, "/b.json");
    assert_eq!(routes[2].methods, vec![Method::GET, Method::POST]);

    let request = http::Request::builder()
        .method(Method::GET)
        .uri("/ping/")
        .body(Bytes::new())
        .unwrap();
    let response = app
        .handle_http(request, Some(RouteMatch::empty(routes[0].id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"pong");
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "text/html; charset=UTF-8"
    );
}

#[tokio::test]
async fn route_middleware_can_be_resolved_targets() {
    let app = App::builder().service("greeting", "hi".to_string()).build();
    let route = app.get("/hello/", text("body")).unwrap();
    route
        .add(Target::callable(
            Signature::names_only(["request", "response", "next", "greeting"]),
            |inv| async move {
                let (Some(request), Some(response), Some(next)) =
                    (inv.request(), inv.response(), inv.next())
                else {
                    return Err(WireError::internal("middleware without continuation"));
                };
                let greeting = inv.str("greeting").unwrap_or_default();
                let response = next.run(request, response).await?;
                Ok(Reply::from(response.with_body_string(format!(
                    "{greeting} {}",
                    response.body_text()
                ))))
            },
        ))
        .unwrap();

    let response = app
        .handle(request("/hello/"), Some(RouteMatch::empty(route.id())))
        .await;
    assert_eq!(response.body_text(), "hi body");
}

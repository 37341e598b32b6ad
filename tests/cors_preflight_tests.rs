use http::Method;
use routecors::middleware::cors::{CorsConfig, OriginOptionsTable, ResourceOptions};
use routecors::router::Router;

mod common;
use common::{headers, preflight_headers, TestApp, CLIENT1, CLIENT2};

fn app_with(table: OriginOptionsTable) -> TestApp {
    let mut router = Router::new();
    let get = router.add_route(Method::GET, "/", "index");
    let mut cors = CorsConfig::new(OriginOptionsTable::new());
    cors.register(&mut router, get, table).unwrap();
    TestApp::new(router, cors)
}

fn client1_only(options: ResourceOptions) -> TestApp {
    app_with(OriginOptionsTable::new().with(CLIENT1, options))
}

fn with_allowed_headers() -> TestApp {
    client1_only(
        ResourceOptions::builder()
            .allow_headers(["Content-Type", "X-Header"])
            .build()
            .unwrap(),
    )
}

#[test]
fn test_preflight_default_options() {
    let app = client1_only(ResourceOptions::default());
    let resp = app.preflight("/", preflight_headers(CLIENT1, "GET"));

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body_text(), "");
    assert_eq!(resp.get_header("Access-Control-Allow-Origin"), Some(CLIENT1));
    assert_eq!(resp.get_header("Access-Control-Allow-Methods"), Some("GET"));
    assert!(!resp.has_header("Access-Control-Allow-Credentials"));
    assert!(!resp.has_header("Access-Control-Max-Age"));
    assert!(!resp.has_header("Access-Control-Expose-Headers"));
    assert!(!resp.has_header("Access-Control-Allow-Headers"));
}

#[test]
fn test_preflight_method_not_served() {
    let app = client1_only(ResourceOptions::default());
    let resp = app.preflight("/", preflight_headers(CLIENT1, "POST"));

    assert_eq!(resp.status, 403);
    assert!(resp
        .body_text()
        .contains("request method 'POST' is not allowed"));
    assert!(!resp.has_header("Access-Control-Allow-Origin"));
}

#[test]
fn test_preflight_disallowed_header() {
    let app = with_allowed_headers();
    let mut req = preflight_headers(CLIENT1, "GET");
    req.extend(headers(&[("Access-Control-Request-Headers", "content-type,Test")]));
    let resp = app.preflight("/", req);

    assert_eq!(resp.status, 403);
    assert!(resp.body_text().contains("headers are not allowed: TEST"));
    assert!(!resp.has_header("Access-Control-Allow-Headers"));
}

#[test]
fn test_preflight_allowed_headers() {
    let app = with_allowed_headers();
    let mut req = preflight_headers(CLIENT1, "GET");
    req.extend(headers(&[("Access-Control-Request-Headers", "X-Header,content-type")]));
    let resp = app.preflight("/", req);

    assert_eq!(resp.status, 200);
    let mut echoed: Vec<String> = resp
        .get_header("Access-Control-Allow-Headers")
        .unwrap()
        .split(',')
        .map(|h| h.to_ascii_uppercase())
        .collect();
    echoed.sort();
    assert_eq!(echoed, vec!["CONTENT-TYPE", "X-HEADER"]);
}

#[test]
fn test_preflight_echoes_request_header_case() {
    let app = with_allowed_headers();
    let mut req = preflight_headers(CLIENT1, "GET");
    req.extend(headers(&[("Access-Control-Request-Headers", " x-header , Content-Type")]));
    let resp = app.preflight("/", req);

    assert_eq!(
        resp.get_header("Access-Control-Allow-Headers"),
        Some("x-header,Content-Type")
    );
}

#[test]
fn test_preflight_credentials_and_max_age() {
    let app = client1_only(
        ResourceOptions::builder()
            .allow_credentials(true)
            .max_age(3600)
            .build()
            .unwrap(),
    );
    let resp = app.preflight("/", preflight_headers(CLIENT1, "GET"));

    assert_eq!(resp.status, 200);
    assert_eq!(resp.get_header("Access-Control-Allow-Credentials"), Some("true"));
    assert_eq!(resp.get_header("Access-Control-Max-Age"), Some("3600"));
}

#[test]
fn test_preflight_wildcard_origin_is_echoed() {
    let app = app_with(OriginOptionsTable::new().with("*", ResourceOptions::default()));
    let resp = app.preflight("/", preflight_headers(CLIENT2, "GET"));

    assert_eq!(resp.status, 200);
    assert_eq!(resp.get_header("Access-Control-Allow-Origin"), Some(CLIENT2));
}

#[test]
fn test_preflight_missing_origin() {
    let app = client1_only(ResourceOptions::default());
    let resp = app.preflight(
        "/",
        headers(&[("Access-Control-Request-Method", "GET")]),
    );

    assert_eq!(resp.status, 403);
    assert_eq!(
        resp.body_text(),
        "CORS preflight request failed: origin header is not specified in the request"
    );
}

#[test]
fn test_preflight_missing_request_method() {
    let app = client1_only(ResourceOptions::default());
    let resp = app.preflight("/", headers(&[("Origin", CLIENT1)]));

    assert_eq!(resp.status, 403);
    assert_eq!(
        resp.body_text(),
        "CORS preflight request failed: 'Access-Control-Request-Method' header is not specified"
    );
}

#[test]
fn test_preflight_no_origins_configured() {
    let app = app_with(OriginOptionsTable::new());
    let resp = app.preflight("/", preflight_headers(CLIENT1, "GET"));

    assert_eq!(resp.status, 403);
    assert_eq!(
        resp.body_text(),
        "CORS preflight request failed: no origins are allowed"
    );
}

#[test]
fn test_preflight_unknown_origin() {
    let app = client1_only(ResourceOptions::default());
    let resp = app.preflight("/", preflight_headers(CLIENT2, "GET"));

    assert_eq!(resp.status, 403);
    assert_eq!(
        resp.body_text(),
        format!("CORS preflight request failed: origin '{CLIENT2}' is not allowed")
    );
}

#[test]
fn test_origin_failure_reported_before_method_failure() {
    let app = client1_only(ResourceOptions::default());
    let resp = app.preflight("/", preflight_headers(CLIENT2, "DELETE"));

    assert_eq!(resp.status, 403);
    let body = resp.body_text();
    assert!(body.contains("origin 'http://client2.example.org' is not allowed"));
    assert!(!body.contains("request method"));
}

#[test]
fn test_method_failure_reported_before_header_failure() {
    let app = with_allowed_headers();
    let mut req = preflight_headers(CLIENT1, "PATCH");
    req.extend(headers(&[("Access-Control-Request-Headers", "X-Unknown")]));
    let resp = app.preflight("/", req);

    assert_eq!(resp.status, 403);
    assert!(resp.body_text().contains("request method 'PATCH' is not allowed"));
}

#[test]
fn test_preflight_explicit_allow_methods() {
    let app = client1_only(
        ResourceOptions::builder()
            .allow_methods(["GET", "DELETE"])
            .build()
            .unwrap(),
    );

    let resp = app.preflight("/", preflight_headers(CLIENT1, "DELETE"));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.get_header("Access-Control-Allow-Methods"), Some("DELETE"));

    let resp = app.preflight("/", preflight_headers(CLIENT1, "PUT"));
    assert_eq!(resp.status, 403);
}

#[test]
fn test_shared_preflight_merges_methods() {
    let mut router = Router::new();
    let get = router.add_route(Method::GET, "/x", "get_x");
    let put = router.add_route(Method::PUT, "/x", "put_x");

    let defaults = OriginOptionsTable::new().with(
        "*",
        ResourceOptions::builder()
            .allow_credentials(true)
            .allow_all_headers()
            .build()
            .unwrap(),
    );
    let mut cors = CorsConfig::new(defaults);
    cors.register_default(&mut router, get).unwrap();
    cors.register_default(&mut router, put).unwrap();

    let preflight_routes = router
        .routes()
        .filter(|(_, meta)| meta.method == Method::OPTIONS)
        .count();
    assert_eq!(preflight_routes, 1);

    let app = TestApp::new(router, cors);
    let resp = app.preflight("/x", preflight_headers(CLIENT1, "PUT"));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body_text(), "");
    assert_eq!(resp.get_header("Access-Control-Allow-Methods"), Some("PUT"));
    assert_eq!(resp.get_header("Access-Control-Allow-Credentials"), Some("true"));

    let resp = app.preflight("/x", preflight_headers(CLIENT1, "GET"));
    assert_eq!(resp.status, 200);

    let resp = app.preflight("/x", preflight_headers(CLIENT1, "DELETE"));
    assert_eq!(resp.status, 403);
}

#[test]
fn test_preflight_uses_owner_of_requested_method() {
    let mut router = Router::new();
    let get = router.add_route(Method::GET, "/x", "get_x");
    let put = router.add_route(Method::PUT, "/x", "put_x");

    let mut cors = CorsConfig::new(OriginOptionsTable::new());
    cors.register(
        &mut router,
        get,
        OriginOptionsTable::new().with(CLIENT1, ResourceOptions::default()),
    )
    .unwrap();
    cors.register(
        &mut router,
        put,
        OriginOptionsTable::new().with(CLIENT2, ResourceOptions::default()),
    )
    .unwrap();
    let app = TestApp::new(router, cors);

    assert_eq!(app.preflight("/x", preflight_headers(CLIENT1, "GET")).status, 200);
    assert_eq!(app.preflight("/x", preflight_headers(CLIENT2, "PUT")).status, 200);
    assert_eq!(app.preflight("/x", preflight_headers(CLIENT1, "PUT")).status, 403);
    assert_eq!(app.preflight("/x", preflight_headers(CLIENT2, "GET")).status, 403);
}

#[test]
fn test_preflight_route_with_path_params() {
    let mut router = Router::new();
    let get = router.add_route(Method::GET, "/items/{id}", "get_item");
    let mut cors = CorsConfig::new(OriginOptionsTable::new().with("*", ResourceOptions::default()));
    cors.register_default(&mut router, get).unwrap();
    let app = TestApp::new(router, cors);

    let resp = app.preflight("/items/42", preflight_headers(CLIENT1, "GET"));
    assert_eq!(resp.status, 200);
    assert!(app.cors.config().is_preflight_route(
        app.router.route(Method::OPTIONS, "/items/42").unwrap().route_id
    ));
}

#[test]
fn test_preflight_merges_overlapping_patterns() {
    let mut router = Router::new();
    let get = router.add_route(Method::GET, "/items/{id}", "get_item");
    let put = router.add_route(Method::PUT, "/items/special", "put_special");

    let mut cors = CorsConfig::new(OriginOptionsTable::new());
    for route in [get, put] {
        cors.register(
            &mut router,
            route,
            OriginOptionsTable::new().with("*", ResourceOptions::default()),
        )
        .unwrap();
    }
    let app = TestApp::new(router, cors);

    let resp = app.request(Method::PUT, "/items/special", headers(&[("Origin", CLIENT1)]));
    assert_eq!(resp.get_header("Access-Control-Allow-Origin"), Some(CLIENT1));

    let resp = app.preflight("/items/special", preflight_headers(CLIENT1, "PUT"));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.get_header("Access-Control-Allow-Methods"), Some("PUT"));

    let resp = app.preflight("/items/special", preflight_headers(CLIENT1, "GET"));
    assert_eq!(resp.status, 200);

    let resp = app.preflight("/items/7", preflight_headers(CLIENT1, "PUT"));
    assert_eq!(resp.status, 403);
    assert!(resp.body_text().contains("request method 'PUT' is not allowed"));
}

#[test]
fn test_overlapping_pattern_supplies_its_own_policy() {
    let mut router = Router::new();
    let get = router.add_route(Method::GET, "/items/{id}", "get_item");
    let put = router.add_route(Method::PUT, "/items/special", "put_special");

    let mut cors = CorsConfig::new(OriginOptionsTable::new());
    cors.register(
        &mut router,
        get,
        OriginOptionsTable::new().with(CLIENT1, ResourceOptions::default()),
    )
    .unwrap();
    cors.register(
        &mut router,
        put,
        OriginOptionsTable::new().with(CLIENT2, ResourceOptions::default()),
    )
    .unwrap();
    let app = TestApp::new(router, cors);

    assert_eq!(
        app.preflight("/items/special", preflight_headers(CLIENT2, "PUT")).status,
        200
    );
    assert_eq!(
        app.preflight("/items/special", preflight_headers(CLIENT1, "PUT")).status,
        403
    );
    assert_eq!(
        app.preflight("/items/special", preflight_headers(CLIENT1, "GET")).status,
        200
    );
}

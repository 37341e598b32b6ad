use std::thread;

use http::Method;
use routecors::middleware::cors::{CorsConfig, OriginOptionsTable, ResourceOptions};
use routecors::router::Router;

mod common;
use common::{headers, preflight_headers, TestApp, CLIENT1, CLIENT2};

const WORKERS: usize = 8;
const ITERATIONS: usize = 200;

fn shared_app() -> TestApp {
    let mut router = Router::new();
    let get = router.add_route(Method::GET, "/items/{id}", "get_item");
    let put = router.add_route(Method::PUT, "/items/{id}", "put_item");

    let mut cors = CorsConfig::new(OriginOptionsTable::new());
    cors.register(
        &mut router,
        get,
        OriginOptionsTable::new().with(
            CLIENT1,
            ResourceOptions::builder()
                .allow_credentials(true)
                .build()
                .unwrap(),
        ),
    )
    .unwrap();
    cors.register(
        &mut router,
        put,
        OriginOptionsTable::new().with(CLIENT2, ResourceOptions::builder().max_age(30).build().unwrap()),
    )
    .unwrap();
    TestApp::new(router, cors)
}

#[test]
fn test_shared_middleware_serves_concurrent_requests() {
    let app = shared_app();

    thread::scope(|scope| {
        for worker in 0..WORKERS {
            let app = &app;
            scope.spawn(move || {
                for i in 0..ITERATIONS {
                    let path = format!("/items/{}", worker * ITERATIONS + i);
                    match i % 4 {
                        0 => {
                            let resp = app.preflight(&path, preflight_headers(CLIENT1, "GET"));
                            assert_eq!(resp.status, 200);
                            assert_eq!(
                                resp.get_header("Access-Control-Allow-Credentials"),
                                Some("true")
                            );
                        }
                        1 => {
                            let resp = app.preflight(&path, preflight_headers(CLIENT2, "PUT"));
                            assert_eq!(resp.status, 200);
                            assert_eq!(resp.get_header("Access-Control-Max-Age"), Some("30"));
                        }
                        2 => {
                            let resp = app.preflight(&path, preflight_headers(CLIENT2, "GET"));
                            assert_eq!(resp.status, 403);
                        }
                        _ => {
                            let resp =
                                app.request(Method::GET, &path, headers(&[("Origin", CLIENT1)]));
                            assert_eq!(resp.status, 200);
                            assert_eq!(
                                resp.get_header("Access-Control-Allow-Origin"),
                                Some(CLIENT1)
                            );
                        }
                    }
                }
            });
        }
    });

    let resp = app.request(Method::PUT, "/items/1", headers(&[("Origin", CLIENT2)]));
    assert_eq!(resp.get_header("Access-Control-Allow-Origin"), Some(CLIENT2));
}

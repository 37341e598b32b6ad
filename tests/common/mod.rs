//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use http::Method;
use routecors::dispatcher::{Dispatcher, HandlerResponse, HeaderVec};
use routecors::middleware::cors::{CorsConfig, CorsMiddleware};
use routecors::router::Router;

pub const CLIENT1: &str = "http://client1.example.org";
pub const CLIENT2: &str = "http://client2.example.org";

/// Header list from `(name, value)` pairs.
pub fn headers(pairs: &[(&str, &str)]) -> HeaderVec {
    pairs
        .iter()
        .map(|(k, v)| ((*k).into(), (*v).to_string()))
        .collect()
}

/// Preflight headers for `origin` asking for `method`.
pub fn preflight_headers(origin: &str, method: &str) -> HeaderVec {
    headers(&[
        ("Origin", origin),
        ("Access-Control-Request-Method", method),
    ])
}

/// A router/dispatcher pair with the CORS layer installed.
pub struct TestApp {
    pub router: Router,
    pub dispatcher: Dispatcher,
    pub cors: Arc<CorsMiddleware>,
}

impl TestApp {
    /// Install `cors` on a dispatcher where every non-preflight route answers
    /// 200 with the text `"{handler_name} response"` and an `X-Server` header.
    pub fn new(router: Router, cors: CorsConfig) -> Self {
        let mut dispatcher = Dispatcher::new();
        for (_, meta) in router.routes().filter(|(_, meta)| !meta.preflight) {
            let body = format!("{} response", meta.handler_name);
            dispatcher.register(&meta.handler_name, move |_| {
                let mut res = HandlerResponse::text(200, &body);
                res.set_header("X-Server", "routecors-test".to_string());
                res
            });
        }
        let cors = Arc::new(cors.build());
        Arc::clone(&cors).install(&mut dispatcher);
        Self {
            router,
            dispatcher,
            cors,
        }
    }

    pub fn request(&self, method: Method, path: &str, headers: HeaderVec) -> HandlerResponse {
        self.dispatcher.handle(&self.router, method, path, headers)
    }

    pub fn preflight(&self, path: &str, headers: HeaderVec) -> HandlerResponse {
        self.request(Method::OPTIONS, path, headers)
    }
}

/// Every `Access-Control-*` response header present on `res`.
pub fn cors_headers(res: &HandlerResponse) -> Vec<String> {
    res.header_names()
        .filter(|name| name.to_ascii_lowercase().starts_with("access-control-"))
        .map(str::to_string)
        .collect()
}

//! Dispatcher core module - request/response types and the handler registry.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]

use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::middleware::Middleware;
use crate::router::{ParamVec, RouteId, RouteMatch, Router};
use http::Method;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path.
///
/// Header names are `Arc<str>` so that static names clone in O(1).
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request data passed to a handler.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path
    pub path: String,
    /// Name of the handler that should process this request
    pub handler_name: String,
    /// Route the router matched for this request
    pub route_id: RouteId,
    /// Path parameters extracted from the URL
    pub path_params: ParamVec,
    /// HTTP headers
    pub headers: HeaderVec,
}

impl HandlerRequest {
    /// Get a path parameter by name (last occurrence wins).
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response data produced by a handler or a short-circuiting middleware.
///
/// A `Value::Null` body is an empty body; a `Value::String` body is sent as
/// plain text; anything else is sent as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers in insertion order
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body
    pub body: Value,
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Plain text response
    #[must_use]
    pub fn text(status: u16, body: &str) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "text/plain; charset=utf-8".to_string()));
        Self::new(status, headers, Value::String(body.to_string()))
    }

    /// Create a JSON response with default headers
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self::new(status, headers, body)
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Body rendered as text; empty for a `Null` body.
    #[must_use]
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Get a header by name (case-insensitive)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Header names in insertion order.
    pub fn header_names(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|(k, _)| k.as_ref())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// A synchronous request handler.
pub type Handler = Arc<dyn Fn(&HandlerRequest) -> HandlerResponse + Send + Sync>;

/// Dispatcher that routes matched requests to registered handlers.
///
/// Middleware `before` hooks run in registration order and the first one to
/// return a response short-circuits the handler. Every `after` hook then runs
/// on the final response, short-circuited or not.
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Handler>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        if self.handlers.insert(name.to_string(), Arc::new(handler)).is_some() {
            warn!(handler_name = %name, "Handler replaced");
        }
    }

    #[must_use]
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    /// Dispatch an already-routed request.
    #[must_use]
    pub fn dispatch(&self, route_match: RouteMatch, headers: HeaderVec) -> HandlerResponse {
        let request_id = RequestId::from_header_or_new(
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(REQUEST_ID_HEADER))
                .map(|(_, v)| v.as_str()),
        );
        let req = HandlerRequest {
            request_id,
            method: route_match.route.method.clone(),
            path: route_match.path,
            handler_name: route_match.handler_name,
            route_id: route_match.route_id,
            path_params: route_match.path_params,
            headers,
        };

        let start = Instant::now();
        let short_circuit = self.middlewares.iter().find_map(|mw| mw.before(&req));
        let mut response = match short_circuit {
            Some(resp) => resp,
            None => self.invoke(&req),
        };
        let latency = start.elapsed();

        for mw in &self.middlewares {
            mw.after(&req, &mut response, latency);
        }
        response
    }

    /// Route and dispatch a raw request; unmatched requests get a 404.
    #[must_use]
    pub fn handle(
        &self,
        router: &Router,
        method: Method,
        path: &str,
        headers: HeaderVec,
    ) -> HandlerResponse {
        match router.route(method, path) {
            Some(route_match) => self.dispatch(route_match, headers),
            None => HandlerResponse::error(404, "Not Found"),
        }
    }

    fn invoke(&self, req: &HandlerRequest) -> HandlerResponse {
        match self.handlers.get(&req.handler_name) {
            Some(handler) => {
                debug!(
                    request_id = %req.request_id,
                    handler_name = %req.handler_name,
                    "Invoking handler"
                );
                handler(req)
            }
            None => {
                warn!(
                    request_id = %req.request_id,
                    handler_name = %req.handler_name,
                    "No handler registered for route"
                );
                HandlerResponse::error(404, "Handler not found")
            }
        }
    }
}

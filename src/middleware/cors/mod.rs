//! # CORS Module
//!
//! Cross-Origin Resource Sharing enforcement bound to the [`Router`](crate::router::Router).
//!
//! Policies are configured per routing entity at setup time with a
//! [`CorsConfig`]. Registering an entity installs a synthetic OPTIONS route at
//! its path; several routes on one path share that route. Once frozen into a
//! [`CorsMiddleware`], the configuration is read-only:
//!
//! - OPTIONS requests on a synthetic route run the preflight checks and get
//!   either a 200 with `Access-Control-Allow-*` headers or a 403 whose text
//!   body names the failed check
//! - responses of registered routes get `Access-Control-Allow-Origin` and
//!   friends when the request's `Origin` is allowed
//!
//! ## Policy layers
//!
//! Each entity resolves an origin against an ordered list of
//! [`OriginOptionsTable`]s: its own table, then the resource defaults, then
//! the global defaults. The first table holding the origin, or `"*"`, wins for
//! that origin as a whole. Options are never merged field by field.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use http::Method;
//! use routecors::dispatcher::{Dispatcher, HandlerResponse, HeaderVec};
//! use routecors::middleware::cors::{CorsConfig, OriginOptionsTable, ResourceOptions};
//! use routecors::router::Router;
//!
//! let mut router = Router::new();
//! let get = router.add_route(Method::GET, "/items", "list_items");
//!
//! let mut cors = CorsConfig::new(OriginOptionsTable::new());
//! cors.register(
//!     &mut router,
//!     get,
//!     OriginOptionsTable::new().with("http://client.example", ResourceOptions::default()),
//! )
//! .unwrap();
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register("list_items", |_| HandlerResponse::text(200, "[]"));
//! Arc::new(cors.build()).install(&mut dispatcher);
//!
//! let mut headers = HeaderVec::new();
//! headers.push(("Origin".into(), "http://client.example".to_string()));
//! headers.push(("Access-Control-Request-Method".into(), "GET".to_string()));
//! let resp = dispatcher.handle(&router, Method::OPTIONS, "/items", headers);
//!
//! assert_eq!(resp.status, 200);
//! assert_eq!(resp.get_header("Access-Control-Allow-Methods"), Some("GET"));
//! ```

mod adapter;
mod builder;
mod config;
mod decorate;
mod error;
pub mod headers;
mod options;
mod preflight;
mod route_config;
mod table;
mod view;

pub use adapter::{RouterAdapter, PREFLIGHT_HANDLER_NAME};
pub use builder::ResourceOptionsBuilder;
pub use config::CorsConfig;
pub use decorate::decorate_response;
pub use error::{CorsConfigError, PreflightRejection};
pub use options::{AllOrSome, ResourceOptions};
pub use preflight::{evaluate, parse_request_headers, PreflightGrant, PreflightTarget, RequestedHeader};
pub use route_config::{CorsFileConfig, RouteEntry};
pub use table::{ConfigChain, OriginOptionsTable, ANY_ORIGIN};
pub use view::{CorsView, MethodOverrides};

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
use crate::middleware::Middleware;
use headers::ORIGIN;

/// Frozen CORS configuration wired into a [`Dispatcher`].
///
/// Serves the synthetic preflight routes and decorates responses of
/// registered routes. Holds no mutable state, so one instance is shared by
/// every request.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    config: Arc<CorsConfig>,
}

impl CorsMiddleware {
    #[must_use]
    pub fn new(config: CorsConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CorsConfig {
        &self.config
    }

    /// Register the preflight handler and the response hook on `dispatcher`.
    pub fn install(self: Arc<Self>, dispatcher: &mut Dispatcher) {
        let preflight = Arc::clone(&self);
        dispatcher.register(PREFLIGHT_HANDLER_NAME, move |req| preflight.handle_preflight(req));
        dispatcher.add_middleware(self);
    }

    /// Answer a preflight request routed to a synthetic OPTIONS route.
    #[must_use]
    pub fn handle_preflight(&self, req: &HandlerRequest) -> HandlerResponse {
        match evaluate(req, |method| {
            self.config.preflight_target(req.route_id, &req.path, method)
        }) {
            Ok(grant) => {
                debug!(
                    request_id = %req.request_id,
                    origin = %grant.origin,
                    method = %grant.method,
                    path = %req.path,
                    "CORS preflight accepted"
                );
                grant.into_response()
            }
            Err(rejection) => {
                warn!(
                    request_id = %req.request_id,
                    origin = req.get_header(ORIGIN),
                    path = %req.path,
                    reason = %rejection,
                    "CORS preflight rejected"
                );
                rejection.into_response()
            }
        }
    }

    /// Add CORS headers to the response of an actual request.
    ///
    /// No-op without an `Origin` header, on routes without CORS, and for
    /// origins no policy layer mentions.
    pub fn decorate(&self, req: &HandlerRequest, res: &mut HandlerResponse) {
        let Some(origin) = req.get_header(ORIGIN) else {
            return;
        };
        let Some(entity) = self.config.entity_for_route(req.route_id) else {
            return;
        };
        match self.config.resolve_for_origin(entity, &req.method, origin) {
            Some(options) => {
                debug!(
                    request_id = %req.request_id,
                    origin = %origin,
                    entity = %entity,
                    "CORS headers added"
                );
                decorate_response(res, origin, options);
            }
            None => {
                debug!(
                    request_id = %req.request_id,
                    origin = %origin,
                    entity = %entity,
                    "Origin not allowed; response left untouched"
                );
            }
        }
    }
}

impl Middleware for CorsMiddleware {
    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, _latency: Duration) {
        self.decorate(req, res);
    }
}

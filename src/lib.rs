//! # routecors
//!
//! **routecors** enforces Cross-Origin Resource Sharing policies on top of an
//! HTTP routing table. Policies are configured per route or per resource and
//! per origin; the crate answers preflight (OPTIONS) requests and decorates
//! the responses of actual requests following the W3C CORS processing model.
//!
//! ## Architecture
//!
//! - **[`router`]** - Ordered routing table; routes sharing a path pattern form a resource
//! - **[`dispatcher`]** - Handler registry and middleware chain
//! - **[`middleware`]** - Request hooks, including the [`middleware::cors`] engine
//! - **[`otel`]** - `tracing` subscriber setup
//! - **[`cli`]** - The `routecors` command-line tool
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Router
//!     participant Dispatcher
//!     participant Cors as CorsMiddleware
//!     participant Handler
//!
//!     Client->>Router: OPTIONS /items (Origin, Access-Control-Request-Method)
//!     Router-->>Dispatcher: synthetic preflight route
//!     Dispatcher->>Cors: handle_preflight(req)
//!     Cors-->>Client: 200 + Access-Control-Allow-* | 403 + reason
//!
//!     Client->>Router: GET /items (Origin)
//!     Router-->>Dispatcher: list_items route
//!     Dispatcher->>Handler: handler(req)
//!     Handler-->>Dispatcher: response
//!     Dispatcher->>Cors: after(req, response)
//!     Cors-->>Client: response + Access-Control-Allow-Origin
//! ```
//!
//! ## Quick Start
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
//! let list = router.add_route(Method::GET, "/items", "list_items");
//!
//! let defaults = OriginOptionsTable::new().with(
//!     "*",
//!     ResourceOptions::builder()
//!         .allow_credentials(true)
//!         .expose_all_headers()
//!         .build()
//!         .unwrap(),
//! );
//! let mut cors = CorsConfig::new(defaults);
//! cors.register_default(&mut router, list).unwrap();
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register("list_items", |_| HandlerResponse::json(200, serde_json::json!([])));
//! Arc::new(cors.build()).install(&mut dispatcher);
//!
//! let mut headers = HeaderVec::new();
//! headers.push(("Origin".into(), "http://client.example".to_string()));
//! let resp = dispatcher.handle(&router, Method::GET, "/items", headers);
//!
//! assert_eq!(resp.get_header("Access-Control-Allow-Origin"), Some("http://client.example"));
//! assert_eq!(resp.get_header("Access-Control-Allow-Credentials"), Some("true"));
//! ```
//!
//! ## Configuration Files
//!
//! The same setup can be described in YAML and loaded with
//! [`CorsFileConfig`](middleware::cors::CorsFileConfig); see
//! [`middleware::cors`] for the format and the `routecors` binary for a way to
//! try requests against it.

pub mod cli;
pub mod dispatcher;
pub mod ids;
pub mod middleware;
pub mod otel;
pub mod router;

pub use dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
pub use middleware::cors::{
    CorsConfig, CorsConfigError, CorsFileConfig, CorsMiddleware, OriginOptionsTable,
    PreflightRejection, ResourceOptions,
};
pub use router::{Router, RoutingEntity};

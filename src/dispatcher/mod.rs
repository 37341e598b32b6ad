//! # Dispatcher Module
//!
//! The dispatcher owns the handler registry and the middleware chain. Once the
//! router has matched a request, the dispatcher builds a [`HandlerRequest`],
//! runs middleware `before` hooks, invokes the handler, and runs `after` hooks
//! on the response.
//!
//! Handlers are plain synchronous functions:
//!
//! ```rust
//! use routecors::dispatcher::{Dispatcher, HandlerResponse, HeaderVec};
//! use routecors::router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/pets/{id}", "get_pet");
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register("get_pet", |req| {
//!     HandlerResponse::json(200, serde_json::json!({ "id": req.get_path_param("id") }))
//! });
//!
//! let resp = dispatcher.handle(&router, Method::GET, "/pets/7", HeaderVec::new());
//! assert_eq!(resp.status, 200);
//! assert_eq!(resp.body["id"], "7");
//! ```

mod core;

pub use self::core::{
    Dispatcher, Handler, HandlerRequest, HandlerResponse, HeaderVec, MAX_INLINE_HEADERS,
};

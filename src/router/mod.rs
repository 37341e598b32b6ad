//! # Router Module
//!
//! The router is the host routing substrate the CORS layer binds to. It keeps
//! an ordered routing table of `(method, path pattern, handler name)` entries,
//! groups routes sharing a path pattern into resources, and resolves incoming
//! requests with a linear scan over compiled path regexes.
//!
//! ## Example
//!
//! ```rust
//! use routecors::router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/pets/{id}", "get_pet");
//!
//! let matched = router.route(Method::GET, "/pets/42").unwrap();
//! assert_eq!(matched.handler_name, "get_pet");
//! assert_eq!(matched.get_path_param("id"), Some("42"));
//! ```

mod core;

pub use self::core::{
    ParamVec, ResourceId, RouteId, RouteMatch, RouteMeta, Router, RoutingEntity,
    MAX_INLINE_PARAMS,
};

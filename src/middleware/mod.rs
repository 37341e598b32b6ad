//! # Middleware Module
//!
//! Hooks run by the [`Dispatcher`](crate::dispatcher::Dispatcher) around
//! every handler invocation.
//!
//! - [`TracingMiddleware`]: one structured log event per request
//! - [`cors::CorsMiddleware`]: CORS response decoration; its preflight
//!   handler is installed alongside it

mod core;
pub mod cors;
mod tracing;

pub use self::core::Middleware;
pub use cors::CorsMiddleware;
pub use self::tracing::TracingMiddleware;

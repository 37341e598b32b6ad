use std::time::Duration;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Hook points the dispatcher runs around every handler invocation.
pub trait Middleware: Send + Sync {
    /// Return `Some` to answer the request without invoking the handler.
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }

    /// Runs just before the final response is returned to the client.
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}

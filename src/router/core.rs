//! Router core module - route table and path matching.
//!
//! Routes are kept in registration order and matched with a linear scan over
//! compiled path regexes. Every distinct path pattern owns one resource; all
//! routes sharing a pattern hang off the same resource.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]

use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names are `Arc<str>` because they come from the static route table;
/// values are per-request data from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Handle of a single method+path route in the [`Router`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub(crate) usize);

/// Handle of a resource (one path pattern, any number of methods).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) usize);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route#{}", self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource#{}", self.0)
    }
}

/// Anything CORS can be attached to: a whole resource or one of its routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingEntity {
    Route(RouteId),
    Resource(ResourceId),
}

impl From<RouteId> for RoutingEntity {
    fn from(id: RouteId) -> Self {
        RoutingEntity::Route(id)
    }
}

impl From<ResourceId> for RoutingEntity {
    fn from(id: ResourceId) -> Self {
        RoutingEntity::Resource(id)
    }
}

impl fmt::Display for RoutingEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingEntity::Route(id) => id.fmt(f),
            RoutingEntity::Resource(id) => id.fmt(f),
        }
    }
}

/// Static metadata of a registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMeta {
    /// HTTP method served by this route
    pub method: Method,
    /// Path pattern as registered (e.g. `/items/{id}`), without base path
    pub path_pattern: String,
    /// Name of the dispatcher handler for this route
    pub handler_name: String,
    /// Resource owning this route's path pattern
    pub resource: ResourceId,
    /// `true` for OPTIONS routes installed by the CORS layer
    pub preflight: bool,
}

/// Result of successfully matching a request to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Matched route handle
    pub route_id: RouteId,
    /// The matched route metadata
    pub route: Arc<RouteMeta>,
    /// Concrete request path that was matched
    pub path: String,
    /// Path parameters extracted from the URL (e.g. `{id}` -> `("id", "123")`)
    pub path_params: ParamVec,
    /// Name of the handler that should process this request
    pub handler_name: String,
}

impl RouteMatch {
    /// Get a path parameter by name (last occurrence wins).
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    regex: Regex,
    meta: Arc<RouteMeta>,
    param_names: Vec<Arc<str>>,
}

#[derive(Debug, Clone)]
struct Resource {
    path_pattern: String,
    routes: Vec<RouteId>,
}

/// Router to match HTTP requests to handlers.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<CompiledRoute>,
    resources: Vec<Resource>,
    /// Base path prefix for all routes (e.g., `/api/v1`)
    base_path: String,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router whose routes all live below `base_path`.
    #[must_use]
    pub fn with_base_path(base_path: &str) -> Self {
        Self {
            base_path: base_path.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Return the resource for `path`, creating it on first use.
    pub fn add_resource(&mut self, path: &str) -> ResourceId {
        if let Some(idx) = self.resources.iter().position(|r| r.path_pattern == path) {
            return ResourceId(idx);
        }
        self.resources.push(Resource {
            path_pattern: path.to_string(),
            routes: Vec::new(),
        });
        ResourceId(self.resources.len() - 1)
    }

    /// Register a route; its resource is created or reused by path pattern.
    pub fn add_route(&mut self, method: Method, path: &str, handler_name: &str) -> RouteId {
        let resource = self.add_resource(path);
        self.push_route(method, resource, handler_name, false)
    }

    /// Register an OPTIONS route for the CORS layer on an existing resource.
    pub(crate) fn add_preflight_route(&mut self, resource: ResourceId, handler_name: &str) -> RouteId {
        self.push_route(Method::OPTIONS, resource, handler_name, true)
    }

    fn push_route(
        &mut self,
        method: Method,
        resource: ResourceId,
        handler_name: &str,
        preflight: bool,
    ) -> RouteId {
        let path_pattern = self.resources[resource.0].path_pattern.clone();
        let full_path = format!("{}{}", self.base_path, path_pattern);
        let (regex, param_names) = Self::path_to_regex(&full_path);
        let id = RouteId(self.routes.len());

        info!(
            method = %method,
            path = %full_path,
            handler_name = %handler_name,
            route_id = %id,
            preflight,
            "Route registered"
        );

        self.routes.push(CompiledRoute {
            regex,
            meta: Arc::new(RouteMeta {
                method,
                path_pattern,
                handler_name: handler_name.to_string(),
                resource,
                preflight,
            }),
            param_names: param_names.into_iter().map(Arc::from).collect(),
        });
        self.resources[resource.0].routes.push(id);
        id
    }

    /// Print all registered routes to stdout.
    pub fn dump_routes(&self) {
        println!(
            "[routes] base_path={} count={}",
            self.base_path,
            self.routes.len()
        );
        for (id, meta) in self.routes() {
            println!(
                "[route] {id} {} {}{} -> {}{}",
                meta.method,
                self.base_path,
                meta.path_pattern,
                meta.handler_name,
                if meta.preflight { " (cors preflight)" } else { "" }
            );
        }
    }

    /// Match an HTTP request to a route.
    ///
    /// Routes are tested in registration order; the first route whose method
    /// and path regex both match wins.
    #[must_use]
    pub fn route(&self, method: Method, path: &str) -> Option<RouteMatch> {
        for (idx, compiled) in self.routes.iter().enumerate() {
            if compiled.meta.method != method {
                continue;
            }
            if let Some(captures) = compiled.regex.captures(path) {
                let mut params = ParamVec::new();
                for (i, name) in compiled.param_names.iter().enumerate() {
                    if let Some(val) = captures.get(i + 1) {
                        params.push((Arc::clone(name), val.as_str().to_string()));
                    }
                }
                debug!(
                    method = %method,
                    path = %path,
                    handler_name = %compiled.meta.handler_name,
                    route_pattern = %compiled.meta.path_pattern,
                    "Route matched"
                );
                return Some(RouteMatch {
                    route_id: RouteId(idx),
                    route: Arc::clone(&compiled.meta),
                    path: path.to_string(),
                    path_params: params,
                    handler_name: compiled.meta.handler_name.clone(),
                });
            }
        }

        debug!(method = %method, path = %path, "No route matched");
        None
    }

    /// Iterate over all routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (RouteId, &RouteMeta)> {
        self.routes
            .iter()
            .enumerate()
            .map(|(idx, compiled)| (RouteId(idx), compiled.meta.as_ref()))
    }

    #[must_use]
    pub fn route_meta(&self, id: RouteId) -> Option<&RouteMeta> {
        self.routes.get(id.0).map(|compiled| compiled.meta.as_ref())
    }

    /// Compiled matcher of a route, base path included.
    #[must_use]
    pub fn path_regex(&self, id: RouteId) -> Option<&Regex> {
        self.routes.get(id.0).map(|compiled| &compiled.regex)
    }

    #[must_use]
    pub fn resource_path(&self, id: ResourceId) -> Option<&str> {
        self.resources.get(id.0).map(|r| r.path_pattern.as_str())
    }

    /// Routes registered on a resource, in registration order.
    #[must_use]
    pub fn resource_routes(&self, id: ResourceId) -> &[RouteId] {
        self.resources
            .get(id.0)
            .map(|r| r.routes.as_slice())
            .unwrap_or_default()
    }

    /// Convert a path pattern to a regex and extract parameter names.
    ///
    /// `/users/{id}` becomes `^/users/([^/]+)$` with params `["id"]`. Literal
    /// segments are escaped, so the resulting pattern always compiles.
    #[allow(clippy::expect_used)]
    pub(crate) fn path_to_regex(path: &str) -> (Regex, Vec<String>) {
        if path == "/" || path.is_empty() {
            return (
                Regex::new(r"^/$").expect("static regex compiles"),
                Vec::new(),
            );
        }

        let mut pattern = String::with_capacity(path.len() + 5);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(path.matches('{').count());

        for segment in path.split('/') {
            if segment.starts_with('{') && segment.ends_with('}') && segment.len() > 2 {
                let param_name = segment
                    .trim_start_matches('{')
                    .trim_end_matches('}')
                    .to_string();
                pattern.push_str("/([^/]+)");
                param_names.push(param_name);
            } else if !segment.is_empty() {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }

        pattern.push('$');
        let regex = Regex::new(&pattern).expect("escaped path regex compiles");

        (regex, param_names)
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use regex::Regex;
use tracing::{error, info, warn};

use super::adapter::{RouterAdapter, PREFLIGHT_HANDLER_NAME};
use super::preflight::PreflightTarget;
use super::{ConfigChain, CorsConfigError, CorsMiddleware, CorsView, MethodOverrides};
use super::{OriginOptionsTable, ResourceOptions};
use crate::router::{ResourceId, RouteId, RoutingEntity};

/// CORS state of one registered routing entity.
struct Registration {
    table: Option<OriginOptionsTable>,
    resource: ResourceId,
    view: Option<Arc<dyn CorsView>>,
    methods: Vec<Method>,
    preflight_route: RouteId,
}

impl Registration {
    fn same_policy(&self, other: &Registration) -> bool {
        self.table == other.table
            && self.view.as_ref().map(|v| v.view_name()) == other.view.as_ref().map(|v| v.view_name())
    }
}

/// Entities sharing one synthetic preflight route.
#[derive(Debug)]
struct PreflightRegistration {
    /// Paths answered by the preflight route
    matcher: Regex,
    /// In registration order
    members: Vec<RoutingEntity>,
    /// Union of the members' native methods
    methods: Vec<Method>,
    /// First entity registered for each method
    owners: HashMap<Method, RoutingEntity>,
}

impl PreflightRegistration {
    fn new(matcher: Regex) -> Self {
        Self {
            matcher,
            members: Vec::new(),
            methods: Vec::new(),
            owners: HashMap::new(),
        }
    }
}

/// Setup-time CORS registry bound to a router.
///
/// Policies are layered per entity, most specific first: view method
/// override, view table, the entity's own table, resource defaults, global
/// defaults. The first layer mentioning an origin (exactly or through `"*"`)
/// answers for it entirely.
///
/// ```rust
/// use routecors::middleware::cors::{CorsConfig, OriginOptionsTable, ResourceOptions};
/// use routecors::router::Router;
/// use http::Method;
///
/// let mut router = Router::new();
/// let get = router.add_route(Method::GET, "/items", "list_items");
///
/// let mut cors = CorsConfig::new(OriginOptionsTable::new().with("*", ResourceOptions::default()));
/// cors.register_default(&mut router, get).unwrap();
///
/// assert!(cors.is_registered(get.into()));
/// assert!(cors
///     .resolve_for_origin(get.into(), &Method::GET, "http://any.example")
///     .is_some());
/// ```
pub struct CorsConfig {
    defaults: OriginOptionsTable,
    resource_defaults: HashMap<ResourceId, OriginOptionsTable>,
    registrations: HashMap<RoutingEntity, Registration>,
    /// Real route -> entity whose policy decorates its responses
    route_index: HashMap<RouteId, RoutingEntity>,
    preflights: HashMap<RouteId, PreflightRegistration>,
    /// Preflight routes in router order
    preflight_order: Vec<RouteId>,
    overrides: MethodOverrides,
}

impl CorsConfig {
    /// Create a configuration whose last-resort layer is `defaults`.
    #[must_use]
    pub fn new(defaults: OriginOptionsTable) -> Self {
        Self {
            defaults,
            resource_defaults: HashMap::new(),
            registrations: HashMap::new(),
            route_index: HashMap::new(),
            preflights: HashMap::new(),
            preflight_order: Vec::new(),
            overrides: MethodOverrides::new(),
        }
    }

    #[must_use]
    pub fn defaults(&self) -> &OriginOptionsTable {
        &self.defaults
    }

    /// Enable CORS on `entity` with its own origin table.
    ///
    /// Installs (or reuses) the synthetic OPTIONS route at the entity's path
    /// and returns the entity unchanged.
    ///
    /// # Errors
    ///
    /// - `UnknownEntity` if the router does not know `entity`
    /// - `DuplicateRegistration` if the entity is already registered
    /// - `UnsupportedMethod` if the entity serves OPTIONS itself
    /// - `ConflictingUserHandler` if the application owns OPTIONS at the path
    pub fn register<R, E>(
        &mut self,
        router: &mut R,
        entity: E,
        table: OriginOptionsTable,
    ) -> Result<RoutingEntity, CorsConfigError>
    where
        R: RouterAdapter,
        E: Into<RoutingEntity>,
    {
        self.insert(router, entity.into(), Some(table), None)
    }

    /// Enable CORS on `entity` using only resource and global defaults.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn register_default<R, E>(
        &mut self,
        router: &mut R,
        entity: E,
    ) -> Result<RoutingEntity, CorsConfigError>
    where
        R: RouterAdapter,
        E: Into<RoutingEntity>,
    {
        self.insert(router, entity.into(), None, None)
    }

    /// Enable CORS on a resource served by a class-style view.
    ///
    /// The view's own table and any per-method override take precedence over
    /// resource and global defaults.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn register_view<R>(
        &mut self,
        router: &mut R,
        resource: ResourceId,
        view: Arc<dyn CorsView>,
    ) -> Result<RoutingEntity, CorsConfigError>
    where
        R: RouterAdapter,
    {
        self.insert(router, resource.into(), None, Some(view))
    }

    /// Override the policy of one method of a view.
    pub fn override_view_method(&mut self, view_name: &str, method: Method, table: OriginOptionsTable) {
        if self
            .overrides
            .insert(view_name, method.clone(), table)
            .is_some()
        {
            warn!(view = %view_name, method = %method, "CORS method override replaced");
        }
    }

    /// Set the per-resource layer, consulted after the entity's own table.
    ///
    /// # Errors
    ///
    /// `DuplicateRegistration` if the resource already has defaults.
    pub fn set_resource_defaults(
        &mut self,
        resource: ResourceId,
        table: OriginOptionsTable,
    ) -> Result<(), CorsConfigError> {
        if self.resource_defaults.contains_key(&resource) {
            return Err(CorsConfigError::DuplicateRegistration {
                entity: resource.into(),
            });
        }
        info!(resource = %resource, origins = table.len(), "CORS resource defaults set");
        self.resource_defaults.insert(resource, table);
        Ok(())
    }

    #[must_use]
    pub fn is_registered(&self, entity: RoutingEntity) -> bool {
        self.registrations.contains_key(&entity)
    }

    /// Policy layers for a request with `method` on `entity`.
    #[must_use]
    pub fn chain_for(&self, entity: RoutingEntity, method: &Method) -> Option<ConfigChain<'_>> {
        self.registrations
            .get(&entity)
            .map(|registration| self.assemble_chain(registration, Some(method)))
    }

    /// Policy applying to `origin` for a request with `method` on `entity`.
    #[must_use]
    pub fn resolve_for_origin(
        &self,
        entity: RoutingEntity,
        method: &Method,
        origin: &str,
    ) -> Option<&ResourceOptions> {
        self.chain_for(entity, method)?.resolve(origin)
    }

    /// Registered entity whose policy covers responses of `route`.
    #[must_use]
    pub fn entity_for_route(&self, route: RouteId) -> Option<RoutingEntity> {
        self.route_index.get(&route).copied()
    }

    #[must_use]
    pub fn is_preflight_route(&self, route: RouteId) -> bool {
        self.preflights.contains_key(&route)
    }

    /// Policy context for a preflight on `path` asking for `method`.
    ///
    /// `preflight_route` is the OPTIONS route the request was dispatched to.
    /// Every other preflight route whose pattern also matches `path` is
    /// consulted too, in router order, and their method sets are merged. The
    /// first entity natively serving `method` answers; when none does, the
    /// first entity registered behind the first matching route answers so
    /// that origin checks still run before the method check.
    #[must_use]
    pub fn preflight_target(
        &self,
        preflight_route: RouteId,
        path: &str,
        method: &str,
    ) -> Option<PreflightTarget<'_>> {
        if !self.preflights.contains_key(&preflight_route) {
            return None;
        }
        let entries: Vec<&PreflightRegistration> = self
            .preflight_order
            .iter()
            .filter_map(|id| {
                let entry = self.preflights.get(id)?;
                (*id == preflight_route || entry.matcher.is_match(path)).then_some(entry)
            })
            .collect();

        let mut native_methods: Vec<Method> = Vec::new();
        for native in entries.iter().flat_map(|entry| entry.methods.iter()) {
            if !native_methods.contains(native) {
                native_methods.push(native.clone());
            }
        }

        let method = Method::from_bytes(method.as_bytes()).ok();
        let owner = match method.as_ref() {
            Some(method) => self.owner_across(&entries, method, path),
            None => None,
        }
        .or_else(|| entries.first().and_then(|entry| entry.members.first()))?;
        let registration = self.registrations.get(owner)?;

        Some(PreflightTarget {
            chain: self.assemble_chain(registration, method.as_ref()),
            native_methods,
        })
    }

    /// First owner of `method` among `entries`; later owners with a
    /// different policy are reported and ignored.
    fn owner_across<'a>(
        &self,
        entries: &[&'a PreflightRegistration],
        method: &Method,
        path: &str,
    ) -> Option<&'a RoutingEntity> {
        let mut owners = entries
            .iter()
            .copied()
            .filter_map(|entry| entry.owners.get(method));
        let first = owners.next()?;
        for other in owners {
            let conflicting = match (self.registrations.get(first), self.registrations.get(other)) {
                (Some(a), Some(b)) => !a.same_policy(b),
                _ => false,
            };
            if conflicting {
                error!(
                    method = %method,
                    path = %path,
                    first = %first,
                    ignored = %other,
                    "Path matches several CORS registrations with different configuration; using the first one"
                );
            }
        }
        Some(first)
    }

    /// Freeze the configuration for request handling.
    #[must_use]
    pub fn build(self) -> CorsMiddleware {
        info!(
            entities = self.registrations.len(),
            preflight_routes = self.preflights.len(),
            "CORS configuration frozen"
        );
        CorsMiddleware::new(self)
    }

    fn assemble_chain<'a>(&'a self, registration: &'a Registration, method: Option<&Method>) -> ConfigChain<'a> {
        let mut chain = ConfigChain::new();
        if let (Some(view), Some(method)) = (registration.view.as_ref(), method) {
            chain.push_opt(self.overrides.get(view.view_name(), method));
            chain.push_opt(view.cors_config(method));
        }
        chain.push_opt(registration.table.as_ref());
        chain.push_opt(self.resource_defaults.get(&registration.resource));
        chain.push(&self.defaults);
        chain
    }

    fn insert<R: RouterAdapter>(
        &mut self,
        router: &mut R,
        entity: RoutingEntity,
        table: Option<OriginOptionsTable>,
        view: Option<Arc<dyn CorsView>>,
    ) -> Result<RoutingEntity, CorsConfigError> {
        let methods = router.methods_of(entity)?;
        if self.registrations.contains_key(&entity) {
            return Err(CorsConfigError::DuplicateRegistration { entity });
        }
        if methods.contains(&Method::OPTIONS) {
            return Err(CorsConfigError::UnsupportedMethod { entity });
        }
        let resource = router.resource_of(entity)?;

        let no_origins = table.as_ref().map_or(true, OriginOptionsTable::is_empty)
            && view.is_none()
            && self
                .resource_defaults
                .get(&resource)
                .map_or(true, OriginOptionsTable::is_empty)
            && self.defaults.is_empty();
        if no_origins {
            warn!(
                entity = %entity,
                "No allowed origins configured; resource will not be shared with other origins"
            );
        }

        let preflight_route = router.register_preflight_handler(entity, PREFLIGHT_HANDLER_NAME)?;
        if !self.preflights.contains_key(&preflight_route) {
            let matcher = router.path_matcher(preflight_route)?;
            self.preflights
                .insert(preflight_route, PreflightRegistration::new(matcher));
            self.preflight_order.push(preflight_route);
            self.preflight_order.sort_unstable();
        }

        for route in router.routes_of(entity)? {
            match entity {
                RoutingEntity::Route(_) => {
                    self.route_index.insert(route, entity);
                }
                RoutingEntity::Resource(_) => {
                    self.route_index.entry(route).or_insert(entity);
                }
            }
        }

        info!(
            entity = %entity,
            methods = ?methods,
            preflight_route = %preflight_route,
            view = view.as_ref().map(|v| v.view_name()),
            "CORS enabled"
        );

        self.registrations.insert(
            entity,
            Registration {
                table,
                resource,
                view,
                methods,
                preflight_route,
            },
        );
        self.index_preflight(entity, preflight_route);
        Ok(entity)
    }

    fn index_preflight(&mut self, entity: RoutingEntity, preflight_route: RouteId) {
        let registrations = &self.registrations;
        let Some(registration) = registrations.get(&entity) else {
            return;
        };
        let Some(entry) = self.preflights.get_mut(&preflight_route) else {
            return;
        };
        entry.members.push(entity);

        for method in &registration.methods {
            if !entry.methods.contains(method) {
                entry.methods.push(method.clone());
            }
            match entry.owners.get(method) {
                Some(owner) => {
                    let conflicting = registrations
                        .get(owner)
                        .is_some_and(|first| !first.same_policy(registration));
                    if conflicting {
                        error!(
                            method = %method,
                            first = %owner,
                            ignored = %entity,
                            preflight_route = %registration.preflight_route,
                            "Path matches several CORS registrations with different configuration; using the first one"
                        );
                    }
                }
                None => {
                    entry.owners.insert(method.clone(), entity);
                }
            }
        }
    }
}

impl std::fmt::Debug for CorsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorsConfig")
            .field("defaults", &self.defaults)
            .field("entities", &self.registrations.len())
            .field("preflight_routes", &self.preflights.len())
            .finish()
    }
}

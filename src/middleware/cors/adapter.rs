use http::Method;
use regex::Regex;
use tracing::debug;

use super::CorsConfigError;
use crate::router::{ResourceId, RouteId, Router, RoutingEntity};

/// Handler name bound to every synthetic preflight route.
pub const PREFLIGHT_HANDLER_NAME: &str = "__routecors_preflight";

/// Minimal view of the host router the CORS layer needs at setup time.
pub trait RouterAdapter {
    /// HTTP methods natively handled by `entity`, without duplicates.
    ///
    /// Synthetic preflight routes are not counted for a resource, but a
    /// preflight route asked about directly reports `OPTIONS`.
    fn methods_of(&self, entity: RoutingEntity) -> Result<Vec<Method>, CorsConfigError>;

    /// Resource the entity lives on.
    fn resource_of(&self, entity: RoutingEntity) -> Result<ResourceId, CorsConfigError>;

    /// Real (non-preflight) routes the entity covers.
    fn routes_of(&self, entity: RoutingEntity) -> Result<Vec<RouteId>, CorsConfigError>;

    /// Matcher deciding which request paths `route` serves.
    fn path_matcher(&self, route: RouteId) -> Result<Regex, CorsConfigError>;

    /// Install an OPTIONS route at the entity's path bound to `handler_name`.
    ///
    /// Idempotent per path: an existing synthetic preflight route at the same
    /// path is returned instead of adding a second one.
    ///
    /// # Errors
    ///
    /// `ConflictingUserHandler` if the application already serves OPTIONS at
    /// that path itself.
    fn register_preflight_handler(
        &mut self,
        entity: RoutingEntity,
        handler_name: &str,
    ) -> Result<RouteId, CorsConfigError>;
}

impl RouterAdapter for Router {
    fn methods_of(&self, entity: RoutingEntity) -> Result<Vec<Method>, CorsConfigError> {
        match entity {
            RoutingEntity::Route(id) => self
                .route_meta(id)
                .map(|meta| vec![meta.method.clone()])
                .ok_or(CorsConfigError::UnknownEntity { entity }),
            RoutingEntity::Resource(_) => {
                let mut methods: Vec<Method> = Vec::new();
                for id in self.routes_of(entity)? {
                    if let Some(meta) = self.route_meta(id) {
                        if !methods.contains(&meta.method) {
                            methods.push(meta.method.clone());
                        }
                    }
                }
                Ok(methods)
            }
        }
    }

    fn resource_of(&self, entity: RoutingEntity) -> Result<ResourceId, CorsConfigError> {
        match entity {
            RoutingEntity::Route(id) => self.route_meta(id).map(|meta| meta.resource),
            RoutingEntity::Resource(id) => self.resource_path(id).map(|_| id),
        }
        .ok_or(CorsConfigError::UnknownEntity { entity })
    }

    fn routes_of(&self, entity: RoutingEntity) -> Result<Vec<RouteId>, CorsConfigError> {
        match entity {
            RoutingEntity::Route(id) => self
                .route_meta(id)
                .map(|_| vec![id])
                .ok_or(CorsConfigError::UnknownEntity { entity }),
            RoutingEntity::Resource(id) => {
                self.resource_path(id)
                    .ok_or(CorsConfigError::UnknownEntity { entity })?;
                Ok(self
                    .resource_routes(id)
                    .iter()
                    .copied()
                    .filter(|route| self.route_meta(*route).is_some_and(|meta| !meta.preflight))
                    .collect())
            }
        }
    }

    fn path_matcher(&self, route: RouteId) -> Result<Regex, CorsConfigError> {
        self.path_regex(route)
            .cloned()
            .ok_or(CorsConfigError::UnknownEntity {
                entity: route.into(),
            })
    }

    fn register_preflight_handler(
        &mut self,
        entity: RoutingEntity,
        handler_name: &str,
    ) -> Result<RouteId, CorsConfigError> {
        let resource = self.resource_of(entity)?;
        let path = self
            .resource_path(resource)
            .ok_or(CorsConfigError::UnknownEntity { entity })?
            .to_string();

        // Linear scan: the routing table is not indexed by method.
        let existing = self
            .routes()
            .find(|(_, meta)| meta.method == Method::OPTIONS && meta.path_pattern == path)
            .map(|(id, meta)| (id, meta.preflight));

        match existing {
            Some((id, true)) => {
                debug!(path = %path, route_id = %id, "Reusing CORS preflight route");
                Ok(id)
            }
            Some((_, false)) => Err(CorsConfigError::ConflictingUserHandler { path }),
            None => Ok(self.add_preflight_route(resource, handler_name)),
        }
    }
}

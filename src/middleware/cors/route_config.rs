//! File-based CORS configuration.
//!
//! A YAML (or JSON) document declares the routes to serve and their origin
//! policies:
//!
//! ```yaml
//! defaults:
//!   "*": { allow_credentials: true, allow_headers: "*", expose_headers: "*" }
//! resources:
//!   /items: { "http://a.example": { max_age: 60 } }
//! routes:
//!   - method: GET
//!     path: /items/{id}
//!     origins:
//!       "http://client1.example.org": { allow_methods: [GET, PUT] }
//!   - method: POST
//!     path: /login
//!     cors: false
//! ```
//!
//! Origin options are checked with the same rules as
//! [`ResourceOptions::from_json`]; unknown keys are rejected at every level.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{CorsConfig, CorsConfigError, OriginOptionsTable, ResourceOptions};
use crate::router::{RouteId, Router};

/// Origin -> raw options mapping as written in the file.
pub type RawOriginTable = BTreeMap<String, Value>;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsFileConfig {
    /// Global defaults, the last layer of every chain
    #[serde(default)]
    pub defaults: RawOriginTable,
    /// Per-resource defaults keyed by path pattern
    #[serde(default)]
    pub resources: BTreeMap<String, RawOriginTable>,
    /// Routes in registration order
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

/// One route of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteEntry {
    pub method: String,
    pub path: String,
    /// Handler name; derived from method and path when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    /// Route-specific origin table; omitted means defaults only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origins: Option<RawOriginTable>,
    /// Set to `false` to serve the route without CORS
    #[serde(default = "default_cors")]
    pub cors: bool,
}

fn default_cors() -> bool {
    true
}

impl RouteEntry {
    /// Handler name this route dispatches to.
    #[must_use]
    pub fn handler_name(&self) -> String {
        self.handler.clone().unwrap_or_else(|| {
            let mut name = self.method.to_ascii_lowercase();
            for segment in self.path.split('/').filter(|s| !s.is_empty()) {
                name.push('_');
                name.extend(
                    segment
                        .chars()
                        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                        .map(|c| c.to_ascii_lowercase()),
                );
            }
            name
        })
    }
}

impl CorsFileConfig {
    /// Load a configuration file; `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read CORS config {}", path.display()))?;

        let config = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str::<Self>(&content)
                .with_context(|| format!("Invalid CORS config {}", path.display()))?
        } else {
            Self::from_yaml_str(&content)
                .with_context(|| format!("Invalid CORS config {}", path.display()))?
        };
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Validate one raw origin table.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` naming the offending origin.
    pub fn parse_table(raw: &RawOriginTable) -> Result<OriginOptionsTable, CorsConfigError> {
        raw.iter()
            .map(|(origin, value)| {
                ResourceOptions::from_json(value)
                    .map(|options| (origin.clone(), options))
                    .map_err(|err| match err {
                        CorsConfigError::InvalidConfiguration(msg) => {
                            CorsConfigError::invalid(format!("origin '{origin}': {msg}"))
                        }
                        other => other,
                    })
            })
            .collect()
    }

    /// Build the router and CORS configuration the file describes.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for malformed methods or options, plus every
    /// registration error of [`CorsConfig::register`].
    pub fn build(&self) -> Result<(Router, CorsConfig), CorsConfigError> {
        let mut router = Router::new();

        let mut routes: Vec<(RouteId, &RouteEntry)> = Vec::with_capacity(self.routes.len());
        for entry in &self.routes {
            let method = Method::from_bytes(entry.method.to_ascii_uppercase().as_bytes())
                .map_err(|_| {
                    CorsConfigError::invalid(format!("Invalid HTTP method '{}'", entry.method))
                })?;
            if !entry.path.starts_with('/') {
                return Err(CorsConfigError::invalid(format!(
                    "Route path must start with '/', got '{}'",
                    entry.path
                )));
            }
            let id = router.add_route(method, &entry.path, &entry.handler_name());
            routes.push((id, entry));
        }

        let mut cors = CorsConfig::new(Self::parse_table(&self.defaults)?);

        for (path, raw) in &self.resources {
            let resource = router.add_resource(path);
            cors.set_resource_defaults(resource, Self::parse_table(raw)?)?;
        }

        for (id, entry) in routes {
            if !entry.cors {
                continue;
            }
            match &entry.origins {
                Some(raw) => cors.register(&mut router, id, Self::parse_table(raw)?)?,
                None => cors.register_default(&mut router, id)?,
            };
        }

        info!(
            routes = self.routes.len(),
            resources = self.resources.len(),
            "CORS configuration file applied"
        );
        Ok((router, cors))
    }
}

use thiserror::Error;

use crate::router::RoutingEntity;

/// CORS configuration error
///
/// Raised while the CORS configuration is being built, before the server
/// starts serving. None of these are ever returned to an HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorsConfigError {
    /// A policy record or a configuration table has the wrong shape
    #[error("CORS configuration error: {0}")]
    InvalidConfiguration(String),
    /// The routing entity already has CORS configured
    #[error("CORS configuration error: {entity} is already configured for CORS")]
    DuplicateRegistration {
        /// Entity registered twice
        entity: RoutingEntity,
    },
    /// The application registered its own OPTIONS handler at the path
    #[error("CORS configuration error: {path} already has OPTIONS handler")]
    ConflictingUserHandler {
        /// Path pattern of the conflicting route
        path: String,
    },
    /// The entity natively handles OPTIONS, so no preflight handler can be layered on it
    #[error("CORS configuration error: CORS can't be enabled on {entity}, it handles OPTIONS requests")]
    UnsupportedMethod {
        /// Entity serving OPTIONS
        entity: RoutingEntity,
    },
    /// The entity is not known to the router
    #[error("CORS configuration error: {entity} is not registered in the router")]
    UnknownEntity {
        /// Missing entity
        entity: RoutingEntity,
    },
}

impl CorsConfigError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        CorsConfigError::InvalidConfiguration(message.into())
    }
}

/// Why a preflight request was refused.
///
/// Rendered as the plain-text body of the 403 response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreflightRejection {
    #[error("CORS preflight request failed: origin header is not specified in the request")]
    MissingOrigin,
    #[error("CORS preflight request failed: 'Access-Control-Request-Method' header is not specified")]
    MissingRequestMethod,
    #[error("CORS preflight request failed: no origins are allowed")]
    NoOriginsAllowed,
    #[error("CORS preflight request failed: origin '{origin}' is not allowed")]
    OriginNotAllowed { origin: String },
    #[error("CORS preflight request failed: request method '{method}' is not allowed for '{origin}' origin")]
    MethodNotAllowed { method: String, origin: String },
    #[error("CORS preflight request failed: headers are not allowed: {}", .headers.join(", "))]
    HeadersNotAllowed { headers: Vec<String> },
}

impl PreflightRejection {
    /// Status code of the response carrying this rejection.
    #[must_use]
    pub fn status(&self) -> u16 {
        403
    }
}

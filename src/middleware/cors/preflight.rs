//! Preflight (OPTIONS) request evaluation.
//!
//! The checks run in a fixed order and stop at the first failure, so a request
//! that fails several checks always reports the earliest one.

use std::collections::HashSet;

use http::Method;
use serde_json::Value;

use super::headers::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS,
    ACCESS_CONTROL_REQUEST_METHOD, ORIGIN,
};
use super::options::AllOrSome;
use super::{ConfigChain, PreflightRejection};
use crate::dispatcher::{HandlerRequest, HandlerResponse, HeaderVec};

/// Policy context for one preflight request, resolved once the requested
/// method is known.
#[derive(Debug, Clone)]
pub struct PreflightTarget<'a> {
    /// Policy layers of the entity answering for the requested method
    pub chain: ConfigChain<'a>,
    /// Union of the methods served behind every preflight route matching the path
    pub native_methods: Vec<Method>,
}

/// A client request header, as sent and in comparison form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedHeader {
    pub original: String,
    pub normalized: String,
}

/// Outcome of an accepted preflight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightGrant {
    pub origin: String,
    pub allow_credentials: bool,
    pub max_age: Option<u32>,
    pub method: String,
    pub headers: Vec<RequestedHeader>,
}

impl PreflightGrant {
    /// 200 response with an empty body.
    #[must_use]
    pub fn into_response(self) -> HandlerResponse {
        let mut headers = HeaderVec::new();
        let mut push = |name: &str, value: String| headers.push((name.into(), value));

        push(ACCESS_CONTROL_ALLOW_ORIGIN, self.origin);
        if self.allow_credentials {
            push(ACCESS_CONTROL_ALLOW_CREDENTIALS, "true".to_string());
        }
        if let Some(age) = self.max_age {
            push(ACCESS_CONTROL_MAX_AGE, age.to_string());
        }
        push(ACCESS_CONTROL_ALLOW_METHODS, self.method);
        if !self.headers.is_empty() {
            let joined = self
                .headers
                .iter()
                .map(|h| h.original.as_str())
                .collect::<Vec<_>>()
                .join(",");
            push(ACCESS_CONTROL_ALLOW_HEADERS, joined);
        }

        HandlerResponse::new(200, headers, Value::Null)
    }
}

impl PreflightRejection {
    /// 403 response whose plain-text body is the rejection reason.
    #[must_use]
    pub fn into_response(self) -> HandlerResponse {
        HandlerResponse::text(self.status(), &self.to_string())
    }
}

/// Split an `Access-Control-Request-Headers` value.
///
/// Tokens are trimmed of spaces and tabs, empty tokens are dropped and
/// duplicates (compared case-insensitively) keep their first spelling.
#[must_use]
pub fn parse_request_headers(value: Option<&str>) -> Vec<RequestedHeader> {
    let Some(value) = value else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    value
        .split(',')
        .map(|token| token.trim_matches(|c| c == ' ' || c == '\t'))
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let normalized = token.to_ascii_uppercase();
            seen.insert(normalized.clone()).then(|| RequestedHeader {
                original: token.to_string(),
                normalized,
            })
        })
        .collect()
}

/// Run the preflight checks for `req`.
///
/// `target` is called after the origin and requested-method headers have been
/// read, with the requested method upper-cased. It returns `None` when CORS
/// has nothing configured behind this preflight route.
///
/// # Errors
///
/// The first failed check, as a [`PreflightRejection`].
pub fn evaluate<'a, F>(req: &HandlerRequest, target: F) -> Result<PreflightGrant, PreflightRejection>
where
    F: FnOnce(&str) -> Option<PreflightTarget<'a>>,
{
    let origin = req
        .get_header(ORIGIN)
        .ok_or(PreflightRejection::MissingOrigin)?;

    let request_method = req
        .get_header(ACCESS_CONTROL_REQUEST_METHOD)
        .ok_or(PreflightRejection::MissingRequestMethod)?;
    let method = request_method.to_ascii_uppercase();

    let target = match target(&method) {
        Some(target) if !target.chain.is_empty() => target,
        _ => return Err(PreflightRejection::NoOriginsAllowed),
    };

    let options = target
        .chain
        .resolve(origin)
        .ok_or_else(|| PreflightRejection::OriginNotAllowed {
            origin: origin.to_string(),
        })?;

    let method_allowed = match options.allow_methods() {
        Some(allowed) => allowed.contains(&method),
        None => target.native_methods.iter().any(|m| m.as_str() == method),
    };
    if !method_allowed {
        return Err(PreflightRejection::MethodNotAllowed {
            method,
            origin: origin.to_string(),
        });
    }

    let headers = parse_request_headers(req.get_header(ACCESS_CONTROL_REQUEST_HEADERS));

    if let AllOrSome::Some(allowed) = options.allow_headers() {
        let disallowed: Vec<String> = headers
            .iter()
            .filter(|h| !allowed.contains(&h.normalized))
            .map(|h| h.normalized.clone())
            .collect();
        if !disallowed.is_empty() {
            return Err(PreflightRejection::HeadersNotAllowed {
                headers: disallowed,
            });
        }
    }

    Ok(PreflightGrant {
        origin: origin.to_string(),
        allow_credentials: options.allow_credentials(),
        max_age: options.max_age(),
        method: request_method.to_string(),
        headers,
    })
}

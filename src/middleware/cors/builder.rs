use std::collections::BTreeSet;

use super::options::{AllOrSome, ResourceOptions};
use super::CorsConfigError;

/// Builder for creating [`ResourceOptions`] with a fluent API
///
/// # Example
///
/// ```rust
/// use routecors::middleware::cors::ResourceOptions;
///
/// let opts = ResourceOptions::builder()
///     .allow_credentials(true)
///     .allow_headers(["Content-Type", "X-Custom-Header"])
///     .expose_headers(["X-Total-Count"])
///     .max_age(3600)
///     .build()
///     .expect("valid CORS options");
/// assert!(opts.allow_headers().contains("X-CUSTOM-HEADER"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResourceOptionsBuilder {
    allow_credentials: bool,
    expose_headers: AllOrSome<Vec<String>>,
    allow_headers: AllOrSome<Vec<String>>,
    allow_methods: Option<AllOrSome<Vec<String>>>,
    max_age: Option<u32>,
}

impl ResourceOptionsBuilder {
    /// Create a builder with restrictive defaults
    ///
    /// - Credentials: `false`
    /// - Exposed headers: none
    /// - Allowed headers: none
    /// - Allowed methods: whatever the route natively serves
    /// - Max age: `None` (no preflight caching)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable `Access-Control-Allow-Credentials: true`
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Set headers readable by the client
    #[must_use]
    pub fn expose_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expose_headers = AllOrSome::Some(headers.into_iter().map(Into::into).collect());
        self
    }

    /// Expose every non-simple header the response carries
    #[must_use]
    pub fn expose_all_headers(mut self) -> Self {
        self.expose_headers = AllOrSome::All;
        self
    }

    /// Set request headers the client may send (compared case-insensitively)
    #[must_use]
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_headers = AllOrSome::Some(headers.into_iter().map(Into::into).collect());
        self
    }

    /// Allow any request header
    #[must_use]
    pub fn allow_all_headers(mut self) -> Self {
        self.allow_headers = AllOrSome::All;
        self
    }

    /// Restrict the methods a preflight may ask for
    #[must_use]
    pub fn allow_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_methods = Some(AllOrSome::Some(methods.into_iter().map(Into::into).collect()));
        self
    }

    /// Allow a preflight to ask for any method
    #[must_use]
    pub fn allow_all_methods(mut self) -> Self {
        self.allow_methods = Some(AllOrSome::All);
        self
    }

    /// Set preflight cache duration in seconds
    #[must_use]
    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Validate and normalize the options
    ///
    /// # Errors
    ///
    /// Returns `CorsConfigError::InvalidConfiguration` if a header or method
    /// name is not a valid HTTP token.
    pub fn build(self) -> Result<ResourceOptions, CorsConfigError> {
        Ok(ResourceOptions {
            allow_credentials: self.allow_credentials,
            expose_headers: normalize("expose_headers", self.expose_headers, false)?,
            allow_headers: normalize("allow_headers", self.allow_headers, true)?,
            allow_methods: self
                .allow_methods
                .map(|methods| normalize("allow_methods", methods, true))
                .transpose()?,
            max_age: self.max_age,
        })
    }
}

fn normalize(
    field: &str,
    items: AllOrSome<Vec<String>>,
    uppercase: bool,
) -> Result<AllOrSome<BTreeSet<String>>, CorsConfigError> {
    let items = match items {
        AllOrSome::All => return Ok(AllOrSome::All),
        AllOrSome::Some(items) => items,
    };

    let mut normalized = BTreeSet::new();
    for item in items {
        if !is_token(&item) {
            return Err(CorsConfigError::invalid(format!(
                "'{}' contains invalid name '{}'",
                field, item
            )));
        }
        normalized.insert(if uppercase {
            item.to_ascii_uppercase()
        } else {
            item
        });
    }
    Ok(AllOrSome::Some(normalized))
}

/// RFC 7230 `token`: one or more `tchar`.
pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}

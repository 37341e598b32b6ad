use std::collections::BTreeSet;
use std::fmt;

use serde_json::{Map, Value};

use super::builder::ResourceOptionsBuilder;
use super::CorsConfigError;

/// Either the `"*"` sentinel or an explicit set.
///
/// An explicit set that happens to contain the literal string `"*"` is still
/// an explicit set; only `All` is a wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllOrSome<T> {
    All,
    Some(T),
}

impl<T> AllOrSome<T> {
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, AllOrSome::All)
    }
}

impl AllOrSome<BTreeSet<String>> {
    /// Membership test; `All` contains everything.
    #[must_use]
    pub fn contains(&self, item: &str) -> bool {
        match self {
            AllOrSome::All => true,
            AllOrSome::Some(set) => set.contains(item),
        }
    }
}

impl<T: Default> Default for AllOrSome<T> {
    fn default() -> Self {
        AllOrSome::Some(T::default())
    }
}

/// Immutable, validated CORS policy for one origin.
///
/// Header and method names are normalized at construction: allowed headers and
/// allowed methods are upper-cased for comparison, exposed headers keep their
/// spelling since they are sent back verbatim. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceOptions {
    pub(crate) allow_credentials: bool,
    pub(crate) expose_headers: AllOrSome<BTreeSet<String>>,
    pub(crate) allow_headers: AllOrSome<BTreeSet<String>>,
    pub(crate) allow_methods: Option<AllOrSome<BTreeSet<String>>>,
    pub(crate) max_age: Option<u32>,
}

const OPTION_KEYS: [&str; 5] = [
    "allow_credentials",
    "expose_headers",
    "allow_headers",
    "allow_methods",
    "max_age",
];

impl ResourceOptions {
    /// Start building a policy; all fields default to the most restrictive value.
    #[must_use]
    pub fn builder() -> ResourceOptionsBuilder {
        ResourceOptionsBuilder::new()
    }

    /// Whether `Access-Control-Allow-Credentials: true` is sent.
    #[must_use]
    pub fn allow_credentials(&self) -> bool {
        self.allow_credentials
    }

    /// Server headers the client may read.
    #[must_use]
    pub fn expose_headers(&self) -> &AllOrSome<BTreeSet<String>> {
        &self.expose_headers
    }

    /// Client request headers permitted, upper-cased.
    #[must_use]
    pub fn allow_headers(&self) -> &AllOrSome<BTreeSet<String>> {
        &self.allow_headers
    }

    /// Methods permitted for this origin, upper-cased. `None` defers to the
    /// methods the route natively serves.
    #[must_use]
    pub fn allow_methods(&self) -> Option<&AllOrSome<BTreeSet<String>>> {
        self.allow_methods.as_ref()
    }

    /// Preflight cache duration in seconds.
    #[must_use]
    pub fn max_age(&self) -> Option<u32> {
        self.max_age
    }

    /// Parse options from a loosely-typed mapping, e.g. one origin's entry of
    /// a YAML configuration file.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` on unknown keys or on a field of the wrong shape.
    pub fn from_json(value: &Value) -> Result<Self, CorsConfigError> {
        let map = value.as_object().ok_or_else(|| {
            CorsConfigError::invalid(format!(
                "Origin options must be a mapping, got '{}'",
                value
            ))
        })?;
        Self::from_map(map)
    }

    fn from_map(map: &Map<String, Value>) -> Result<Self, CorsConfigError> {
        let mut unexpected: Vec<&str> = map
            .keys()
            .map(String::as_str)
            .filter(|k| !OPTION_KEYS.contains(k))
            .collect();
        if !unexpected.is_empty() {
            unexpected.sort_unstable();
            return Err(CorsConfigError::invalid(format!(
                "Unexpected keywords in resource options: {}",
                unexpected.join(",")
            )));
        }

        let mut builder = ResourceOptionsBuilder::new();

        if let Some(v) = map.get("allow_credentials") {
            let flag = v.as_bool().ok_or_else(|| {
                CorsConfigError::invalid(format!(
                    "'allow_credentials' must be boolean, got '{}'",
                    v
                ))
            })?;
            builder = builder.allow_credentials(flag);
        }

        if let Some(v) = map.get("expose_headers") {
            builder = match parse_star_or_list("expose_headers", v)? {
                AllOrSome::All => builder.expose_all_headers(),
                AllOrSome::Some(list) => builder.expose_headers(list),
            };
        }

        if let Some(v) = map.get("allow_headers") {
            builder = match parse_star_or_list("allow_headers", v)? {
                AllOrSome::All => builder.allow_all_headers(),
                AllOrSome::Some(list) => builder.allow_headers(list),
            };
        }

        if let Some(v) = map.get("allow_methods") {
            if !v.is_null() {
                builder = match parse_star_or_list("allow_methods", v)? {
                    AllOrSome::All => builder.allow_all_methods(),
                    AllOrSome::Some(list) => builder.allow_methods(list),
                };
            }
        }

        if let Some(v) = map.get("max_age") {
            if !v.is_null() {
                let age = v
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| {
                        CorsConfigError::invalid(format!(
                            "'max_age' must be non-negative integer, got '{}'",
                            v
                        ))
                    })?;
                builder = builder.max_age(age);
            }
        }

        builder.build()
    }
}

/// `"*"` or a sequence of strings; any other bare string is rejected.
fn parse_star_or_list(field: &str, value: &Value) -> Result<AllOrSome<Vec<String>>, CorsConfigError> {
    let shape_error = || {
        CorsConfigError::invalid(format!(
            "'{}' must be either '*', or sequence of strings, got '{}'",
            field, value
        ))
    };

    match value {
        Value::String(s) if s == "*" => Ok(AllOrSome::All),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(shape_error))
            .collect::<Result<Vec<_>, _>>()
            .map(AllOrSome::Some),
        _ => Err(shape_error()),
    }
}

impl fmt::Display for ResourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn render(set: &AllOrSome<BTreeSet<String>>) -> String {
            match set {
                AllOrSome::All => "*".to_string(),
                AllOrSome::Some(items) => items.iter().cloned().collect::<Vec<_>>().join(","),
            }
        }
        write!(
            f,
            "credentials={} expose=[{}] headers=[{}] methods=[{}] max_age={}",
            self.allow_credentials,
            render(&self.expose_headers),
            render(&self.allow_headers),
            self.allow_methods
                .as_ref()
                .map(render)
                .unwrap_or_else(|| "<route>".to_string()),
            self.max_age
                .map(|age| age.to_string())
                .unwrap_or_else(|| "-".to_string()),
        )
    }
}

use std::collections::HashMap;

use http::Method;

use super::OriginOptionsTable;

/// Capability of a class-style handler that serves several methods on one
/// resource and carries its own CORS policy.
///
/// Views are registered with [`CorsConfig::register_view`](super::CorsConfig::register_view).
/// Their policy chain is built per request method: method override, then the
/// view's own table, then resource defaults, then global defaults.
pub trait CorsView: Send + Sync {
    /// Stable name used as the key of the method override table.
    fn view_name(&self) -> &str;

    /// View-level policy for `method`. `None` falls through to the
    /// resource and global defaults.
    fn cors_config(&self, _method: &Method) -> Option<&OriginOptionsTable> {
        None
    }
}

/// Per-method policy overrides for views, keyed by `(view name, method)`.
#[derive(Debug, Clone, Default)]
pub struct MethodOverrides {
    entries: HashMap<String, HashMap<Method, OriginOptionsTable>>,
}

impl MethodOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the override for one method of a view. Returns the replaced table.
    pub fn insert(
        &mut self,
        view_name: &str,
        method: Method,
        table: OriginOptionsTable,
    ) -> Option<OriginOptionsTable> {
        self.entries
            .entry(view_name.to_string())
            .or_default()
            .insert(method, table)
    }

    #[must_use]
    pub fn get(&self, view_name: &str, method: &Method) -> Option<&OriginOptionsTable> {
        self.entries.get(view_name)?.get(method)
    }
}

use std::collections::HashMap;

use smallvec::SmallVec;

use super::ResourceOptions;

/// Origin key matching any origin not listed explicitly in the same table.
pub const ANY_ORIGIN: &str = "*";

/// Mapping from origin to the policy applied to requests from that origin.
///
/// Origins are opaque strings compared exactly (scheme, host and port as one
/// value). They are not checked for URL well-formedness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginOptionsTable {
    entries: HashMap<String, ResourceOptions>,
}

impl OriginOptionsTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, origin: &str, options: ResourceOptions) -> Self {
        self.insert(origin, options);
        self
    }

    /// Insert or replace the policy for `origin`.
    pub fn insert(&mut self, origin: &str, options: ResourceOptions) {
        self.entries.insert(origin.to_string(), options);
    }

    /// Exact entry for `origin`, else this table's `"*"` entry.
    #[must_use]
    pub fn lookup(&self, origin: &str) -> Option<&ResourceOptions> {
        self.entries
            .get(origin)
            .or_else(|| self.entries.get(ANY_ORIGIN))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<S: Into<String>> FromIterator<(S, ResourceOptions)> for OriginOptionsTable {
    fn from_iter<I: IntoIterator<Item = (S, ResourceOptions)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Ordered layers of origin tables, most specific first.
///
/// Resolution is table-level: the first layer holding either the exact
/// origin or `"*"` answers for that origin entirely. Fields are never merged
/// across layers.
#[derive(Debug, Clone, Default)]
pub struct ConfigChain<'a> {
    layers: SmallVec<[&'a OriginOptionsTable; 4]>,
}

impl<'a> ConfigChain<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a less specific layer.
    pub fn push(&mut self, table: &'a OriginOptionsTable) {
        self.layers.push(table);
    }

    pub fn push_opt(&mut self, table: Option<&'a OriginOptionsTable>) {
        if let Some(table) = table {
            self.push(table);
        }
    }

    /// Policy for `origin`, or `None` if no layer mentions it.
    #[must_use]
    pub fn resolve(&self, origin: &str) -> Option<&'a ResourceOptions> {
        self.layers.iter().find_map(|table| table.lookup(origin))
    }

    /// `true` when no layer allows any origin at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|table| table.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(max_age: u32) -> ResourceOptions {
        ResourceOptions::builder().max_age(max_age).build().unwrap()
    }

    #[test]
    fn test_table_exact_before_wildcard() {
        let table = OriginOptionsTable::new()
            .with("*", opts(1))
            .with("http://a.example", opts(2));
        assert_eq!(table.lookup("http://a.example").unwrap().max_age(), Some(2));
        assert_eq!(table.lookup("http://b.example").unwrap().max_age(), Some(1));
    }

    #[test]
    fn test_origins_are_case_sensitive() {
        let table = OriginOptionsTable::new().with("http://a.example", opts(2));
        assert!(table.lookup("http://A.example").is_none());
    }

    #[test]
    fn test_chain_precedence() {
        let defaults = OriginOptionsTable::new().with("*", opts(1));
        let route = OriginOptionsTable::new().with("http://c1.example.org", opts(2));

        let mut chain = ConfigChain::new();
        chain.push(&route);
        chain.push(&defaults);

        assert_eq!(chain.resolve("http://c1.example.org").unwrap().max_age(), Some(2));
        assert_eq!(chain.resolve("http://other.example").unwrap().max_age(), Some(1));
    }

    #[test]
    fn test_higher_layer_wildcard_shadows_lower_exact_entry() {
        let defaults = OriginOptionsTable::new().with("http://a.example", opts(1));
        let route = OriginOptionsTable::new().with("*", opts(2));

        let mut chain = ConfigChain::new();
        chain.push(&route);
        chain.push(&defaults);

        assert_eq!(chain.resolve("http://a.example").unwrap().max_age(), Some(2));
    }

    #[test]
    fn test_no_field_merge_across_layers() {
        let defaults = OriginOptionsTable::new().with(
            "http://a.example",
            ResourceOptions::builder()
                .allow_credentials(true)
                .max_age(10)
                .build()
                .unwrap(),
        );
        let route = OriginOptionsTable::new().with("http://a.example", ResourceOptions::default());

        let mut chain = ConfigChain::new();
        chain.push(&route);
        chain.push(&defaults);

        let resolved = chain.resolve("http://a.example").unwrap();
        assert!(!resolved.allow_credentials());
        assert!(resolved.max_age().is_none());
    }

    #[test]
    fn test_empty_chain() {
        let empty = OriginOptionsTable::new();
        let mut chain = ConfigChain::new();
        assert!(chain.is_empty());
        chain.push(&empty);
        assert!(chain.is_empty());
        assert!(chain.resolve("http://a.example").is_none());
    }
}

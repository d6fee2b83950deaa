//! Route table model.
//!
//! # Responsibilities
//! - Hold the default route group and the versioned route groups
//! - Convert the declarative JSON source into the runtime table
//!
//! # Design Decisions
//! - Declaration order is kept exactly; groups are never re-sorted
//! - Version labels are compared case-insensitively (stored lowercased)
//! - No mutation API: the table is built once and shared via `Arc`

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One forwarding rule: a path prefix and the base URI it forwards to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    path_prefix: String,
    target_base_uri: String,
}

impl RouteEntry {
    pub fn new(path_prefix: impl Into<String>, target_base_uri: impl Into<String>) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            target_base_uri: target_base_uri.into(),
        }
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    pub fn target_base_uri(&self) -> &str {
        &self.target_base_uri
    }
}

/// Ordered list of route entries, scanned first-match-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteGroup {
    entries: Vec<RouteEntry>,
}

impl RouteGroup {
    pub fn new(entries: Vec<RouteEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Immutable routing state for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    default_group: RouteGroup,
    versioned_groups: HashMap<String, RouteGroup>,
}

impl RouteTable {
    /// A table with no routes; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from a default group and labelled groups.
    ///
    /// Labels are case-insensitive. When a label is declared twice the
    /// first declaration wins.
    pub fn new<I>(default_group: RouteGroup, versioned: I) -> Self
    where
        I: IntoIterator<Item = (String, RouteGroup)>,
    {
        let mut versioned_groups = HashMap::new();
        for (label, group) in versioned {
            versioned_groups
                .entry(label.to_lowercase())
                .or_insert(group);
        }
        Self {
            default_group,
            versioned_groups,
        }
    }

    pub fn default_group(&self) -> &RouteGroup {
        &self.default_group
    }

    /// Look up a versioned group by label, ignoring case.
    pub fn versioned_group(&self, label: &str) -> Option<&RouteGroup> {
        self.versioned_groups.get(&label.to_lowercase())
    }

    pub fn version_count(&self) -> usize {
        self.versioned_groups.len()
    }

    /// Iterate over every entry in every group.
    pub fn all_entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.default_group
            .entries()
            .iter()
            .chain(self.versioned_groups.values().flat_map(|g| g.entries().iter()))
    }

    pub fn is_empty(&self) -> bool {
        self.default_group.is_empty() && self.versioned_groups.values().all(RouteGroup::is_empty)
    }
}

/// Declarative route table source, as read from `routes.json`.
///
/// Property names are accepted in camelCase and PascalCase.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableSource {
    #[serde(default, alias = "DefaultRoutes")]
    pub default_routes: Vec<RouteSource>,

    #[serde(default, alias = "Versions")]
    pub versions: Vec<VersionSource>,
}

/// One route as declared in the source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSource {
    #[serde(alias = "Path")]
    pub path: String,

    #[serde(alias = "ApiUri")]
    pub api_uri: String,
}

/// A labelled route group as declared in the source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSource {
    #[serde(alias = "Version")]
    pub version: String,

    #[serde(default, alias = "Routes")]
    pub routes: Vec<RouteSource>,
}

fn group_from(routes: Vec<RouteSource>) -> RouteGroup {
    RouteGroup::new(
        routes
            .into_iter()
            .map(|r| RouteEntry::new(r.path, r.api_uri))
            .collect(),
    )
}

impl From<RouteTableSource> for RouteTable {
    fn from(source: RouteTableSource) -> Self {
        let default_group = group_from(source.default_routes);
        let versioned = source
            .versions
            .into_iter()
            .map(|v| (v.version, group_from(v.routes)));
        RouteTable::new(default_group, versioned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_conversion_keeps_order() {
        let source: RouteTableSource = serde_json::from_str(
            r#"{
                "defaultRoutes": [
                    {"path": "/a", "apiUri": "http://x"},
                    {"path": "/ab", "apiUri": "http://y"}
                ],
                "versions": [
                    {"version": "V2", "routes": [{"path": "/users", "apiUri": "http://svc-b"}]}
                ]
            }"#,
        )
        .unwrap();

        let table = RouteTable::from(source);
        let prefixes: Vec<_> = table
            .default_group()
            .entries()
            .iter()
            .map(RouteEntry::path_prefix)
            .collect();
        assert_eq!(prefixes, vec!["/a", "/ab"]);
        assert!(table.versioned_group("v2").is_some());
        assert!(table.versioned_group("V2").is_some());
        assert!(table.versioned_group("v3").is_none());
    }

    #[test]
    fn test_pascal_case_source() {
        let source: RouteTableSource = serde_json::from_str(
            r#"{"DefaultRoutes": [{"Path": "/users", "ApiUri": "http://svc-a"}]}"#,
        )
        .unwrap();
        let table = RouteTable::from(source);
        assert_eq!(table.default_group().len(), 1);
        assert_eq!(table.version_count(), 0);
    }

    #[test]
    fn test_duplicate_label_first_wins() {
        let first = RouteGroup::new(vec![RouteEntry::new("/a", "http://first")]);
        let second = RouteGroup::new(vec![RouteEntry::new("/a", "http://second")]);
        let table = RouteTable::new(
            RouteGroup::default(),
            vec![("v1".to_string(), first.clone()), ("V1".to_string(), second)],
        );
        assert_eq!(table.versioned_group("v1"), Some(&first));
    }

    #[test]
    fn test_empty_table() {
        let table = RouteTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.all_entries().count(), 0);
    }
}

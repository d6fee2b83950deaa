//! Route lookup.
//!
//! # Responsibilities
//! - Select the versioned group named by the request, if any
//! - Scan the selected group, then the default group, in declaration order
//! - Return the matched route or an explicit no-match
//!
//! # Design Decisions
//! - First declared match wins; prefix length never affects precedence
//! - A version label with no group, or with no matching entry, falls back
//!   to the default group exactly as if no label had been sent
//! - Pure function over an immutable table (thread-safe without locks)

use crate::routing::matcher::prefix_matches;
use crate::routing::table::{RouteEntry, RouteGroup, RouteTable};

/// Resolve `path` (and an optional version label) to a route.
pub fn resolve<'a>(
    table: &'a RouteTable,
    path: &str,
    version: Option<&str>,
) -> Option<&'a RouteEntry> {
    version
        .filter(|v| !v.is_empty())
        .and_then(|v| table.versioned_group(v))
        .and_then(|group| first_match(group, path))
        .or_else(|| first_match(table.default_group(), path))
}

fn first_match<'a>(group: &'a RouteGroup, path: &str) -> Option<&'a RouteEntry> {
    group
        .entries()
        .iter()
        .find(|entry| prefix_matches(path, entry.path_prefix()))
}

impl RouteTable {
    /// See [`resolve`].
    pub fn resolve(&self, path: &str, version: Option<&str>) -> Option<&RouteEntry> {
        resolve(self, path, version)
    }
}

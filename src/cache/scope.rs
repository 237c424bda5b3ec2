//! Cluster/namespace scope for cached resources
//!
//! Every cached value belongs to the scope (cluster plus selected namespaces)
//! that was active when its fetch started. Values from another scope are never
//! served, so switching clusters or namespaces can't show stale rows.

use std::fmt;

/// Namespace selector meaning "every namespace"
pub const ALL_NAMESPACES: &str = "_all";

/// The user's current cluster and namespace selection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scope {
    /// Cluster (kube context) name
    pub cluster: String,
    /// Selected namespaces; empty means all namespaces
    pub namespaces: Vec<String>,
}

impl Scope {
    /// Creates a scope, normalizing the "all namespaces" selector away
    pub fn new(cluster: impl Into<String>, namespaces: Vec<String>) -> Self {
        let mut namespaces: Vec<String> = namespaces
            .into_iter()
            .map(|ns| ns.trim().to_string())
            .filter(|ns| !ns.is_empty() && ns != ALL_NAMESPACES)
            .collect();
        namespaces.sort();
        namespaces.dedup();

        Self {
            cluster: cluster.into(),
            namespaces,
        }
    }

    /// Returns the cache key for this scope
    pub fn key(&self) -> ScopeKey {
        ScopeKey::new(&self.cluster, &self.namespaces)
    }

    /// Returns true when no namespace filter is applied
    pub fn is_all_namespaces(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// The `namespace` query parameter for list endpoints.
    ///
    /// The backend only filters on a single namespace, so a multi-namespace
    /// selection fetches everything and is filtered with [`Scope::includes`].
    pub fn namespace_param(&self) -> Option<&str> {
        match self.namespaces.as_slice() {
            [single] => Some(single.as_str()),
            _ => None,
        }
    }

    /// Returns true if a resource in `namespace` belongs to this scope.
    ///
    /// Cluster-scoped resources (no namespace) are always included.
    pub fn includes(&self, namespace: Option<&str>) -> bool {
        match namespace {
            None => true,
            Some(_) if self.is_all_namespaces() => true,
            Some(ns) => self.namespaces.iter().any(|selected| selected == ns),
        }
    }

    /// Human-readable namespace label for the header
    pub fn namespace_label(&self) -> String {
        if self.is_all_namespaces() {
            "all namespaces".to_string()
        } else {
            self.namespaces.join(", ")
        }
    }
}

/// Opaque key identifying a scope: `<cluster>::<sorted namespaces>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ScopeKey(String);

impl ScopeKey {
    /// Builds a key from a cluster name and namespace list (order-insensitive)
    pub fn new(cluster: &str, namespaces: &[String]) -> Self {
        let mut sorted: Vec<&str> = namespaces.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        Self(format!("{}::{}", cluster, sorted.join(",")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

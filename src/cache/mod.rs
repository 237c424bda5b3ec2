//! Client-side resource cache
//!
//! This module provides a TTL cache for resource lists fetched from the
//! KubeGraf backend. Values are scoped to the active cluster and namespace
//! selection, refreshed in the background when stale, and concurrent requests
//! for the same key share a single fetch.

mod resource;
pub mod scope;

pub use resource::{
    CacheError, CacheEvent, CacheOptions, CachedResource, FetchError, ResourceCache, DEFAULT_TTL,
};
pub use scope::{Scope, ScopeKey};

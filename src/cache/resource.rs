//! Time-to-live resource cache with in-flight de-duplication
//!
//! `ResourceCache` wraps asynchronous producers (usually an API list call)
//! with a per-key TTL. Stale keys are refetched either in the foreground (the
//! caller waits) or in the background (the caller gets the last good value
//! immediately). Only one tracked fetch per key is in flight at a time and
//! concurrent callers share it.
//!
//! Producer errors never escape `get`: they're normalized into a
//! [`FetchError`], stored on the entry next to the last good value, and
//! broadcast as a [`CacheEvent`] so the UI can decide how to report them.
//!
//! Every fetch takes a cache-wide monotonic sequence number. A completion is
//! applied only if it is newer than whatever the entry last applied, so a slow
//! background fetch can't clobber the result of a later `refetch`.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::scope::ScopeKey;

/// Default time-to-live for cached resource lists
pub const DEFAULT_TTL: Duration = Duration::from_millis(15_000);

/// Buffered cache events per subscriber before the oldest are dropped
const EVENT_CHANNEL_CAPACITY: usize = 64;

type ErasedValue = Arc<dyn Any + Send + Sync>;
type FetchOutcome = Result<ErasedValue, FetchError>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;
type Producer = Arc<dyn Fn() -> BoxFuture<'static, FetchOutcome> + Send + Sync>;

/// A producer failure, normalized to its message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Misuse of the cache itself (as opposed to a failed fetch)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Cache keys must be non-empty
    #[error("cache key must not be empty")]
    EmptyKey,

    /// `refetch` was called for a key that was never fetched
    #[error("no producer registered for cache key '{0}'")]
    UnknownKey(String),

    /// The key was first registered with a different value type
    #[error("cache key '{key}' holds {actual}, not {requested}")]
    TypeMismatch {
        key: String,
        actual: &'static str,
        requested: &'static str,
    },
}

/// Per-call cache behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Maximum age before a value is stale; zero means always stale
    pub ttl: Duration,
    /// Serve the stale value immediately while refreshing behind the caller
    pub background_refresh: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            background_refresh: true,
        }
    }
}

/// Notifications broadcast to cache observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A fetch was issued for the key
    FetchStarted { key: String },
    /// A fresh value was stored
    Updated { key: String },
    /// A fetch failed; any previous value is still served
    Failed { key: String, error: FetchError },
    /// The key was removed
    Invalidated { key: String },
    /// Every key was removed
    Cleared,
    /// The active cluster/namespace scope changed
    ScopeChanged(ScopeKey),
}

struct InFlight {
    seq: u64,
    scope: ScopeKey,
    foreground: bool,
    future: SharedFetch,
}

struct CacheEntry {
    value: Option<ErasedValue>,
    value_scope: ScopeKey,
    fetched_at: Option<Instant>,
    ttl: Duration,
    in_flight: Option<InFlight>,
    last_error: Option<FetchError>,
    producer: Producer,
    value_type: TypeId,
    value_type_name: &'static str,
    applied_seq: u64,
}

impl CacheEntry {
    /// `floor` is the last sequence issued before this entry existed; fetches
    /// started for a previous incarnation of the key can never apply.
    fn new<T: 'static>(producer: Producer, ttl: Duration, floor: u64) -> Self {
        Self {
            value: None,
            value_scope: ScopeKey::default(),
            fetched_at: None,
            ttl,
            in_flight: None,
            last_error: None,
            producer,
            value_type: TypeId::of::<T>(),
            value_type_name: type_name::<T>(),
            applied_seq: floor,
        }
    }

    fn check_type<T: 'static>(&self, key: &str) -> Result<(), CacheError> {
        if self.value_type == TypeId::of::<T>() {
            Ok(())
        } else {
            Err(CacheError::TypeMismatch {
                key: key.to_string(),
                actual: self.value_type_name,
                requested: type_name::<T>(),
            })
        }
    }

    fn has_value_in(&self, scope: &ScopeKey) -> bool {
        self.value.is_some() && self.value_scope == *scope
    }

    fn age(&self, scope: &ScopeKey, now: Instant) -> Option<Duration> {
        if !self.has_value_in(scope) {
            return None;
        }
        self.fetched_at
            .map(|fetched_at| now.saturating_duration_since(fetched_at))
    }

    fn is_fresh(&self, scope: &ScopeKey, now: Instant) -> bool {
        self.age(scope, now).is_some_and(|age| age < self.ttl)
    }

    fn in_flight_for(&self, scope: &ScopeKey) -> Option<&InFlight> {
        self.in_flight
            .as_ref()
            .filter(|in_flight| in_flight.scope == *scope)
    }

    fn in_flight_for_mut(&mut self, scope: &ScopeKey) -> Option<&mut InFlight> {
        self.in_flight
            .as_mut()
            .filter(|in_flight| in_flight.scope == *scope)
    }
}

struct CacheState {
    entries: HashMap<String, CacheEntry>,
    scope: ScopeKey,
    last_seq: u64,
}

impl CacheState {
    fn next_seq(&mut self) -> u64 {
        self.last_seq += 1;
        self.last_seq
    }
}

/// Shared, cloneable TTL cache for asynchronously produced values.
///
/// Clones share the same entries. Fetches are spawned on the ambient tokio
/// runtime, so the cache must be used from within one.
#[derive(Clone)]
pub struct ResourceCache {
    state: Arc<Mutex<CacheState>>,
    events: broadcast::Sender<CacheEvent>,
}

impl ResourceCache {
    /// Creates an empty cache in the default scope
    pub fn new() -> Self {
        Self::with_scope(ScopeKey::default())
    }

    /// Creates an empty cache in the given scope
    pub fn with_scope(scope: ScopeKey) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(CacheState {
                entries: HashMap::new(),
                scope,
                last_seq: 0,
            })),
            events,
        }
    }

    /// Subscribes to cache events
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Returns the active scope
    pub fn scope(&self) -> ScopeKey {
        self.state.lock().scope.clone()
    }

    /// Switches the active scope.
    ///
    /// Values fetched under another scope stay in memory but are no longer
    /// served; fetches still in flight for the old scope are discarded when
    /// they complete.
    pub fn set_scope(&self, scope: ScopeKey) {
        {
            let mut state = self.state.lock();
            if state.scope == scope {
                return;
            }
            info!(from = %state.scope, to = %scope, "cache scope changed");
            state.scope = scope.clone();
        }
        self.emit(CacheEvent::ScopeChanged(scope));
    }

    /// Returns a handle to the value for `key`, fetching it if needed.
    ///
    /// A fetch is issued when the key has no value in the current scope or its
    /// value is at least `options.ttl` old. If `options.background_refresh` is
    /// set and a value exists, this returns immediately and the fetch
    /// completes behind the caller; otherwise it waits for the fetch. A fetch
    /// already in flight for the key is joined, never duplicated.
    ///
    /// Fetch failures are not returned here; inspect [`CachedResource::error`].
    pub async fn get<T, E, F, Fut>(
        &self,
        key: &str,
        producer: F,
        options: CacheOptions,
    ) -> Result<CachedResource<T>, CacheError>
    where
        T: Send + Sync + 'static,
        E: fmt::Display + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }
        let producer = erase(producer);

        let (pending, wait) = {
            let mut state = self.state.lock();
            let scope = state.scope.clone();
            let floor = state.last_seq;
            let seq = state.next_seq();
            let now = Instant::now();

            let entry = state
                .entries
                .entry(key.to_string())
                .or_insert_with(|| CacheEntry::new::<T>(Arc::clone(&producer), options.ttl, floor));
            entry.check_type::<T>(key)?;
            entry.producer = Arc::clone(&producer);
            entry.ttl = options.ttl;

            let serve_stale = options.background_refresh && entry.has_value_in(&scope);

            if entry.is_fresh(&scope, now) {
                (None, false)
            } else if let Some(in_flight) = entry.in_flight_for_mut(&scope) {
                debug!(key, seq = in_flight.seq, "joining in-flight fetch");
                // A caller that waits turns a background fetch into a load.
                in_flight.foreground |= !serve_stale;
                (Some(in_flight.future.clone()), !serve_stale)
            } else {
                let fetch = self.start_fetch(key, entry, scope, seq, !serve_stale);
                (Some(fetch), !serve_stale)
            }
        };

        if wait {
            if let Some(fetch) = pending {
                let _ = fetch.await;
            }
        }

        Ok(CachedResource {
            cache: self.clone(),
            key: key.to_string(),
            producer,
            ttl: options.ttl,
            _value: PhantomData,
        })
    }

    /// Fetches `key` again with its last registered producer, ignoring TTL.
    ///
    /// The new fetch supersedes any fetch already in flight. On failure the
    /// previous value is kept and the error recorded.
    pub async fn refetch(&self, key: &str) -> Result<(), CacheError> {
        let fetch = {
            let mut state = self.state.lock();
            let scope = state.scope.clone();
            let seq = state.next_seq();
            let entry = state
                .entries
                .get_mut(key)
                .ok_or_else(|| CacheError::UnknownKey(key.to_string()))?;
            self.start_fetch(key, entry, scope, seq, true)
        };

        let _ = fetch.await;
        Ok(())
    }

    /// Like [`ResourceCache::refetch`], recreating the entry if it was
    /// invalidated since the handle was created.
    async fn refetch_with<T: Send + Sync + 'static>(
        &self,
        key: &str,
        producer: &Producer,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let fetch = {
            let mut state = self.state.lock();
            let scope = state.scope.clone();
            let floor = state.last_seq;
            let seq = state.next_seq();
            let entry = state
                .entries
                .entry(key.to_string())
                .or_insert_with(|| CacheEntry::new::<T>(Arc::clone(producer), ttl, floor));
            entry.check_type::<T>(key)?;
            self.start_fetch(key, entry, scope, seq, true)
        };

        let _ = fetch.await;
        Ok(())
    }

    /// Starts a background fetch for `key` if its value has reached its TTL
    /// and nothing is in flight. Does not wait; returns whether a fetch started.
    ///
    /// Keys without a value in the active scope are left alone, so a failing
    /// first load is not retried behind the caller's back.
    pub fn refresh_if_stale(&self, key: &str) -> bool {
        let mut state = self.state.lock();
        let scope = state.scope.clone();
        let now = Instant::now();
        let due = state.entries.get(key).is_some_and(|entry| {
            entry.has_value_in(&scope)
                && !entry.is_fresh(&scope, now)
                && entry.in_flight_for(&scope).is_none()
        });
        if !due {
            return false;
        }

        let seq = state.next_seq();
        if let Some(entry) = state.entries.get_mut(key) {
            debug!(key, seq, "refreshing stale entry");
            // Runs on its own task; the shared handle isn't needed here.
            let _ = self.start_fetch(key, entry, scope, seq, false);
        }
        true
    }

    /// Removes `key`, forcing the next `get` to fetch. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.state.lock().entries.remove(key).is_some();
        if removed {
            debug!(key, "cache entry invalidated");
            self.emit(CacheEvent::Invalidated {
                key: key.to_string(),
            });
        }
        removed
    }

    /// Removes every entry
    pub fn clear(&self) {
        let count = {
            let mut state = self.state.lock();
            let count = state.entries.len();
            state.entries.clear();
            count
        };
        debug!(count, "cache cleared");
        self.emit(CacheEvent::Cleared);
    }

    /// Returns the current value for `key` in the active scope, fresh or stale
    pub fn peek<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        let state = self.state.lock();
        let entry = state.entries.get(key)?;
        if !entry.has_value_in(&state.scope) {
            return None;
        }
        entry.value.clone()?.downcast::<T>().ok()
    }

    /// Returns true while a foreground fetch for `key` is in flight
    pub fn is_loading(&self, key: &str) -> bool {
        let state = self.state.lock();
        state
            .entries
            .get(key)
            .and_then(|entry| entry.in_flight_for(&state.scope))
            .is_some_and(|in_flight| in_flight.foreground)
    }

    /// Returns the error from the most recent applied fetch, if it failed
    pub fn last_error(&self, key: &str) -> Option<FetchError> {
        self.state
            .lock()
            .entries
            .get(key)
            .and_then(|entry| entry.last_error.clone())
    }

    /// Age of the value for `key` in the active scope
    pub fn age(&self, key: &str) -> Option<Duration> {
        let state = self.state.lock();
        state
            .entries
            .get(key)
            .and_then(|entry| entry.age(&state.scope, Instant::now()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Issues a fetch for `entry`. Must be called with the state lock held.
    fn start_fetch(
        &self,
        key: &str,
        entry: &mut CacheEntry,
        scope: ScopeKey,
        seq: u64,
        foreground: bool,
    ) -> SharedFetch {
        let producer = Arc::clone(&entry.producer);
        let cache = self.clone();
        let owned_key = key.to_string();
        let fetch_scope = scope.clone();

        let future = async move {
            let outcome = producer().await;
            cache.complete(&owned_key, seq, &fetch_scope, &outcome);
            outcome
        }
        .boxed()
        .shared();

        let superseded = entry.in_flight.replace(InFlight {
            seq,
            scope,
            foreground,
            future: future.clone(),
        });
        if let Some(previous) = superseded {
            debug!(key, seq, superseded = previous.seq, "superseding in-flight fetch");
        }

        // Drive the fetch to completion even if every caller goes away.
        tokio::spawn(future.clone());

        debug!(key, seq, foreground, "fetch started");
        self.emit(CacheEvent::FetchStarted {
            key: key.to_string(),
        });
        future
    }

    fn complete(&self, key: &str, seq: u64, scope: &ScopeKey, outcome: &FetchOutcome) {
        let event = {
            let mut state = self.state.lock();
            let same_scope = state.scope == *scope;
            let Some(entry) = state.entries.get_mut(key) else {
                debug!(key, seq, "entry removed before fetch completed; dropping result");
                return;
            };

            if entry
                .in_flight
                .as_ref()
                .is_some_and(|in_flight| in_flight.seq == seq)
            {
                entry.in_flight = None;
            }
            if seq <= entry.applied_seq {
                debug!(key, seq, applied = entry.applied_seq, "discarding out-of-order response");
                return;
            }
            if !same_scope {
                debug!(key, seq, fetched_for = %scope, "scope changed during fetch; discarding response");
                return;
            }
            entry.applied_seq = seq;

            match outcome {
                Ok(value) => {
                    entry.value = Some(Arc::clone(value));
                    entry.value_scope = scope.clone();
                    entry.fetched_at = Some(Instant::now());
                    entry.last_error = None;
                    debug!(key, seq, "cache entry updated");
                    CacheEvent::Updated {
                        key: key.to_string(),
                    }
                }
                Err(error) => {
                    warn!(key, seq, %error, "fetch failed; keeping last good value");
                    entry.last_error = Some(error.clone());
                    CacheEvent::Failed {
                        key: key.to_string(),
                        error: error.clone(),
                    }
                }
            }
        };

        self.emit(event);
    }

    fn emit(&self, event: CacheEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ResourceCache")
            .field("scope", &state.scope)
            .field("entries", &state.entries.len())
            .finish()
    }
}

/// Type-erases a producer so entries of different value types share a map
fn erase<T, E, F, Fut>(producer: F) -> Producer
where
    T: Send + Sync + 'static,
    E: fmt::Display + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Arc::new(move || {
        producer()
            .map(|result| match result {
                Ok(value) => Ok(Arc::new(value) as ErasedValue),
                Err(error) => Err(FetchError::new(error.to_string())),
            })
            .boxed()
    })
}

/// Handle to one cached key, as returned by [`ResourceCache::get`].
///
/// Accessors read the live entry, so a handle observes background refreshes
/// that complete after it was created.
pub struct CachedResource<T> {
    cache: ResourceCache,
    key: String,
    producer: Producer,
    ttl: Duration,
    _value: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> CachedResource<T> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The latest value in the active scope, if any
    pub fn data(&self) -> Option<Arc<T>> {
        self.cache.peek::<T>(&self.key)
    }

    /// True while a foreground fetch is in flight
    pub fn loading(&self) -> bool {
        self.cache.is_loading(&self.key)
    }

    /// The last fetch error, cleared by the next successful fetch
    pub fn error(&self) -> Option<FetchError> {
        self.cache.last_error(&self.key)
    }

    pub fn age(&self) -> Option<Duration> {
        self.cache.age(&self.key)
    }

    /// Forces a fetch ignoring TTL and waits for it
    pub async fn refetch(&self) -> Result<(), CacheError> {
        self.cache
            .refetch_with::<T>(&self.key, &self.producer, self.ttl)
            .await
    }
}

impl<T> Clone for CachedResource<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            key: self.key.clone(),
            producer: Arc::clone(&self.producer),
            ttl: self.ttl,
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for CachedResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedResource")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_millis(15_000);

    fn foreground() -> CacheOptions {
        CacheOptions {
            ttl: TTL,
            background_refresh: false,
        }
    }

    fn background() -> CacheOptions {
        CacheOptions {
            ttl: TTL,
            background_refresh: true,
        }
    }

    /// Producer returning "v1", "v2", ... after `delay`, counting calls
    fn versioned(
        calls: Arc<AtomicUsize>,
        delay: Duration,
    ) -> impl Fn() -> BoxFuture<'static, Result<String, String>> + Clone + Send + Sync + 'static
    {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                tokio::time::sleep(delay).await;
                Ok(format!("v{}", n))
            }
            .boxed()
        }
    }

    /// Producer replaying scripted (delay, result) steps in order
    fn scripted(
        steps: Vec<(u64, Result<&'static str, &'static str>)>,
    ) -> impl Fn() -> BoxFuture<'static, Result<String, String>> + Clone + Send + Sync + 'static
    {
        let steps = Arc::new(Mutex::new(VecDeque::from(steps)));
        move || {
            let step = steps.lock().pop_front();
            async move {
                let (delay, result) = step.expect("producer called more often than scripted");
                tokio::time::sleep(Duration::from_millis(delay)).await;
                result.map(str::to_string).map_err(str::to_string)
            }
            .boxed()
        }
    }

    fn value(resource: &CachedResource<String>) -> Option<String> {
        resource.data().map(|v| v.as_str().to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_pods_view_ttl_timeline() {
        let cache = ResourceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch_pods = versioned(calls.clone(), Duration::ZERO);

        // t=0: fetch issued
        let pods = cache.get("pods", fetch_pods.clone(), foreground()).await.unwrap();
        assert_eq!(value(&pods).as_deref(), Some("v1"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // t=5000: still fresh
        tokio::time::advance(Duration::from_millis(5_000)).await;
        let pods = cache.get("pods", fetch_pods.clone(), foreground()).await.unwrap();
        assert_eq!(value(&pods).as_deref(), Some("v1"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // t=16000: stale, refetched
        tokio::time::advance(Duration::from_millis(11_000)).await;
        let pods = cache.get("pods", fetch_pods, foreground()).await.unwrap();
        assert_eq!(value(&pods).as_deref(), Some("v2"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_gets_share_one_fetch() {
        let cache = ResourceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = versioned(calls.clone(), Duration::from_millis(50));

        let (a, b) = tokio::join!(
            cache.get("roles", producer.clone(), background()),
            cache.get("roles", producer.clone(), background()),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(value(&a.unwrap()).as_deref(), Some("v1"));
        assert_eq!(value(&b.unwrap()).as_deref(), Some("v1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_without_prior_value_sets_error() {
        let cache = ResourceCache::new();
        let producer = scripted(vec![(0, Err("connection refused"))]);

        let roles = cache.get("roles", producer, foreground()).await.unwrap();

        assert!(roles.data().is_none());
        assert_eq!(
            roles.error().map(|e| e.message().to_string()).as_deref(),
            Some("connection refused")
        );
        assert!(!roles.loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_prior_value() {
        let cache = ResourceCache::new();
        let producer = scripted(vec![(0, Ok("list-a")), (0, Err("HTTP 500"))]);

        let roles = cache.get("roles", producer, foreground()).await.unwrap();
        assert_eq!(value(&roles).as_deref(), Some("list-a"));

        roles.refetch().await.unwrap();

        assert_eq!(value(&roles).as_deref(), Some("list-a"));
        assert_eq!(roles.error(), Some(FetchError::new("HTTP 500")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_clears_previous_error() {
        let cache = ResourceCache::new();
        let producer = scripted(vec![(0, Err("timeout")), (0, Ok("list-b"))]);

        let roles = cache.get("roles", producer, foreground()).await.unwrap();
        assert!(roles.error().is_some());

        roles.refetch().await.unwrap();
        assert!(roles.error().is_none());
        assert_eq!(value(&roles).as_deref(), Some("list-b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_fetch() {
        let cache = ResourceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = versioned(calls.clone(), Duration::ZERO);

        cache.get("pvs", producer.clone(), foreground()).await.unwrap();
        assert!(cache.invalidate("pvs"));
        assert!(!cache.contains("pvs"));

        let pvs = cache.get("pvs", producer, foreground()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(value(&pvs).as_deref(), Some("v2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_ignores_freshness() {
        let cache = ResourceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = versioned(calls.clone(), Duration::ZERO);

        let certs = cache.get("certificates", producer, foreground()).await.unwrap();
        cache.refetch("certificates").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(value(&certs).as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_refetch_unknown_key_is_an_error() {
        let cache = ResourceCache::new();
        assert_eq!(
            cache.refetch("missing").await,
            Err(CacheError::UnknownKey("missing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let cache = ResourceCache::new();
        let producer = scripted(vec![]);
        let result = cache.get("", producer, foreground()).await;
        assert_eq!(result.unwrap_err(), CacheError::EmptyKey);
    }

    #[tokio::test]
    async fn test_type_mismatch_rejected() {
        let cache = ResourceCache::new();
        cache
            .get("namespaces", || async { Ok::<_, String>(7u32) }, foreground())
            .await
            .unwrap();

        let result = cache
            .get("namespaces", || async { Ok::<_, String>("x".to_string()) }, foreground())
            .await;

        assert!(matches!(result, Err(CacheError::TypeMismatch { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_refresh_serves_stale_value() {
        let cache = ResourceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = versioned(calls.clone(), Duration::from_millis(100));

        cache.get("sts", producer.clone(), background()).await.unwrap();
        tokio::time::advance(TTL).await;

        let sts = cache.get("sts", producer, background()).await.unwrap();
        assert_eq!(value(&sts).as_deref(), Some("v1"), "stale value served immediately");
        assert!(!sts.loading(), "background fetches don't report loading");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(value(&sts).as_deref(), Some("v2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_background_refresh_keeps_stale_value() {
        let cache = ResourceCache::new();
        let producer = scripted(vec![(0, Ok("v1")), (50, Err("HTTP 503"))]);

        cache.get("sts", producer.clone(), background()).await.unwrap();
        tokio::time::advance(TTL).await;

        let sts = cache.get("sts", producer, background()).await.unwrap();
        assert_eq!(value(&sts).as_deref(), Some("v1"));
        assert!(sts.error().is_none(), "refresh still running");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(value(&sts).as_deref(), Some("v1"), "stale value kept");
        assert_eq!(sts.error(), Some(FetchError::new("HTTP 503")));
        assert!(!sts.loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreground_join_marks_background_fetch_loading() {
        let cache = ResourceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = versioned(calls.clone(), Duration::from_millis(100));

        cache.get("pvc", producer.clone(), foreground()).await.unwrap();
        tokio::time::advance(TTL).await;
        assert!(cache.refresh_if_stale("pvc"));
        assert!(!cache.is_loading("pvc"));

        let task = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get("pvc", producer, foreground()).await })
        };
        tokio::task::yield_now().await;
        assert!(cache.is_loading("pvc"), "a waiting caller sees a load");

        let pvcs = task.await.unwrap().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2, "joined, not duplicated");
        assert_eq!(value(&pvcs).as_deref(), Some("v2"));
        assert!(!pvcs.loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreground_get_waits_when_stale() {
        let cache = ResourceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = versioned(calls.clone(), Duration::from_millis(100));

        cache.get("sts", producer.clone(), foreground()).await.unwrap();
        tokio::time::advance(TTL).await;

        let sts = cache.get("sts", producer, foreground()).await.unwrap();
        assert_eq!(value(&sts).as_deref(), Some("v2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_response_cannot_overwrite_newer() {
        let cache = ResourceCache::new();
        let producer = scripted(vec![(0, Ok("v1")), (500, Ok("slow")), (10, Ok("fast"))]);

        cache.get("crds", producer.clone(), background()).await.unwrap();
        tokio::time::advance(TTL).await;

        // Starts the slow background fetch and returns at once.
        let crds = cache.get("crds", producer, background()).await.unwrap();
        assert_eq!(value(&crds).as_deref(), Some("v1"));

        crds.refetch().await.unwrap();
        assert_eq!(value(&crds).as_deref(), Some("fast"));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(value(&crds).as_deref(), Some("fast"), "slow response discarded");
    }

    #[tokio::test(start_paused = true)]
    async fn test_values_are_isolated_by_scope() {
        let prod = ScopeKey::new("prod", &["default".to_string()]);
        let staging = ScopeKey::new("staging", &["default".to_string()]);
        let cache = ResourceCache::with_scope(prod.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = versioned(calls.clone(), Duration::ZERO);

        let roles = cache.get("roles", producer.clone(), background()).await.unwrap();
        assert_eq!(value(&roles).as_deref(), Some("v1"));

        cache.set_scope(staging);
        assert!(roles.data().is_none(), "prod rows must not show in staging");

        let roles = cache.get("roles", producer, background()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(value(&roles).as_deref(), Some("v2"));

        cache.set_scope(prod);
        assert!(roles.data().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scope_change_discards_in_flight_response() {
        let cache = ResourceCache::with_scope(ScopeKey::new("a", &[]));
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = versioned(calls.clone(), Duration::from_millis(100));

        let task = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get("roles", producer, foreground()).await })
        };
        tokio::task::yield_now().await;
        cache.set_scope(ScopeKey::new("b", &[]));

        let roles = task.await.unwrap().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(roles.data().is_none());
        assert!(cache.age("roles").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_during_fetch_drops_result() {
        let cache = ResourceCache::new();
        let producer = scripted(vec![(100, Ok("old")), (0, Ok("new"))]);

        let task = {
            let cache = cache.clone();
            let producer = producer.clone();
            tokio::spawn(async move { cache.get("pvcs", producer, foreground()).await })
        };
        tokio::task::yield_now().await;
        cache.invalidate("pvcs");

        let pvcs = cache.get("pvcs", producer, foreground()).await.unwrap();
        assert_eq!(value(&pvcs).as_deref(), Some("new"));

        task.await.unwrap().unwrap();
        assert_eq!(value(&pvcs).as_deref(), Some("new"), "result for removed entry dropped");
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_refetch_recreates_invalidated_entry() {
        let cache = ResourceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = versioned(calls.clone(), Duration::ZERO);

        let sas = cache.get("serviceaccounts", producer, foreground()).await.unwrap();
        cache.invalidate("serviceaccounts");
        assert!(sas.data().is_none());

        sas.refetch().await.unwrap();
        assert_eq!(value(&sas).as_deref(), Some("v2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_always_refetches() {
        let cache = ResourceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = versioned(calls.clone(), Duration::ZERO);
        let options = CacheOptions {
            ttl: Duration::ZERO,
            background_refresh: false,
        };

        cache.get("events", producer.clone(), options).await.unwrap();
        cache.get("events", producer, options).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_broadcast_fetch_lifecycle() {
        let cache = ResourceCache::new();
        let mut events = cache.subscribe();
        let producer = scripted(vec![(0, Ok("x")), (0, Err("boom"))]);

        let rbs = cache.get("rolebindings", producer, foreground()).await.unwrap();
        rbs.refetch().await.unwrap();
        cache.clear();

        let key = "rolebindings".to_string();
        assert_eq!(events.recv().await.unwrap(), CacheEvent::FetchStarted { key: key.clone() });
        assert_eq!(events.recv().await.unwrap(), CacheEvent::Updated { key: key.clone() });
        assert_eq!(events.recv().await.unwrap(), CacheEvent::FetchStarted { key: key.clone() });
        assert_eq!(
            events.recv().await.unwrap(),
            CacheEvent::Failed {
                key,
                error: FetchError::new("boom")
            }
        );
        assert_eq!(events.recv().await.unwrap(), CacheEvent::Cleared);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_if_stale_only_when_due() {
        let cache = ResourceCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = versioned(calls.clone(), Duration::from_millis(50));

        assert!(!cache.refresh_if_stale("pvc"), "unknown key is never refreshed");

        let pvcs = cache.get("pvc", producer, foreground()).await.unwrap();
        assert!(!cache.refresh_if_stale("pvc"), "fresh value left alone");

        tokio::time::advance(TTL).await;
        assert!(cache.refresh_if_stale("pvc"));
        assert!(!cache.refresh_if_stale("pvc"), "in-flight fetch not duplicated");
        assert!(!pvcs.loading());
        assert_eq!(value(&pvcs).as_deref(), Some("v1"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(value(&pvcs).as_deref(), Some("v2"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_if_stale_skips_failed_first_load() {
        let cache = ResourceCache::new();
        let producer = scripted(vec![(0, Err("unreachable"))]);

        let crds = cache.get("crds", producer, foreground()).await.unwrap();
        assert!(crds.error().is_some());
        tokio::time::advance(TTL).await;
        assert!(!cache.refresh_if_stale("crds"));
    }

    #[test]
    fn test_default_options_match_console_defaults() {
        let options = CacheOptions::default();
        assert_eq!(options.ttl, Duration::from_secs(15));
        assert!(options.background_refresh);
    }
}

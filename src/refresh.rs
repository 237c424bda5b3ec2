//! Background data refresh system
//!
//! Keeps the resource list on screen fresh while the console is idle, and
//! relays cache events to the main loop over a tokio channel.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, trace};

use crate::cache::{CacheEvent, ResourceCache};

/// Upper bound on the refresh tick
pub const MAX_INTERVAL: Duration = Duration::from_secs(15);

/// Lower bound on the refresh tick, so a tiny TTL can't spin the loop
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Messages sent from background refresh to main app
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshMessage {
    /// A stale entry for the watched key is being refreshed
    Refreshing { key: String },
    /// Relayed cache activity
    Cache(CacheEvent),
}

/// Configuration for the refresh tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// How often the watched key is checked for staleness
    pub interval: Duration,
    /// Whether auto-refresh is enabled
    pub enabled: bool,
}

impl RefreshConfig {
    /// Ticks every `min(ttl, 15s)`, clamped to at least one second
    pub fn for_ttl(ttl: Duration, enabled: bool) -> Self {
        Self {
            interval: ttl.min(MAX_INTERVAL).max(MIN_INTERVAL),
            enabled,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self::for_ttl(crate::cache::DEFAULT_TTL, true)
    }
}

/// Handle for controlling the background refresh system
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    /// Cache key currently on screen
    watched: watch::Sender<Option<String>>,
    /// Flag to signal shutdown
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Creates a new RefreshHandle and spawns the background refresh task
    ///
    /// Cache events are relayed whether or not auto-refresh is enabled.
    pub fn spawn(cache: ResourceCache, config: RefreshConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (watched_tx, watched_rx) = watch::channel::<Option<String>>(None);
        let mut events = cache.subscribe();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // Skip the first tick (immediate)
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick(), if config.enabled => {
                        let key = watched_rx.borrow().clone();
                        let Some(key) = key else { continue };
                        trace!(%key, "refresh tick");
                        if cache.refresh_if_stale(&key)
                            && msg_tx.send(RefreshMessage::Refreshing { key }).await.is_err()
                        {
                            break;
                        }
                    }
                    event = events.recv() => {
                        match event {
                            Ok(event) => {
                                if msg_tx.send(RefreshMessage::Cache(event)).await.is_err() {
                                    break;
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                debug!(skipped, "refresh relay lagged behind cache events");
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
            debug!("refresh task stopped");
        });

        Self {
            receiver: msg_rx,
            watched: watched_tx,
            shutdown_tx,
        }
    }

    /// Sets the cache key the refresh loop keeps fresh
    pub fn watch(&self, key: Option<String>) {
        self.watched.send_replace(key);
    }

    /// Shuts down the background refresh task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Checks for pending refresh messages without blocking
///
/// # Returns
/// * `Some(RefreshMessage)` if a message was available
/// * `None` if no messages are pending
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}

//! Per-guild configuration cache
//!
//! Sits in front of a [`ConfigStore`]. Entries live for a fixed TTL, are
//! loaded at most once concurrently per guild, can be invalidated at any time
//! and are bounded in number. Capacity only affects how often guilds are
//! reloaded, never what they see.

use crate::automod::{AutomodResult, ConfigStore, GuildAutomodConfig};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

/// How long a loaded config is served before it is reloaded
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
/// Maximum number of guilds kept in the cache
pub const DEFAULT_CAPACITY: usize = 1000;

/// Requests delivered to the cache maintenance task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheRequest {
    /// A guild's config changed; drop the cached copy
    Invalidate { guild_id: u64 },
    /// Drop every cached config
    InvalidateAll,
    /// Stop the maintenance task
    Shutdown,
}

struct CacheEntry {
    value: Arc<GuildAutomodConfig>,
    expires_at: Instant,
    /// Milliseconds since the cache epoch
    last_access: AtomicU64,
}

/// TTL cache of guild configs with single-flight loading
pub struct ConfigCache {
    store: Arc<dyn ConfigStore>,
    entries: DashMap<u64, CacheEntry>,
    /// One lock per guild currently being loaded (or recently loaded)
    loading: DashMap<u64, Arc<Mutex<()>>>,
    ttl: Duration,
    capacity: usize,
    epoch: Instant,
}

impl std::fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl ConfigCache {
    /// Create a cache with the default TTL and capacity
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self::with_limits(store, DEFAULT_TTL, DEFAULT_CAPACITY)
    }

    /// Create a cache with a custom TTL and capacity
    pub fn with_limits(store: Arc<dyn ConfigStore>, ttl: Duration, capacity: usize) -> Self {
        Self {
            store,
            entries: DashMap::new(),
            loading: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
            epoch: Instant::now(),
        }
    }

    /// Get the config of a guild, loading it if it is missing or expired.
    ///
    /// Concurrent callers for the same guild share a single load.
    ///
    /// # Errors
    /// Returns the store's error if the config could not be loaded. Nothing is
    /// cached in that case, so the next call tries again.
    pub async fn get(&self, guild_id: u64) -> AutomodResult<Arc<GuildAutomodConfig>> {
        if let Some(config) = self.fresh(guild_id) {
            return Ok(config);
        }

        let lock = self
            .loading
            .entry(guild_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let _guard = lock.lock().await;

        // Another caller may have finished loading while we waited
        if let Some(config) = self.fresh(guild_id) {
            return Ok(config);
        }

        let config = self.load(guild_id).await?;
        self.insert(guild_id, Arc::clone(&config));
        Ok(config)
    }

    /// Drop the cached config of a guild. The next `get` reloads it.
    pub fn invalidate(&self, guild_id: u64) {
        if self.entries.remove(&guild_id).is_some() {
            debug!(guild_id, "Invalidated cached automod config");
        }
    }

    /// Drop every cached config
    pub fn invalidate_all(&self) {
        self.entries.clear();
        debug!("Invalidated all cached automod configs");
    }

    /// Load the configs of `guild_ids` ahead of their first message
    pub async fn warm(&self, guild_ids: &[u64]) -> usize {
        let mut loaded = 0;
        for &guild_id in guild_ids {
            match self.get(guild_id).await {
                Ok(_) => loaded += 1,
                Err(e) => debug!(guild_id, "Failed to warm automod config: {e}"),
            }
        }
        loaded
    }

    /// Whether a guild has an unexpired cached config
    #[must_use]
    pub fn contains(&self, guild_id: u64) -> bool {
        self.entries
            .get(&guild_id)
            .is_some_and(|entry| entry.expires_at > Instant::now())
    }

    /// Number of cached entries, expired ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove expired entries and idle load locks. Returns the number of entries removed.
    pub fn reap(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        // Only the map holds an idle lock
        self.loading.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.entries.len())
    }

    /// Apply one maintenance request. Returns `false` on shutdown.
    pub fn handle_request(&self, request: CacheRequest) -> bool {
        match request {
            CacheRequest::Invalidate { guild_id } => self.invalidate(guild_id),
            CacheRequest::InvalidateAll => self.invalidate_all(),
            CacheRequest::Shutdown => return false,
        }
        true
    }

    /// Spawn the maintenance task: serves invalidation requests as they
    /// arrive and reaps expired entries every `interval`. `on_reap` runs after
    /// each periodic pass.
    pub fn start_maintenance<F>(
        self: Arc<Self>,
        mut rx: Receiver<CacheRequest>,
        interval: Duration,
        on_reap: F,
    ) -> JoinHandle<()>
    where
        F: Fn() + Send + 'static,
    {
        tokio::spawn(async move {
            info!("Starting automod cache maintenance with {interval:?} interval");
            let mut ticker = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    request = rx.recv() => {
                        let Some(request) = request else {
                            info!("Invalidation channel closed");
                            break;
                        };
                        if !self.handle_request(request) {
                            info!("Received shutdown request for automod cache maintenance");
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let removed = self.reap();
                        if removed > 0 {
                            debug!(removed, "Reaped expired automod configs");
                        }
                        on_reap();
                    }
                }
            }

            info!("Automod cache maintenance shut down");
        })
    }

    fn now_millis(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn fresh(&self, guild_id: u64) -> Option<Arc<GuildAutomodConfig>> {
        let entry = self.entries.get(&guild_id)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        entry.last_access.store(self.now_millis(), Ordering::Relaxed);
        Some(Arc::clone(&entry.value))
    }

    async fn load(&self, guild_id: u64) -> AutomodResult<Arc<GuildAutomodConfig>> {
        let mut config = self
            .store
            .load_config(guild_id)
            .await?
            .unwrap_or_else(|| GuildAutomodConfig::disabled(guild_id));
        config.guild_id = guild_id;
        config.compile();

        debug!(
            guild_id,
            enabled = config.enabled,
            rules = ?config.active_rules(),
            "Loaded automod config"
        );
        Ok(Arc::new(config))
    }

    fn insert(&self, guild_id: u64, value: Arc<GuildAutomodConfig>) {
        self.entries.insert(
            guild_id,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
                last_access: AtomicU64::new(self.now_millis()),
            },
        );

        while self.entries.len() > self.capacity {
            if !self.evict_least_recent(guild_id) {
                break;
            }
        }
    }

    /// Evict the least recently used entry other than `keep`
    fn evict_least_recent(&self, keep: u64) -> bool {
        let victim = self
            .entries
            .iter()
            .filter(|entry| *entry.key() != keep)
            .min_by_key(|entry| entry.value().last_access.load(Ordering::Relaxed))
            .map(|entry| *entry.key());

        match victim {
            Some(guild_id) => {
                self.entries.remove(&guild_id);
                debug!(guild_id, "Evicted automod config to stay within capacity");
                true
            }
            None => false,
        }
    }
}

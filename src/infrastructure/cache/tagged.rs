use std::{
    any::Any,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

/// Identifies one cached call: the accessor's name plus its arguments in
/// serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    function: &'static str,
    args: String,
}

impl CacheKey {
    pub fn new(function: &'static str, args: impl Serialize) -> Self {
        CacheKey {
            function,
            args: serde_json::to_string(&args).unwrap_or_default(),
        }
    }

    pub fn function(&self) -> &'static str {
        self.function
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
    tags: Vec<&'static str>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Process-wide memo of accessor results with per-entry expiry and tag
/// groups. A tag invalidation drops every entry carrying that tag.
#[derive(Default)]
pub struct TaggedCache {
    entries: DashMap<CacheKey, CacheEntry>,
    // Bumped by every invalidation; a load that straddles one is not stored.
    generation: AtomicU64,
}

impl TaggedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let now = Instant::now();
        let hit = {
            let entry = self.entries.get(key)?;
            if entry.is_live(now) {
                entry.value.downcast_ref::<T>().cloned()
            } else {
                None
            }
        };

        if hit.is_none() {
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }
        hit
    }

    pub fn insert<T>(&self, key: CacheKey, value: T, tags: &[&'static str], ttl: Duration)
    where
        T: Send + Sync + 'static,
    {
        self.entries.insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                expires_at: Instant::now() + ttl,
                tags: tags.to_vec(),
            },
        );
    }

    /// Returns the live entry for `key`, or runs `loader` and stores its
    /// value. Errors are passed through and never stored.
    pub async fn get_or_load<T, E, F, Fut>(
        &self,
        key: CacheKey,
        tags: &[&'static str],
        ttl: Duration,
        loader: F,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(&key) {
            debug!(function = key.function, "cache hit");
            return Ok(hit);
        }
        debug!(function = key.function, "cache miss");

        let generation = self.generation.load(Ordering::Acquire);
        let value = loader().await?;

        if self.generation.load(Ordering::Acquire) == generation {
            self.insert(key.clone(), value.clone(), tags, ttl);
            if self.generation.load(Ordering::Acquire) != generation {
                self.entries.remove(&key);
            }
        } else {
            debug!(function = key.function, "invalidated during load, not caching");
        }

        Ok(value)
    }

    /// Removes every entry tagged with `tag` and returns how many went.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        self.generation.fetch_add(1, Ordering::AcqRel);

        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.tags.iter().any(|t| *t == tag);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn invalidate_all(&self) -> usize {
        self.generation.fetch_add(1, Ordering::AcqRel);

        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = entry.is_live(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

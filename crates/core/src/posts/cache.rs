//! Count- and time-bounded cache of raw post file contents.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Duration;

use crate::types::Timestamp;

/// Default maximum number of cached files.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Default time-to-live of a cached file.
pub const DEFAULT_TTL_SECS: i64 = 60 * 60 * 24 * 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostCacheConfig {
    pub max_entries: usize,
    pub ttl: Duration,
}

impl Default for PostCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    raw: Arc<str>,
    inserted_at: Timestamp,
    last_used: u64,
}

/// LRU map from resolved file path to raw file text, with TTL expiry.
///
/// Whichever of the two policies triggers first evicts the entry. The cache
/// holds no lock of its own; [`super::PostStore`] wraps it in a mutex.
#[derive(Debug)]
pub struct ContentCache {
    config: PostCacheConfig,
    entries: HashMap<PathBuf, Entry>,
    tick: u64,
}

impl ContentCache {
    pub fn new(config: PostCacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            tick: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch a live entry and mark it most recently used.
    pub fn get(&mut self, path: &Path, now: Timestamp) -> Option<Arc<str>> {
        let ttl = self.config.ttl;
        let expired = match self.entries.get(path) {
            None => return None,
            Some(entry) => now - entry.inserted_at >= ttl,
        };
        if expired {
            self.entries.remove(path);
            return None;
        }

        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(path).map(|entry| {
            entry.last_used = tick;
            Arc::clone(&entry.raw)
        })
    }

    /// Insert or refresh an entry, evicting expired entries first and then
    /// the least recently used one if still at capacity.
    pub fn insert(&mut self, path: PathBuf, raw: Arc<str>, now: Timestamp) {
        if self.config.max_entries == 0 {
            return;
        }

        let ttl = self.config.ttl;
        self.entries.retain(|_, e| now - e.inserted_at < ttl);

        if !self.entries.contains_key(&path) && self.entries.len() >= self.config.max_entries {
            if let Some(victim) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            {
                self.entries.remove(&victim);
            }
        }

        self.tick += 1;
        self.entries.insert(
            path,
            Entry {
                raw,
                inserted_at: now,
                last_used: self.tick,
            },
        );
    }
}

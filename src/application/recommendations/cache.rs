//! Short-lived cache of generated recommendations.
//!
//! Keys hash the scope, the prompt kind and the full prompt text, so any
//! change in the underlying statistics produces a new key.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use super::prompt::Prompt;

/// Entry cap; the oldest entries are evicted beyond it.
pub const MAX_ENTRIES: usize = 1024;

pub struct RecommendationCache {
    entries: DashMap<String, (Instant, Vec<String>)>,
    ttl: Duration,
}

impl RecommendationCache {
    /// A zero TTL disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn key(scope: &str, prompt: &Prompt) -> String {
        let mut hasher = Sha256::new();
        hasher.update(scope.as_bytes());
        hasher.update([0]);
        hasher.update(prompt.kind.as_str().as_bytes());
        hasher.update([0]);
        hasher.update(prompt.system.as_bytes());
        hasher.update([0]);
        hasher.update(prompt.user.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        if !self.is_enabled() {
            return None;
        }
        if let Some(entry) = self.entries.get(key) {
            let (stored_at, items) = entry.value();
            if stored_at.elapsed() < self.ttl {
                return Some(items.clone());
            }
        }
        let ttl = self.ttl;
        self.entries
            .remove_if(key, |_, (stored_at, _)| stored_at.elapsed() >= ttl);
        None
    }

    /// Expired entries are purged on every insert.
    pub fn insert(&self, key: String, items: Vec<String>) {
        if !self.is_enabled() {
            return;
        }
        self.purge();
        self.entries.insert(key, (Instant::now(), items));
        self.evict_oldest();
    }

    fn evict_oldest(&self) {
        let excess = self.entries.len().saturating_sub(MAX_ENTRIES);
        if excess == 0 {
            return;
        }
        let mut by_age: Vec<(Instant, String)> = self
            .entries
            .iter()
            .map(|e| (e.value().0, e.key().clone()))
            .collect();
        by_age.sort_by_key(|(stored_at, _)| *stored_at);
        for (_, key) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
    }

    /// Drop expired entries.
    pub fn purge(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

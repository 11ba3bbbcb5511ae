use crate::planning::types::QueryDecomposition;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache key for a query and its workspace context. Case and runs of
/// whitespace in the query do not matter.
pub fn cache_key(query: &str, context: &serde_json::Value) -> String {
    let normalized = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    format!("{}|{}", normalized, context)
}

#[derive(Debug, Clone)]
struct CacheEntry {
    decomposition: QueryDecomposition,
    created_at: Instant,
    access_count: u64,
    last_access: Instant,
    /// Monotonic counter breaking `last_access` ties
    access_seq: u64,
}

/// Memoized decompositions with TTL expiry and least-recently-used eviction
#[derive(Debug)]
pub struct DecompositionCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    capacity: usize,
    next_seq: u64,
}

impl DecompositionCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity: capacity.max(1),
            next_seq: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.created_at) >= self.ttl
    }

    pub fn get(&mut self, key: &str) -> Option<QueryDecomposition> {
        self.get_at(key, Instant::now())
    }

    /// Looks up `key` as of `now`. Expired entries are removed and miss.
    pub fn get_at(&mut self, key: &str, now: Instant) -> Option<QueryDecomposition> {
        let expired = self.entries.get(key).map(|e| self.is_expired(e, now))?;
        if expired {
            debug!(key, "cache entry expired");
            self.entries.remove(key);
            return None;
        }

        let seq = self.tick();
        let entry = self.entries.get_mut(key)?;
        entry.access_count += 1;
        entry.last_access = now;
        entry.access_seq = seq;
        Some(entry.decomposition.clone())
    }

    pub fn set(&mut self, key: String, decomposition: QueryDecomposition) {
        self.set_at(key, decomposition, Instant::now());
    }

    pub fn set_at(&mut self, key: String, decomposition: QueryDecomposition, now: Instant) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        let seq = self.tick();
        self.entries.insert(
            key,
            CacheEntry {
                decomposition,
                created_at: now,
                access_count: 0,
                last_access: now,
                access_seq: seq,
            },
        );
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| (e.last_access, e.access_seq))
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            debug!(key = %key, "evicting least recently used decomposition");
            self.entries.remove(&key);
        }
    }

    /// Access count of a live entry, without touching it
    pub fn access_count(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|e| e.access_count)
    }

    /// Finds a live decomposition by id without updating access bookkeeping
    pub fn find_by_id(&self, id: &str) -> Option<&QueryDecomposition> {
        self.find_by_id_at(id, Instant::now())
    }

    pub fn find_by_id_at(&self, id: &str, now: Instant) -> Option<&QueryDecomposition> {
        self.entries
            .values()
            .find(|e| e.decomposition.id == id && !self.is_expired(e, now))
            .map(|e| &e.decomposition)
    }

    /// Drops expired entries, returning how many were removed
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.created_at) < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests;

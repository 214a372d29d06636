//! Story Cache - staleness policy for verified story snapshots
//!
//! Holds the last fetched `(chunks, metadata)` pair per story together with
//! its integrity report, so the frontend can skip refetching until the
//! snapshot goes stale. Sealed stories that verified clean can never change
//! on-chain and get the long TTL; everything else gets the short one.
//!
//! Uses a BTreeMap keyed by expiry time, allowing O(k) cleanup of expired
//! snapshots and cheapest-first eviction when over capacity.

use crate::config::CoreConfig;
use crate::integrity::{verify, IntegrityReport};
use crate::story::{StoryChunk, StoryMetadata};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// A verified story as last seen on-chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySnapshot {
    pub chunks: Vec<StoryChunk>,
    pub metadata: StoryMetadata,
    pub report: IntegrityReport,
    pub verified_at: u64,
    pub expires_at: u64,
}

impl StorySnapshot {
    fn size_bytes(&self) -> u64 {
        self.report.computed_length
    }
}

/// Statistics for the story cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub item_count: u32,
    pub total_size_bytes: u64,
    pub eviction_count: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub cleanup_count: u64,
}

/// Time-based cache of verified stories with O(k) cleanup
pub struct StoryCache {
    // Primary storage: story key -> snapshot
    entries: HashMap<String, StorySnapshot>,

    // Expiry index: expires_at -> story keys
    expiry_index: BTreeMap<u64, Vec<String>>,

    // Size and TTLs
    total_size: u64,
    max_size: u64,
    sealed_ttl_ms: u64,
    unsealed_ttl_ms: u64,

    // Statistics
    hit_count: u64,
    miss_count: u64,
    eviction_count: u64,
    cleanup_count: u64,
}

impl StoryCache {
    pub fn new(max_size_bytes: u64, sealed_ttl_ms: u64, unsealed_ttl_ms: u64) -> StoryCache {
        StoryCache {
            entries: HashMap::new(),
            expiry_index: BTreeMap::new(),
            total_size: 0,
            max_size: max_size_bytes,
            sealed_ttl_ms,
            unsealed_ttl_ms,
            hit_count: 0,
            miss_count: 0,
            eviction_count: 0,
            cleanup_count: 0,
        }
    }

    pub fn from_config(config: &CoreConfig) -> StoryCache {
        StoryCache::new(
            config.cache_max_bytes,
            config.sealed_ttl_ms,
            config.unsealed_ttl_ms,
        )
    }

    /// TTL for a snapshot: long only for a sealed story that verified clean.
    fn ttl_for(&self, metadata: &StoryMetadata, report: &IntegrityReport) -> u64 {
        if metadata.is_sealed && report.is_clean() {
            self.sealed_ttl_ms
        } else {
            self.unsealed_ttl_ms
        }
    }

    /// Verify a freshly fetched story and cache the snapshot.
    ///
    /// Always returns the report; a story larger than the whole cache is
    /// verified but not stored.
    pub fn put(
        &mut self,
        key: &str,
        chunks: Vec<StoryChunk>,
        metadata: StoryMetadata,
        now_millis: u64,
    ) -> IntegrityReport {
        let _ = self.cleanup_expired(now_millis);
        self.remove_entry(key);

        let report = verify(&chunks, &metadata);
        let expires_at = now_millis.saturating_add(self.ttl_for(&metadata, &report));
        let snapshot = StorySnapshot {
            chunks,
            metadata,
            report: report.clone(),
            verified_at: now_millis,
            expires_at,
        };

        let size = snapshot.size_bytes();
        if size > self.max_size {
            debug!(key, size, max = self.max_size, "story too large to cache");
            return report;
        }

        self.evict_for(size);

        self.total_size += size;
        self.expiry_index
            .entry(expires_at)
            .or_insert_with(Vec::new)
            .push(key.to_string());
        self.entries.insert(key.to_string(), snapshot);

        report
    }

    /// Fresh snapshot for a story, or `None` if absent or stale.
    pub fn get(&mut self, key: &str, now_millis: u64) -> Option<&StorySnapshot> {
        let expired = match self.entries.get(key) {
            Some(snapshot) => snapshot.expires_at <= now_millis,
            None => {
                self.miss_count += 1;
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.eviction_count += 1;
            self.miss_count += 1;
            debug!(key, "story snapshot stale");
            return None;
        }

        self.hit_count += 1;
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop a story's snapshot, e.g. after this client wrote to it.
    pub fn invalidate(&mut self, key: &str) -> bool {
        if self.remove_entry(key).is_some() {
            self.eviction_count += 1;
            true
        } else {
            false
        }
    }

    /// Clean up expired snapshots
    /// O(k) where k = number of expired snapshots
    pub fn cleanup_expired(&mut self, now_millis: u64) -> u32 {
        let mut cleaned = 0;

        let expired_times: Vec<u64> = self
            .expiry_index
            .range(..=now_millis)
            .map(|(&t, _)| t)
            .collect();

        for time in expired_times {
            if let Some(keys) = self.expiry_index.remove(&time) {
                for key in keys {
                    if let Some(snapshot) = self.entries.remove(&key) {
                        self.total_size -= snapshot.size_bytes();
                        self.eviction_count += 1;
                        cleaned += 1;
                    }
                }
            }
        }

        if cleaned > 0 {
            info!(cleaned, "expired story snapshots removed");
        }
        self.cleanup_count += cleaned as u64;
        cleaned
    }

    /// Evict soonest-expiring snapshots until `required_bytes` fit
    fn evict_for(&mut self, required_bytes: u64) -> u32 {
        let mut evicted = 0;

        while self.total_size + required_bytes > self.max_size && !self.entries.is_empty() {
            let Some(mut bucket) = self.expiry_index.first_entry() else {
                break;
            };
            // Oldest insert first within a shared expiry time
            let key = if bucket.get().is_empty() {
                None
            } else {
                Some(bucket.get_mut().remove(0))
            };
            if bucket.get().is_empty() {
                bucket.remove();
            }

            if let Some(snapshot) = key.and_then(|key| self.entries.remove(&key)) {
                self.total_size -= snapshot.size_bytes();
                self.eviction_count += 1;
                evicted += 1;
            }
        }

        evicted
    }

    /// Remove a snapshot and its expiry index entry.
    fn remove_entry(&mut self, key: &str) -> Option<StorySnapshot> {
        let snapshot = self.entries.remove(key)?;
        self.total_size -= snapshot.size_bytes();

        if let Some(keys) = self.expiry_index.get_mut(&snapshot.expires_at) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                self.expiry_index.remove(&snapshot.expires_at);
            }
        }

        Some(snapshot)
    }

    pub fn get_stats(&self) -> CacheStats {
        CacheStats {
            item_count: self.entries.len() as u32,
            total_size_bytes: self.total_size,
            eviction_count: self.eviction_count,
            hit_count: self.hit_count,
            miss_count: self.miss_count,
            cleanup_count: self.cleanup_count,
        }
    }

    pub fn get_total_size(&self) -> u64 {
        self.total_size
    }

    pub fn get_item_count(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.expiry_index.clear();
        self.total_size = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEALED_TTL: u64 = 10_000;
    const UNSEALED_TTL: u64 = 1_000;

    fn story(text: &str, n: u32, sealed: bool) -> (Vec<StoryChunk>, StoryMetadata) {
        let chunks: Vec<StoryChunk> = (0..n).map(|i| StoryChunk::new(i, text)).collect();
        let metadata = StoryMetadata::from_chunks(&chunks, sealed, 0);
        (chunks, metadata)
    }

    #[test]
    fn test_sealed_story_gets_long_ttl() {
        let mut cache = StoryCache::new(10_000, SEALED_TTL, UNSEALED_TTL);

        let (chunks, metadata) = story("sealed", 2, true);
        let report = cache.put("token-1", chunks, metadata, 0);
        assert!(report.is_clean());

        let (chunks, metadata) = story("draft", 2, false);
        cache.put("token-2", chunks, metadata, 0);

        assert!(cache.get("token-1", 5_000).is_some());
        assert!(cache.get("token-2", 5_000).is_none());
    }

    #[test]
    fn test_sealed_but_incomplete_gets_short_ttl() {
        let mut cache = StoryCache::new(10_000, SEALED_TTL, UNSEALED_TTL);
        let (chunks, metadata) = story("part", 3, true);

        let report = cache.put("token-1", chunks[..2].to_vec(), metadata, 0);
        assert_eq!(report.missing_indices, vec![2]);

        let snapshot = cache.get("token-1", 0).unwrap();
        assert_eq!(snapshot.expires_at, UNSEALED_TTL);
    }

    #[test]
    fn test_cleanup_expired() {
        let mut cache = StoryCache::new(10_000, SEALED_TTL, UNSEALED_TTL);
        let (chunks, metadata) = story("old", 1, false);
        cache.put("old", chunks, metadata, 0);

        let cleaned = cache.cleanup_expired(UNSEALED_TTL + 1);
        assert_eq!(cleaned, 1);
        assert!(!cache.contains("old"));
        assert_eq!(cache.get_total_size(), 0);
        assert_eq!(cache.get_stats().cleanup_count, 1);
    }

    #[test]
    fn test_eviction_keeps_under_capacity() {
        let mut cache = StoryCache::new(100, SEALED_TTL, UNSEALED_TTL);

        for i in 0..10 {
            let (chunks, metadata) = story("0123456789", 3, false);
            cache.put(&format!("token-{}", i), chunks, metadata, i);
        }

        assert!(cache.get_total_size() <= 100);
        assert!(cache.get_item_count() < 10);
        // Newest survives, oldest was evicted first
        assert!(cache.contains("token-9"));
        assert!(!cache.contains("token-0"));
    }

    #[test]
    fn test_eviction_within_one_expiry_time_stops_when_it_fits() {
        let mut cache = StoryCache::new(100, SEALED_TTL, UNSEALED_TTL);

        // Same millisecond, so all four share one expiry bucket
        for i in 0..4 {
            let (chunks, metadata) = story("0123456789", 3, false);
            cache.put(&format!("token-{}", i), chunks, metadata, 0);
        }

        assert_eq!(cache.get_item_count(), 3);
        assert_eq!(cache.get_total_size(), 90);
        assert_eq!(cache.get_stats().eviction_count, 1);
        assert!(!cache.contains("token-0"));
        for key in ["token-1", "token-2", "token-3"] {
            assert!(cache.contains(key));
        }

        // Survivors are still indexed and expire on schedule
        assert_eq!(cache.cleanup_expired(UNSEALED_TTL), 3);
        assert_eq!(cache.get_total_size(), 0);
    }

    #[test]
    fn test_sealed_but_tampered_gets_short_ttl() {
        let mut cache = StoryCache::new(10_000, SEALED_TTL, UNSEALED_TTL);
        let (chunks, mut metadata) = story("sealed", 2, true);
        metadata.full_story_hash = crate::hash::hash_chunk_content("forged");

        let report = cache.put("token-1", chunks, metadata, 0);
        assert!(!report.is_clean());
        assert_eq!(cache.get("token-1", 0).unwrap().expires_at, UNSEALED_TTL);
    }

    #[test]
    fn test_put_replaces_and_invalidate() {
        let mut cache = StoryCache::new(10_000, SEALED_TTL, UNSEALED_TTL);

        let (chunks, metadata) = story("v1", 1, false);
        cache.put("token-1", chunks, metadata, 0);
        let (chunks, metadata) = story("version2", 1, false);
        cache.put("token-1", chunks, metadata, 10);

        assert_eq!(cache.get_item_count(), 1);
        assert_eq!(cache.get_total_size(), 8);

        assert!(cache.invalidate("token-1"));
        assert!(!cache.invalidate("token-1"));
        assert_eq!(cache.get_total_size(), 0);
    }

    #[test]
    fn test_oversized_story_not_stored() {
        let mut cache = StoryCache::new(5, SEALED_TTL, UNSEALED_TTL);
        let (chunks, metadata) = story("too long", 1, true);

        let report = cache.put("big", chunks, metadata, 0);
        assert!(report.is_clean());
        assert!(!cache.contains("big"));
    }

    #[test]
    fn test_stats() {
        let mut cache = StoryCache::from_config(&CoreConfig::default());
        let (chunks, metadata) = story("x", 1, true);
        cache.put("a", chunks, metadata, 0);

        assert!(cache.get("a", 1).is_some());
        assert!(cache.get("b", 1).is_none());

        let stats = cache.get_stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.item_count, 1);
    }
}

// src/registry/cache.rs

//! TTL cache for registry metadata
//!
//! Shared across jobs and keyed by lowercase package name, so a race
//! between two jobs researching the same package means at worst a
//! duplicate upstream fetch. A hit is only served if the stored entry
//! still has the expected shape (a non-empty latest version); a
//! malformed entry is evicted and treated as a miss.

use crate::registry::PackageMetadata;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Cache entry with its creation time
#[derive(Debug, Clone)]
struct CacheEntry {
    metadata: PackageMetadata,
    created_at: Instant,
    hit_count: u64,
}

/// Metadata cache with a fixed time-to-live
pub struct MetadataCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl MetadataCache {
    /// Create a new cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up metadata by lowercase package name
    ///
    /// Expired and malformed entries are evicted and reported as a miss.
    pub async fn get(&self, name: &str) -> Option<PackageMetadata> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(name) {
            Some(entry) => {
                if entry.created_at.elapsed() >= self.ttl
                    || entry.metadata.latest_version.is_empty()
                {
                    entries.remove(name);
                    return None;
                }
                entry.hit_count += 1;
                Some(entry.metadata.clone())
            }
            None => None,
        }
    }

    /// Store metadata under its lowercase name
    pub async fn insert(&self, name: &str, metadata: PackageMetadata) {
        let mut entries = self.entries.write().await;
        entries.insert(
            name.to_string(),
            CacheEntry {
                metadata,
                created_at: Instant::now(),
                hit_count: 0,
            },
        );
    }

    /// Remove an entry
    pub async fn invalidate(&self, name: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(name);
    }

    /// Number of entries, including expired ones pending cleanup
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check whether the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Remove expired entries, returning how many were dropped
    pub async fn cleanup(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        before - entries.len()
    }

    /// Cache statistics
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;

        let mut total_hits = 0u64;
        let mut active_entries = 0usize;

        for entry in entries.values() {
            total_hits += entry.hit_count;
            if entry.created_at.elapsed() < self.ttl {
                active_entries += 1;
            }
        }

        CacheStats {
            total_entries: entries.len(),
            active_entries,
            total_hits,
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

/// Statistics for the metadata cache
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    /// Total number of entries (including expired)
    pub total_entries: usize,
    /// Number of active (non-expired) entries
    pub active_entries: usize,
    /// Total number of cache hits
    pub total_hits: u64,
    /// TTL in seconds
    pub ttl_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(name: &str, latest: &str) -> PackageMetadata {
        PackageMetadata {
            name: name.to_string(),
            latest_version: latest.to_string(),
            versions: vec![latest.to_string()],
            author: None,
            license: None,
        }
    }

    #[tokio::test]
    async fn test_cache_basic() {
        let cache = MetadataCache::new(Duration::from_secs(60));

        assert!(cache.get("numpy").await.is_none());

        cache.insert("numpy", metadata("numpy", "1.24.3")).await;
        let hit = cache.get("numpy").await.unwrap();
        assert_eq!(hit.latest_version, "1.24.3");

        assert!(cache.get("pandas").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_expiry() {
        let cache = MetadataCache::new(Duration::from_millis(50));

        cache.insert("numpy", metadata("numpy", "1.24.3")).await;
        assert!(cache.get("numpy").await.is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.get("numpy").await.is_none());
        // Expired entry was evicted on read
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_malformed_entry_evicted() {
        let cache = MetadataCache::new(Duration::from_secs(60));

        cache.insert("broken", metadata("broken", "")).await;
        assert_eq!(cache.len().await, 1);

        // Empty latest version fails the shape check
        assert!(cache.get("broken").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_cache_hit_count() {
        let cache = MetadataCache::new(Duration::from_secs(60));

        cache.insert("numpy", metadata("numpy", "1.24.3")).await;
        cache.get("numpy").await;
        cache.get("numpy").await;
        cache.get("numpy").await;

        let stats = cache.stats().await;
        assert_eq!(stats.total_hits, 3);
        assert_eq!(stats.active_entries, 1);
    }

    #[tokio::test]
    async fn test_cache_cleanup() {
        let cache = MetadataCache::new(Duration::from_millis(50));

        cache.insert("a", metadata("a", "1")).await;
        cache.insert("b", metadata("b", "1")).await;
        cache.insert("c", metadata("c", "1")).await;
        assert_eq!(cache.len().await, 3);

        tokio::time::sleep(Duration::from_millis(100)).await;

        let removed = cache.cleanup().await;
        assert_eq!(removed, 3);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = MetadataCache::new(Duration::from_secs(60));

        cache.insert("numpy", metadata("numpy", "1.24.3")).await;
        cache.invalidate("numpy").await;
        assert!(cache.get("numpy").await.is_none());
    }
}

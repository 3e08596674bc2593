//! Answer caching keyed by query text and limit
//!
//! Only fully successful answers are stored. Entries go stale after a TTL and
//! the oldest entry is evicted when the cache is full.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::config::CacheConfig;
use crate::types::{Query, Source};

/// Cached answer with its citations
#[derive(Debug, Clone)]
pub struct CachedAnswer {
    /// Generated answer
    pub answer: String,
    /// Citations returned with the answer
    pub sources: Vec<Source>,
    /// When this was cached
    pub cached_at: DateTime<Utc>,
    /// Number of cache hits
    pub hit_count: u32,
}

/// Concurrency-safe answer cache
pub struct AnswerCache {
    /// Cache entries keyed by query hash
    cache: RwLock<HashMap<String, CachedAnswer>>,
    /// Maximum cache size
    max_entries: usize,
    /// TTL for cache entries (seconds)
    ttl_seconds: u64,
}

impl AnswerCache {
    /// Create a new answer cache
    pub fn new(max_entries: usize, ttl_seconds: u64) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            max_entries,
            ttl_seconds,
        }
    }

    /// Create from configuration
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.ttl_secs)
    }

    /// Hash `(text, limit)` into a cache key
    fn key(query: &Query) -> String {
        let mut hasher = Sha256::new();
        hasher.update(query.limit.to_le_bytes());
        hasher.update(query.text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn is_stale(&self, entry: &CachedAnswer) -> bool {
        let age = Utc::now().signed_duration_since(entry.cached_at);
        age.num_milliseconds() >= (self.ttl_seconds as i64).saturating_mul(1000)
    }

    /// Get a cached answer if present and fresh
    pub fn get(&self, query: &Query) -> Option<CachedAnswer> {
        let key = Self::key(query);
        let mut cache = self.cache.write();

        let stale = match cache.get(&key) {
            Some(entry) => self.is_stale(entry),
            None => return None,
        };

        if stale {
            tracing::debug!("Cache miss (TTL expired): {}", &key[..12]);
            cache.remove(&key);
            return None;
        }

        let entry = cache.get_mut(&key)?;
        entry.hit_count += 1;
        tracing::debug!("Cache hit: {} (hits: {})", &key[..12], entry.hit_count);
        Some(entry.clone())
    }

    /// Store an answer in the cache
    pub fn put(&self, query: &Query, answer: String, sources: Vec<Source>) {
        if self.max_entries == 0 {
            return;
        }

        let key = Self::key(query);
        let entry = CachedAnswer {
            answer,
            sources,
            cached_at: Utc::now(),
            hit_count: 0,
        };

        let mut cache = self.cache.write();
        if cache.len() >= self.max_entries && !cache.contains_key(&key) {
            if let Some(oldest_key) = cache
                .iter()
                .min_by_key(|(_, v)| v.cached_at)
                .map(|(k, _)| k.clone())
            {
                cache.remove(&oldest_key);
            }
        }

        tracing::debug!("Cached answer: {}", &key[..12]);
        cache.insert(key, entry);
    }

    /// Clear the entire cache
    pub fn clear(&self) {
        self.cache.write().clear();
        tracing::info!("Answer cache cleared");
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.read();
        let total_hits: u32 = cache.values().map(|e| e.hit_count).sum();

        CacheStats {
            entries: cache.len(),
            total_hits,
            max_entries: self.max_entries,
            ttl_seconds: self.ttl_seconds,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_hits: u32,
    pub max_entries: usize,
    pub ttl_seconds: u64,
}

impl Default for AnswerCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> Vec<Source> {
        vec![Source {
            doc_id: "doc_1".to_string(),
            snippet: "Refunds within 30 days".to_string(),
            score: 0.9,
        }]
    }

    #[test]
    fn test_cache_hit() {
        let cache = AnswerCache::new(10, 3600);
        let query = Query::new("What is the refund policy?");

        cache.put(&query, "The policy states...".to_string(), sources());

        let hit = cache.get(&query).unwrap();
        assert_eq!(hit.answer, "The policy states...");
        assert_eq!(hit.hit_count, 1);
        assert_eq!(cache.stats().total_hits, 1);
    }

    #[test]
    fn test_limit_is_part_of_key() {
        let cache = AnswerCache::new(10, 3600);
        let query = Query::new("refund policy").with_limit(2);

        cache.put(&query, "answer".to_string(), sources());

        assert!(cache.get(&query.clone().with_limit(3)).is_none());
        assert!(cache.get(&query).is_some());
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = AnswerCache::new(10, 0);
        let query = Query::new("q");

        cache.put(&query, "answer".to_string(), sources());

        assert!(cache.get(&query).is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let cache = AnswerCache::new(2, 3600);
        let first = Query::new("first");
        let second = Query::new("second");
        let third = Query::new("third");

        cache.put(&first, "1".to_string(), sources());
        std::thread::sleep(std::time::Duration::from_millis(2));
        cache.put(&second, "2".to_string(), sources());
        std::thread::sleep(std::time::Duration::from_millis(2));
        cache.put(&third, "3".to_string(), sources());

        assert_eq!(cache.stats().entries, 2);
        assert!(cache.get(&first).is_none());
        assert!(cache.get(&second).is_some());
        assert!(cache.get(&third).is_some());
    }

    #[test]
    fn test_clear() {
        let cache = AnswerCache::default();
        cache.put(&Query::new("q"), "a".to_string(), sources());
        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }
}

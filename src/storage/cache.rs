//! Buffer cache for MiniSQL
//!
//! A bounded pool of pages with least-recently-used eviction and
//! cumulative hit/miss/eviction accounting. The cache owns its resident
//! pages outright; admission and eviction move pages across the
//! cache/backing-store boundary rather than sharing them.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::storage::page::{Page, PageId};

pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Cumulative cache counters
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// hits / (hits + misses), zero before any request.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

pub struct BufferCache {
    capacity: usize,
    pages: HashMap<PageId, Page>,
    /// recency order, least recently used first
    lru: Vec<PageId>,
    stats: CacheStats,
}

impl BufferCache {
    pub fn new(capacity: usize) -> Self {
        BufferCache {
            capacity: capacity.max(1),
            pages: HashMap::new(),
            lru: Vec::new(),
            stats: CacheStats::default(),
        }
    }

    /// Record a lookup. A resident page counts a hit and is promoted to
    /// most recently used; otherwise a miss is counted and the caller
    /// must load and `admit` the page.
    pub fn request(&mut self, id: PageId) -> bool {
        if self.pages.contains_key(&id) {
            self.stats.hits += 1;
            self.touch(id);
            trace!(page = id, "cache hit");
            true
        } else {
            self.stats.misses += 1;
            trace!(page = id, "cache miss");
            false
        }
    }

    pub fn contains(&self, id: PageId) -> bool {
        self.pages.contains_key(&id)
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.get(&id)
    }

    pub fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.pages.get_mut(&id)
    }

    /// Take ownership of a page. If the cache is full the
    /// least-recently-used page is evicted and returned so the caller
    /// can write it back to the backing store.
    pub fn admit(&mut self, page: Page) -> Option<Page> {
        let id = page.id();
        if self.pages.contains_key(&id) {
            self.pages.insert(id, page);
            self.touch(id);
            return None;
        }
        let evicted = if self.pages.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };
        self.pages.insert(id, page);
        self.lru.push(id);
        evicted
    }

    /// Remove a page without eviction accounting (e.g. when freed).
    pub fn remove(&mut self, id: PageId) -> Option<Page> {
        self.lru.retain(|p| *p != id);
        self.pages.remove(&id)
    }

    /// Move every resident page out of the cache.
    pub fn drain(&mut self) -> Vec<Page> {
        self.lru.clear();
        self.pages.drain().map(|(_, page)| page).collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn touch(&mut self, id: PageId) {
        self.lru.retain(|p| *p != id);
        self.lru.push(id);
    }

    fn evict_lru(&mut self) -> Option<Page> {
        if self.lru.is_empty() {
            return None;
        }
        let victim = self.lru.remove(0);
        let page = self.pages.remove(&victim);
        if let Some(p) = &page {
            self.stats.evictions += 1;
            debug!(page = victim, dirty = p.is_dirty(), "evicted page");
        }
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: PageId) -> Page {
        Page::new(id, "t")
    }

    #[test]
    fn test_hit_and_miss_accounting() {
        let mut cache = BufferCache::new(4);
        assert!(!cache.request(1));
        cache.admit(page(1));
        assert!(cache.request(1));
        assert!(cache.request(1));
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(BufferCache::new(4).stats().hit_rate(), 0.0);
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut cache = BufferCache::new(2);
        cache.admit(page(1));
        cache.admit(page(2));
        // touch 1 so 2 becomes the LRU victim
        cache.request(1);
        let evicted = cache.admit(page(3)).unwrap();
        assert_eq!(evicted.id(), 2);
        assert!(cache.contains(1));
        assert!(cache.contains(3));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_remove_skips_eviction_count() {
        let mut cache = BufferCache::new(2);
        cache.admit(page(1));
        let removed = cache.remove(1).unwrap();
        assert_eq!(removed.id(), 1);
        assert_eq!(cache.stats().evictions, 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_drain() {
        let mut cache = BufferCache::new(4);
        cache.admit(page(1));
        cache.admit(page(2));
        let mut drained = cache.drain();
        drained.sort_by_key(|p| p.id());
        assert_eq!(drained.len(), 2);
        assert!(cache.is_empty());
    }
}

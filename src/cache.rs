use std::num::NonZeroUsize;

use lru::LruCache;

use crate::reading::PhaseReading;

/// Recently computed readings keyed by query instant (Unix seconds).
pub struct ReadingCache {
    cache: LruCache<i64, PhaseReading>,
}

impl ReadingCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: LruCache::new(capacity),
        }
    }

    pub fn get_reading(&mut self, timestamp: i64) -> Option<PhaseReading> {
        self.cache.get(&timestamp).cloned()
    }

    pub fn put_reading(&mut self, reading: PhaseReading) {
        self.cache.put(reading.instant.timestamp(), reading);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

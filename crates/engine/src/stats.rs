//! Read-path counters, exposed as a read-only snapshot rather than raw
//! atomics, per §5.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct IndexReaderCounters {
    cached_stream_info: AtomicU64,
    not_cached_stream_info: AtomicU64,
    hash_collisions: AtomicU64,
}

impl IndexReaderCounters {
    pub fn record_cache_hit(&self) {
        self.cached_stream_info.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.not_cached_stream_info.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hash_collision(&self) {
        self.hash_collisions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IndexReaderStats {
        IndexReaderStats {
            cached_stream_info: self.cached_stream_info.load(Ordering::Relaxed),
            not_cached_stream_info: self.not_cached_stream_info.load(Ordering::Relaxed),
            hash_collisions: self.hash_collisions.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexReaderStats {
    pub cached_stream_info: u64,
    pub not_cached_stream_info: u64,
    pub hash_collisions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let counters = IndexReaderCounters::default();
        counters.record_cache_hit();
        counters.record_cache_hit();
        counters.record_cache_miss();
        counters.record_hash_collision();
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.cached_stream_info, 2);
        assert_eq!(snapshot.not_cached_stream_info, 1);
        assert_eq!(snapshot.hash_collisions, 1);
    }
}

//! The table index: a sorted collection of `(streamHash, version,
//! logPosition)` entries.
//!
//! The real table index is a sorted on-disk structure plus an in-memory
//! memtable for the unflushed tail; building and compacting it is out of
//! scope here. What the index reader depends on is the narrow read
//! contract in [`TableIndex`], which this crate provides an in-memory
//! implementation of for testing and for fully in-memory deployments.

use logindex_core::stream_id::{IndexEntry, StreamHash};
use parking_lot::RwLock;
use std::collections::HashMap;

pub trait TableIndex: Send + Sync {
    /// Entries for `stream_hash` with `v_low <= version <= v_high`, in
    /// ascending version order, capped at `limit` entries if given.
    fn get_range(&self, stream_hash: StreamHash, v_low: i64, v_high: i64, limit: Option<usize>) -> Vec<IndexEntry>;

    fn try_get_one_value(&self, stream_hash: StreamHash, version: i64) -> Option<i64>;

    fn try_get_latest_entry(&self, stream_hash: StreamHash) -> Option<IndexEntry>;

    fn try_get_oldest_entry(&self, stream_hash: StreamHash) -> Option<IndexEntry>;

    fn iterate_all(&self) -> Vec<IndexEntry>;
}

/// In-memory table index backed by a map from stream hash to its entries.
///
/// Each bucket is kept sorted by version at all times. For an ordinary
/// (non-colliding) stream hash, event numbers are assigned monotonically by
/// the commit pipeline, so inserts always land at the tail — an O(1)
/// amortized push. A hash collision between two streams can interleave two
/// independent version sequences into the same bucket (both streams start
/// their own numbering at 0), so `insert` locates the correct sorted
/// position via binary search rather than assuming append order.
#[derive(Default)]
pub struct InMemoryTableIndex {
    entries: RwLock<HashMap<StreamHash, Vec<IndexEntry>>>,
}

impl InMemoryTableIndex {
    pub fn new() -> Self {
        InMemoryTableIndex {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert an entry, keeping its bucket sorted by version. Ties (two
    /// colliding streams sharing a version number) preserve insertion
    /// order.
    pub fn insert(&self, entry: IndexEntry) {
        let mut map = self.entries.write();
        let bucket = map.entry(entry.stream_hash).or_insert_with(Vec::new);
        let position = bucket.partition_point(|e| e.version <= entry.version);
        bucket.insert(position, entry);
    }
}

impl TableIndex for InMemoryTableIndex {
    fn get_range(&self, stream_hash: StreamHash, v_low: i64, v_high: i64, limit: Option<usize>) -> Vec<IndexEntry> {
        let map = self.entries.read();
        let Some(bucket) = map.get(&stream_hash) else {
            return Vec::new();
        };
        let start = bucket.partition_point(|e| e.version < v_low);
        let mut result = Vec::new();
        for entry in &bucket[start..] {
            if entry.version > v_high {
                break;
            }
            result.push(*entry);
            if let Some(limit) = limit {
                if result.len() >= limit {
                    break;
                }
            }
        }
        result
    }

    fn try_get_one_value(&self, stream_hash: StreamHash, version: i64) -> Option<i64> {
        let map = self.entries.read();
        let bucket = map.get(&stream_hash)?;
        let idx = bucket.partition_point(|e| e.version < version);
        bucket.get(idx).filter(|e| e.version == version).map(|e| e.log_position)
    }

    fn try_get_latest_entry(&self, stream_hash: StreamHash) -> Option<IndexEntry> {
        let map = self.entries.read();
        map.get(&stream_hash).and_then(|bucket| bucket.last().copied())
    }

    fn try_get_oldest_entry(&self, stream_hash: StreamHash) -> Option<IndexEntry> {
        let map = self.entries.read();
        map.get(&stream_hash).and_then(|bucket| bucket.first().copied())
    }

    fn iterate_all(&self) -> Vec<IndexEntry> {
        let map = self.entries.read();
        map.values().flatten().copied().collect()
    }
}

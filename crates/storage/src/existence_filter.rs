//! Stream-existence filter: a membership test answering "definitely
//! absent" or "possibly present", with a persisted checkpoint tracking how
//! far into the log it has been populated.
//!
//! The real filter is a probabilistic bloom/bucket structure; its internal
//! layout is explicitly out of scope here (§1). What matters to the index
//! reader is the interface: `might_contain`, `add`, and a checkpoint. This
//! in-memory implementation is exact (no false positives) rather than
//! probabilistic, which only ever makes its answers *more* precise than
//! the real filter's, so reader code written against `might_contain`
//! behaves identically either way.

use logindex_durability::checkpoint::InMemoryCheckpoint;
use logindex_durability::Checkpoint;
use parking_lot::RwLock;
use std::collections::HashSet;

pub trait StreamExistenceFilter: Send + Sync {
    fn might_contain(&self, key: &[u8]) -> bool;
    fn add(&self, key: &[u8]);
    fn checkpoint(&self) -> &dyn Checkpoint;
}

pub struct InMemoryExistenceFilter {
    keys: RwLock<HashSet<Vec<u8>>>,
    checkpoint: InMemoryCheckpoint,
}

impl InMemoryExistenceFilter {
    pub fn new() -> Self {
        InMemoryExistenceFilter {
            keys: RwLock::new(HashSet::new()),
            checkpoint: InMemoryCheckpoint::new(-1),
        }
    }

    pub fn advance_checkpoint(&self, position: i64) {
        self.checkpoint.write(position);
    }
}

impl Default for InMemoryExistenceFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamExistenceFilter for InMemoryExistenceFilter {
    fn might_contain(&self, key: &[u8]) -> bool {
        self.keys.read().contains(key)
    }

    fn add(&self, key: &[u8]) {
        self.keys.write().insert(key.to_vec());
    }

    fn checkpoint(&self) -> &dyn Checkpoint {
        &self.checkpoint
    }
}

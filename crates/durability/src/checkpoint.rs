//! Checkpoint handles: a monotonic log-position marker, persisted
//! separately from the data it tracks.

use std::sync::atomic::{AtomicI64, Ordering};

pub trait Checkpoint: Send + Sync {
    fn read(&self) -> i64;
}

/// A checkpoint backed by an in-process atomic rather than a file.
/// `write` is not part of the [`Checkpoint`] trait because the reader
/// only ever reads checkpoints; whatever owns the write pipeline updates
/// them directly.
pub struct InMemoryCheckpoint {
    position: AtomicI64,
}

impl InMemoryCheckpoint {
    pub fn new(initial: i64) -> Self {
        InMemoryCheckpoint {
            position: AtomicI64::new(initial),
        }
    }

    pub fn write(&self, position: i64) {
        self.position.store(position, Ordering::SeqCst);
    }
}

impl Checkpoint for InMemoryCheckpoint {
    fn read(&self) -> i64 {
        self.position.load(Ordering::SeqCst)
    }
}

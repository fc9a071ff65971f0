//! Bounded pool of leased readers over a [`TransactionLog`].
//!
//! `borrow` blocks the caller until a lease is available; the returned
//! [`ReaderLease`] releases its slot back to the pool on drop, on every
//! exit path including early returns and panics during unwind — the scoped
//! acquisition pattern the reader algorithms are written against.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

use crate::log::{ReadResult, TransactionLog};

struct PoolState {
    available: usize,
}

/// A pool of at most `max_reader_count` concurrent leases over a shared
/// log. `initial_reader_count` only matters for a pool backed by real file
/// handles (pre-warming); against the in-memory log it has no effect
/// beyond documenting intent.
pub struct TfReaderPool {
    log: Arc<dyn TransactionLog>,
    max_reader_count: usize,
    state: Mutex<PoolState>,
    available_cond: Condvar,
}

impl TfReaderPool {
    pub fn new(log: Arc<dyn TransactionLog>, initial_reader_count: usize, max_reader_count: usize) -> Self {
        let _ = initial_reader_count;
        TfReaderPool {
            log,
            max_reader_count,
            state: Mutex::new(PoolState {
                available: max_reader_count,
            }),
            available_cond: Condvar::new(),
        }
    }

    pub fn max_reader_count(&self) -> usize {
        self.max_reader_count
    }

    /// Block until a lease is available, then hand it out. The lease's
    /// `Drop` impl releases the slot unconditionally.
    pub fn borrow(self: &Arc<Self>) -> ReaderLease {
        let mut state = self.state.lock();
        while state.available == 0 {
            self.available_cond.wait(&mut state);
        }
        state.available -= 1;
        ReaderLease {
            pool: Arc::clone(self),
        }
    }

    fn release(&self) {
        let mut state = self.state.lock();
        state.available += 1;
        self.available_cond.notify_one();
    }
}

/// A scoped lease over the pool's shared log. Dropping it returns the
/// slot; there is no explicit `release` method, so a lease can't be
/// leaked by forgetting to call one.
pub struct ReaderLease {
    pool: Arc<TfReaderPool>,
}

impl ReaderLease {
    pub fn try_read_at(&self, position: i64) -> Option<ReadResult> {
        self.pool.log.try_read_at(position)
    }

    pub fn try_read_next(&self, position: i64) -> Option<ReadResult> {
        self.pool.log.try_read_next(position)
    }
}

impl Drop for ReaderLease {
    fn drop(&mut self) {
        self.pool.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::InMemoryTransactionLog;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[test]
    fn borrow_releases_slot_on_drop() {
        let log = Arc::new(InMemoryTransactionLog::new());
        let pool = Arc::new(TfReaderPool::new(log, 1, 2));
        {
            let _l1 = pool.borrow();
            let _l2 = pool.borrow();
            assert_eq!(pool.state.lock().available, 0);
        }
        assert_eq!(pool.state.lock().available, 2);
    }

    #[test]
    fn borrow_blocks_until_a_slot_frees_up() {
        let log = Arc::new(InMemoryTransactionLog::new());
        let pool = Arc::new(TfReaderPool::new(log, 1, 1));
        let first = pool.borrow();
        let pool2 = Arc::clone(&pool);
        let acquired = Arc::new(AtomicUsize::new(0));
        let acquired2 = Arc::clone(&acquired);
        let barrier = Arc::new(Barrier::new(2));
        let barrier2 = Arc::clone(&barrier);
        let handle = std::thread::spawn(move || {
            barrier2.wait();
            let _lease = pool2.borrow();
            acquired2.store(1, Ordering::SeqCst);
        });
        barrier.wait();
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(acquired.load(Ordering::SeqCst), 0);
        drop(first);
        handle.join().unwrap();
        assert_eq!(acquired.load(Ordering::SeqCst), 1);
    }
}

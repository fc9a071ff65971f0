//! The narrow transaction-log interface the index reader depends on.
//!
//! This crate does not implement a production log (durability/crash
//! recovery of the log itself is explicitly out of scope); it defines the
//! trait the reader is written against, plus an in-memory implementation
//! used by tests and by callers running entirely in memory
//! (`IndexReaderConfig::in_memory`).

use logindex_core::record::{CommitRecord, PrepareRecord};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::record_codec::{self, LogFrame};

#[derive(Debug, Clone)]
pub enum LogRecord {
    Prepare(PrepareRecord),
    Commit(CommitRecord),
}

pub struct ReadResult {
    pub record: LogRecord,
    pub post_position: i64,
}

/// The log abstraction a [`crate::reader_pool::ReaderLease`] reads through.
pub trait TransactionLog: Send + Sync {
    fn try_read_at(&self, position: i64) -> Option<ReadResult>;
    fn try_read_next(&self, position: i64) -> Option<ReadResult>;
}

/// An append-only in-memory log, keyed by log position. Positions are
/// assigned by [`InMemoryTransactionLog::append_prepare`] /
/// `append_commit` and are monotonically increasing, matching the real
/// log's "log position is a byte offset" contract closely enough for
/// testing the reader's algorithms without touching disk.
#[derive(Default)]
pub struct InMemoryTransactionLog {
    records: RwLock<BTreeMap<i64, Vec<u8>>>,
    next_position: RwLock<i64>,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        InMemoryTransactionLog {
            records: RwLock::new(BTreeMap::new()),
            next_position: RwLock::new(0),
        }
    }

    pub fn append_prepare(&self, mut record: PrepareRecord) -> i64 {
        let position = self.reserve_position();
        record.log_position = position;
        record.transaction_position = position;
        let bytes = record_codec::encode_prepare(position, &record);
        self.records.write().insert(position, bytes);
        position
    }

    pub fn append_commit(&self, transaction_position: i64, first_event_number: i64) -> i64 {
        let position = self.reserve_position();
        let record = CommitRecord {
            log_position: position,
            transaction_position,
            first_event_number,
        };
        let bytes = record_codec::encode_commit(position, &record);
        self.records.write().insert(position, bytes);
        position
    }

    fn reserve_position(&self) -> i64 {
        let mut next = self.next_position.write();
        let position = *next;
        *next += 1;
        position
    }

    fn decode_and_fill_position(&self, position: i64, bytes: &[u8]) -> Option<ReadResult> {
        let decoded = record_codec::decode_at(position, bytes).ok()?;
        let record = match decoded.record {
            LogFrame::Prepare(mut p) => {
                p.log_position = position;
                LogRecord::Prepare(p)
            }
            LogFrame::Commit(mut c) => {
                c.log_position = position;
                LogRecord::Commit(c)
            }
        };
        Some(ReadResult {
            record,
            post_position: position + 1,
        })
    }
}

impl TransactionLog for InMemoryTransactionLog {
    fn try_read_at(&self, position: i64) -> Option<ReadResult> {
        let records = self.records.read();
        let bytes = records.get(&position)?;
        self.decode_and_fill_position(position, bytes)
    }

    fn try_read_next(&self, position: i64) -> Option<ReadResult> {
        let records = self.records.read();
        let (&found_position, bytes) = records.range(position..).next()?;
        self.decode_and_fill_position(found_position, bytes)
    }
}

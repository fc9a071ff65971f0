//! Error taxonomy for the index read path.
//!
//! Two kinds of failure are distinguished throughout this workspace:
//!
//! - [`ArgumentError`]: the caller passed something invalid (a negative
//!   count, an empty stream name). These abort the call immediately.
//! - [`IntegrityError`]: the on-disk data is internally inconsistent (a
//!   commit points at a log position that isn't a prepare, a checksum
//!   fails). These are fatal and propagate rather than being swallowed,
//!   since continuing to read past them risks returning wrong answers.
//!
//! Ordinary "nothing here" outcomes (no such stream, stream deleted, event
//! number out of range) are not errors at all — they are encoded as enum
//! values in the result types returned by `logindex-engine`, since callers
//! need to branch on them as part of normal control flow.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("stream name must not be empty")]
    EmptyStreamName,
    #[error("event number must be >= -1, got {0}")]
    InvalidEventNumber(i64),
    #[error("count must be > 0, got {0}")]
    InvalidCount(i64),
    #[error("range start {start} must be <= range end {end}")]
    InvalidRange { start: i64, end: i64 },
}

#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("log position {0} does not point at a valid record")]
    DanglingLogPosition(i64),
    #[error("commit at position {commit_position} references prepare at {prepare_position}, which is not a prepare record")]
    CommitTargetNotPrepare {
        commit_position: i64,
        prepare_position: i64,
    },
    #[error("checksum mismatch reading record at position {0}")]
    ChecksumMismatch(i64),
    #[error("table index entry for stream hash {stream_hash:016x} version {version} has no corresponding log record")]
    OrphanedIndexEntry { stream_hash: u64, version: i64 },
}

//! Core types for the stream index read path.
//!
//! This crate defines the data model shared by the durability, storage,
//! security and engine crates: stream identifiers, log records, stream
//! metadata, system-stream naming conventions and the sentinel values used
//! throughout the index reader.
//!
//! Nothing in this crate touches disk or holds mutable state — it is the
//! vocabulary the rest of the workspace is written in.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod metadata;
pub mod names;
pub mod record;
pub mod stream_id;

pub use error::{ArgumentError, IntegrityError};
pub use metadata::{EntryAcl, StreamMetadata};
pub use record::{CommitRecord, LogRecordVersion, PrepareFlags, PrepareRecord};
pub use stream_id::{IndexEntry, NumericStreamId, StreamHash, StreamId, StringStreamId};

/// Sentinel last-event-number meaning "stream has never been written".
pub const NO_STREAM: i64 = -1;

/// Sentinel last-event-number meaning "stream was soft-deleted".
pub const DELETED_STREAM: i64 = i64::MAX;

/// Sentinel last-event-number meaning "hash-collision budget exhausted;
/// the true last event number could not be resolved".
pub const INVALID_LAST_EVENT_NUMBER: i64 = -2;

/// Event number meaning "the latest event in the stream" when passed as
/// the `from` argument of a read.
pub const LATEST_EVENT_NUMBER: i64 = -1;

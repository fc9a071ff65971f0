//! # logindex
//!
//! Stream index read path for an append-only event-streaming log: given a
//! stream name and an event number (or range), resolve it down to a log
//! position and return the matching event, honoring soft deletes and the
//! `$maxCount`/`$maxAge`/`$tb` retention settings a stream can carry.
//!
//! This crate is the read side only. Appending events, building or
//! compacting the table index, and replication are all out of scope —
//! see [`logindex_engine::IndexReader`] for the read operations this
//! crate implements.
//!
//! # Quick start
//!
//! ```
//! use logindex::{IndexReader, IndexReaderConfig};
//! use std::sync::Arc;
//!
//! let table_index = Arc::new(logindex::storage::InMemoryTableIndex::new());
//! let log = Arc::new(logindex::durability::InMemoryTransactionLog::new());
//! let reader_pool = Arc::new(logindex::durability::TfReaderPool::new(log.clone(), 1, 4));
//! let cache = Arc::new(logindex::storage::IndexBackendCache::new(Default::default()));
//! let reader = IndexReader::new(table_index, reader_pool, cache, IndexReaderConfig::default());
//!
//! // A stream that has never been written reads back as NoStream.
//! assert_eq!(reader.get_stream_last_event_number("order-1").unwrap(), logindex::NO_STREAM);
//! ```
//!
//! Internal crates (core, durability, storage, security, engine) are
//! re-exported by module below for composing a reader by hand; most
//! callers only need [`IndexReader`] and [`IndexReaderConfig`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use logindex_core as core_types;
pub use logindex_durability as durability;
pub use logindex_engine as engine;
pub use logindex_security as security;
pub use logindex_storage as storage;

pub use logindex_core::{DELETED_STREAM, INVALID_LAST_EVENT_NUMBER, LATEST_EVENT_NUMBER, NO_STREAM};
pub use logindex_engine::{
    EventRecord, IndexReadEventResult, IndexReadStreamResult, IndexReader, IndexReaderConfig, ReadEventOutcome,
};

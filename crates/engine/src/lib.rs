//! The index reader engine: stream hashing, configuration, counters and
//! the [`IndexReader`] orchestrator that ties the core, durability,
//! storage and security crates together into the read operations of
//! the index read path.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod existence_filter_initializer;
pub mod hasher;
pub mod index_reader;
pub mod stats;

pub use config::{IndexReaderConfig, IndexReaderConfigBuilder};
pub use existence_filter_initializer::{initialize_hash_keyed, initialize_name_keyed};
pub use hasher::{IdentityStreamHasher, StreamHasher, TwoHashStreamHasher};
pub use index_reader::{EventRecord, IndexReadEventResult, IndexReadStreamResult, IndexReader, ReadEventOutcome};
pub use stats::{IndexReaderCounters, IndexReaderStats};

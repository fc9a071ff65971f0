//! Storage-facing collaborators consumed by the index reader: the table
//! index, the stream-existence filter, the stream-name index (format B),
//! the versioned backend cache, and the retention-windowing algorithms
//! that sit between "what the table index returns" and "what a read
//! result contains".

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod existence_filter;
pub mod retention;
pub mod stream_name_index;
pub mod table_index;

pub use cache::{IndexBackendCache, VersionedSlot};
pub use existence_filter::{InMemoryExistenceFilter, StreamExistenceFilter};
pub use retention::{RetentionResult, UNKNOWN_NEXT_EVENT_NUMBER};
pub use stream_name_index::{InMemoryStreamNameIndex, StreamNameIndex};
pub use table_index::{InMemoryTableIndex, TableIndex};

//! Durability layer: transaction-log record framing, a scoped reader-lease
//! pool, and checkpoint handles.
//!
//! The index reader never touches a file directly — it borrows a
//! [`reader_pool::ReaderLease`], asks it to read at a position, and lets the
//! lease drop. Everything here is the "TF log" and "TF reader" half of the
//! consumed interfaces; how records actually get written is out of scope.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checkpoint;
pub mod error;
pub mod log;
pub mod reader_pool;
pub mod record_codec;

pub use checkpoint::{Checkpoint, InMemoryCheckpoint};
pub use error::WalRecordError;
pub use log::{LogRecord, ReadResult, TransactionLog};
pub use reader_pool::{ReaderLease, TfReaderPool};

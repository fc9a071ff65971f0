//! Log record shapes.
//!
//! The index reader only ever needs two record kinds off the transaction
//! log: prepares (the event payload itself) and commits (the mapping from a
//! transaction's first prepare back to the stream's event-number space).
//! Encoding/decoding to bytes lives in `logindex-durability`; this crate
//! only defines the in-memory shape.

use serde::{Deserialize, Serialize};

/// On-disk record layout generation. `V0` streams carry a legacy
/// truncate-before sentinel (`i32::MAX`) that must be remapped to
/// [`crate::DELETED_STREAM`] semantics when metadata is parsed; `V1` writes
/// the remapped sentinel directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogRecordVersion {
    V0,
    V1,
}

/// Prepare record flags. Only the bits the index reader inspects are
/// named; unknown bits are preserved on decode and ignored on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareFlags(pub u16);

impl PrepareFlags {
    pub const IS_COMMITTED: PrepareFlags = PrepareFlags(0b0000_0001);
    pub const TRANSACTION_BEGIN: PrepareFlags = PrepareFlags(0b0000_0010);
    pub const TRANSACTION_END: PrepareFlags = PrepareFlags(0b0000_0100);
    pub const STREAM_DELETE: PrepareFlags = PrepareFlags(0b0000_1000);
    pub const IS_JSON: PrepareFlags = PrepareFlags(0b0001_0000);

    pub fn contains(self, flag: PrepareFlags) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl std::ops::BitOr for PrepareFlags {
    type Output = PrepareFlags;
    fn bitor(self, rhs: PrepareFlags) -> PrepareFlags {
        PrepareFlags(self.0 | rhs.0)
    }
}

/// A single event as it was appended to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareRecord {
    pub log_position: i64,
    pub transaction_position: i64,
    pub event_number: i64,
    pub event_stream_id: String,
    pub event_type: String,
    pub timestamp_unix_millis: i64,
    pub flags: PrepareFlags,
    pub data: Vec<u8>,
    pub metadata: Vec<u8>,
    pub record_version: LogRecordVersion,
}

impl PrepareRecord {
    pub fn is_stream_delete(&self) -> bool {
        self.flags.contains(PrepareFlags::STREAM_DELETE)
    }
}

/// The commit that links a transaction's prepares into the stream's
/// event-number space. `first_event_number` is the event number assigned
/// to the transaction's first prepare; subsequent prepares in the same
/// transaction take consecutive numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub log_position: i64,
    pub transaction_position: i64,
    pub first_event_number: i64,
}

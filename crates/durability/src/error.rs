//! Decode-time failures for on-disk record framing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalRecordError {
    #[error("record at position {0} is truncated: fewer bytes on disk than its length prefix claims")]
    InsufficientData(i64),
    #[error("record at position {0} failed its checksum")]
    ChecksumMismatch(i64),
    #[error("record at position {0} has unknown tag byte {1}")]
    UnknownTag(i64, u8),
}

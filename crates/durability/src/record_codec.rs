//! On-disk framing for prepare and commit records.
//!
//! Layout, matching the teacher's WAL segment record framing:
//! `Tag(1) | Length(4, LE) | Payload(var) | Crc32(4, LE)`. The CRC covers
//! `Tag + Length + Payload`; a mismatch is recoverable by scanning forward
//! byte-by-byte for the next plausible frame, the same strategy the
//! teacher's segment reader uses on a damaged tail.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use logindex_core::record::{CommitRecord, LogRecordVersion, PrepareFlags, PrepareRecord};
use std::io::{Cursor, Read, Write};

use crate::error::WalRecordError;

const TAG_PREPARE: u8 = 0x01;
const TAG_COMMIT: u8 = 0x02;

/// A decoded frame plus the position immediately following it, so the
/// caller can reposition for the next read.
pub struct DecodedFrame<T> {
    pub record: T,
    pub next_position: i64,
}

pub fn encode_prepare(position: i64, record: &PrepareRecord) -> Vec<u8> {
    let mut payload = Vec::new();
    payload
        .write_i64::<LittleEndian>(record.transaction_position)
        .unwrap();
    payload.write_i64::<LittleEndian>(record.event_number).unwrap();
    write_string(&mut payload, &record.event_stream_id);
    write_string(&mut payload, &record.event_type);
    payload
        .write_i64::<LittleEndian>(record.timestamp_unix_millis)
        .unwrap();
    payload.write_u16::<LittleEndian>(record.flags.0).unwrap();
    payload
        .write_u8(match record.record_version {
            LogRecordVersion::V0 => 0,
            LogRecordVersion::V1 => 1,
        })
        .unwrap();
    write_bytes(&mut payload, &record.data);
    write_bytes(&mut payload, &record.metadata);
    frame(position, TAG_PREPARE, payload)
}

pub fn encode_commit(position: i64, record: &CommitRecord) -> Vec<u8> {
    let mut payload = Vec::new();
    payload
        .write_i64::<LittleEndian>(record.transaction_position)
        .unwrap();
    payload
        .write_i64::<LittleEndian>(record.first_event_number)
        .unwrap();
    frame(position, TAG_COMMIT, payload)
}

fn frame(position: i64, tag: u8, payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + 4 + payload.len() + 4);
    out.write_u8(tag).unwrap();
    out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
    out.extend_from_slice(&payload);
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&out);
    let crc = hasher.finalize();
    out.write_u32::<LittleEndian>(crc).unwrap();
    let _ = position;
    out
}

/// Decode one frame starting at `bytes[0]`. `position` is only used to
/// build diagnostic errors.
pub fn decode_at(position: i64, bytes: &[u8]) -> Result<DecodedFrame<LogFrame>, WalRecordError> {
    if bytes.len() < 5 {
        return Err(WalRecordError::InsufficientData(position));
    }
    let tag = bytes[0];
    let len = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    let total = 1 + 4 + len + 4;
    if bytes.len() < total {
        return Err(WalRecordError::InsufficientData(position));
    }
    let body = &bytes[..1 + 4 + len];
    let stored_crc = u32::from_le_bytes([
        bytes[1 + 4 + len],
        bytes[1 + 4 + len + 1],
        bytes[1 + 4 + len + 2],
        bytes[1 + 4 + len + 3],
    ]);
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(body);
    if hasher.finalize() != stored_crc {
        return Err(WalRecordError::ChecksumMismatch(position));
    }
    let payload = &bytes[5..5 + len];
    let record = match tag {
        TAG_PREPARE => LogFrame::Prepare(decode_prepare_payload(payload)?),
        TAG_COMMIT => LogFrame::Commit(decode_commit_payload(payload)?),
        other => return Err(WalRecordError::UnknownTag(position, other)),
    };
    Ok(DecodedFrame {
        record,
        next_position: position + total as i64,
    })
}

pub enum LogFrame {
    Prepare(PrepareRecord),
    Commit(CommitRecord),
}

fn decode_prepare_payload(payload: &[u8]) -> Result<PrepareRecord, WalRecordError> {
    let mut cur = Cursor::new(payload);
    let transaction_position = cur.read_i64::<LittleEndian>().map_err(|_| WalRecordError::InsufficientData(0))?;
    let event_number = cur.read_i64::<LittleEndian>().map_err(|_| WalRecordError::InsufficientData(0))?;
    let event_stream_id = read_string(&mut cur)?;
    let event_type = read_string(&mut cur)?;
    let timestamp_unix_millis = cur.read_i64::<LittleEndian>().map_err(|_| WalRecordError::InsufficientData(0))?;
    let flags_bits = cur.read_u16::<LittleEndian>().map_err(|_| WalRecordError::InsufficientData(0))?;
    let version_byte = cur.read_u8().map_err(|_| WalRecordError::InsufficientData(0))?;
    let record_version = if version_byte == 0 {
        LogRecordVersion::V0
    } else {
        LogRecordVersion::V1
    };
    let data = read_bytes(&mut cur)?;
    let metadata = read_bytes(&mut cur)?;
    Ok(PrepareRecord {
        log_position: 0,
        transaction_position,
        event_number,
        event_stream_id,
        event_type,
        timestamp_unix_millis,
        flags: PrepareFlags(flags_bits),
        data,
        metadata,
        record_version,
    })
}

fn decode_commit_payload(payload: &[u8]) -> Result<CommitRecord, WalRecordError> {
    let mut cur = Cursor::new(payload);
    let transaction_position = cur.read_i64::<LittleEndian>().map_err(|_| WalRecordError::InsufficientData(0))?;
    let first_event_number = cur.read_i64::<LittleEndian>().map_err(|_| WalRecordError::InsufficientData(0))?;
    Ok(CommitRecord {
        log_position: 0,
        transaction_position,
        first_event_number,
    })
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    write_bytes(out, s.as_bytes());
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.write_u32::<LittleEndian>(bytes.len() as u32).unwrap();
    out.extend_from_slice(bytes);
}

fn read_bytes(cur: &mut Cursor<&[u8]>) -> Result<Vec<u8>, WalRecordError> {
    let len = cur.read_u32::<LittleEndian>().map_err(|_| WalRecordError::InsufficientData(0))? as usize;
    let mut buf = vec![0u8; len];
    cur.read_exact(&mut buf).map_err(|_| WalRecordError::InsufficientData(0))?;
    Ok(buf)
}

fn read_string(cur: &mut Cursor<&[u8]>) -> Result<String, WalRecordError> {
    let bytes = read_bytes(cur)?;
    String::from_utf8(bytes).map_err(|_| WalRecordError::InsufficientData(0))
}

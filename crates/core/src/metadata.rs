//! Stream metadata: retention settings and the per-stream ACL layer.
//!
//! Metadata lives as a JSON blob in the body of an event appended to a
//! stream's metastream (`$$stream` in format A, `original_id + 1` in format
//! B). Parsing favors availability over strictness: a metadata event that
//! fails to parse is treated as empty metadata rather than propagated as an
//! error, since a read should never fail because of a malformed prior
//! write.

use serde::Deserialize;

use crate::record::LogRecordVersion;

/// The access-control fields carried on a stream's own metadata. This is
/// one of three layers combined into an effective ACL by `logindex-security`
/// — the others being system settings and hardcoded defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EntryAcl {
    #[serde(rename = "$r", default)]
    pub read_roles: Option<Vec<String>>,
    #[serde(rename = "$w", default)]
    pub write_roles: Option<Vec<String>>,
    #[serde(rename = "$d", default)]
    pub delete_roles: Option<Vec<String>>,
    #[serde(rename = "$mr", default)]
    pub metadata_read_roles: Option<Vec<String>>,
    #[serde(rename = "$mw", default)]
    pub metadata_write_roles: Option<Vec<String>>,
}

/// Parsed contents of a stream's metadata event.
///
/// `truncate_before` has already had the legacy `i32::MAX` / `$tb == -1`
/// sentinels normalized to [`crate::DELETED_STREAM`] by the time it reaches
/// this struct — see [`StreamMetadata::from_json`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamMetadata {
    #[serde(rename = "\u{24}maxCount", default)]
    pub max_count: Option<i64>,
    #[serde(rename = "\u{24}maxAge", default)]
    pub max_age_seconds: Option<i64>,
    #[serde(rename = "\u{24}tb", default)]
    pub truncate_before: Option<i64>,
    #[serde(rename = "\u{24}cacheControl", default)]
    pub cache_control_seconds: Option<i64>,
    #[serde(rename = "\u{24}acl", default)]
    pub acl: Option<EntryAcl>,
    #[serde(rename = "\u{24}tempStream", default)]
    pub temp_stream: Option<bool>,
}

impl StreamMetadata {
    /// Empty metadata: no retention limits, no ACL, not a temp stream.
    /// Returned whenever a metastream has never been written, or its
    /// latest event fails to parse as JSON.
    pub fn empty() -> Self {
        StreamMetadata::default()
    }

    /// Parse a metadata event body, applying the legacy truncate-before
    /// remap and swallowing parse failures into [`StreamMetadata::empty`].
    ///
    /// `$tb == -1` is a pre-V1 convention meaning "the stream is
    /// soft-deleted" and normalizes regardless of record version. V0 log
    /// records additionally stored `i32::MAX` in the raw field for the same
    /// meaning; that remap only applies to `record_version ==
    /// LogRecordVersion::V0`, since a V1 record's `$tb` is a real int64 and
    /// may legitimately hold `i32::MAX` without meaning "deleted".
    pub fn from_json(body: &[u8], record_version: LogRecordVersion) -> StreamMetadata {
        let mut parsed: StreamMetadata = match serde_json::from_slice(body) {
            Ok(m) => m,
            Err(_) => return StreamMetadata::empty(),
        };
        match parsed.truncate_before {
            Some(-1) => parsed.truncate_before = Some(crate::DELETED_STREAM),
            Some(v) if record_version == LogRecordVersion::V0 && v == i32::MAX as i64 => {
                parsed.truncate_before = Some(crate::DELETED_STREAM)
            }
            _ => {}
        }
        parsed
    }

    /// The effective lower bound on readable event numbers implied by this
    /// stream's own retention settings, ignoring `$maxAge` (which requires
    /// a time-ordered scan rather than a pure arithmetic bound).
    ///
    /// `min_event_number = max(0, count-derived bound, truncate_before)`.
    pub fn min_event_number_from_count_and_truncate(&self, last_event_number: i64) -> i64 {
        let mut min = 0i64;
        if let Some(max_count) = self.max_count {
            if max_count > 0 {
                let count_bound = last_event_number - max_count + 1;
                min = min.max(count_bound);
            }
        }
        if let Some(tb) = self.truncate_before {
            if tb == crate::DELETED_STREAM {
                return crate::DELETED_STREAM;
            }
            min = min.max(tb);
        }
        min.max(0)
    }
}

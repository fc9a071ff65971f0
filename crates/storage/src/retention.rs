//! Retention windowing: turning a raw `[start, end]` event-number range
//! into the bounded, collision-filtered, age-filtered slice of records a
//! read actually returns.
//!
//! This module implements §4.4's plain windowed read and §4.5's bounded
//! binary search for `$maxAge`-governed streams. Both are written against
//! the [`TableIndex`] and a prepare-fetch closure rather than a concrete
//! log type, so the same algorithm serves in-memory and on-disk logs
//! alike.

use logindex_core::record::PrepareRecord;
use logindex_core::stream_id::{IndexEntry, StreamHash};

use crate::table_index::TableIndex;

/// Sentinel used for `next_event_number` when no better estimate is
/// available (the caller should not resume from this value literally; it
/// signals "unknown, re-derive from last_event_number").
pub const UNKNOWN_NEXT_EVENT_NUMBER: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RetentionResult {
    /// Ascending by event number, regardless of read direction; the
    /// caller reverses for backward reads.
    pub events: Vec<(IndexEntry, PrepareRecord)>,
    pub next_event_number: i64,
    pub is_end_of_stream: bool,
}

/// Fetch the prepare at `position` and confirm it belongs to `stream`,
/// treating a collision (stream mismatch) as "absent". Fed by the caller
/// so this module never depends on the durability crate's lease type
/// directly.
pub trait PrepareFetcher {
    fn fetch(&self, position: i64) -> Option<PrepareRecord>;
}

impl<F: Fn(i64) -> Option<PrepareRecord>> PrepareFetcher for F {
    fn fetch(&self, position: i64) -> Option<PrepareRecord> {
        self(position)
    }
}

/// §4.4's non-`$maxAge` path: fetch `[start, end]`, drop hash-collision
/// entries, optionally dedupe by version (keeping the last-written entry,
/// for scavenge/rewrite safety), and compute the resumption cursor.
pub fn read_plain_window(
    table_index: &dyn TableIndex,
    fetch: &dyn PrepareFetcher,
    stream_hash: StreamHash,
    stream_name: &str,
    start_event_number: i64,
    end_event_number: i64,
    last_event_number: i64,
    skip_index_scan_on_read: bool,
) -> RetentionResult {
    if end_event_number < start_event_number {
        return RetentionResult {
            events: Vec::new(),
            next_event_number: start_event_number,
            is_end_of_stream: end_event_number >= last_event_number,
        };
    }
    let raw_entries = table_index.get_range(stream_hash, start_event_number, end_event_number, None);
    let mut matched: Vec<(IndexEntry, PrepareRecord)> = Vec::new();
    for entry in raw_entries {
        let Some(prepare) = fetch.fetch(entry.log_position) else {
            continue;
        };
        if prepare.event_stream_id != stream_name {
            continue;
        }
        if !skip_index_scan_on_read {
            if let Some(last) = matched.last() {
                if last.0.version == entry.version {
                    matched.pop();
                }
            }
        }
        matched.push((entry, prepare));
    }
    let last_seen_version = matched.last().map(|(e, _)| e.version).unwrap_or(end_event_number);
    let next_event_number = (last_seen_version.max(end_event_number) + 1).min(last_event_number + 1);
    RetentionResult {
        events: matched,
        next_event_number,
        is_end_of_stream: end_event_number >= last_event_number,
    }
}

/// §4.5's bounded binary search for `$maxAge`-governed streams.
#[allow(clippy::too_many_arguments)]
pub fn read_max_age_window(
    table_index: &dyn TableIndex,
    fetch: &dyn PrepareFetcher,
    stream_hash: StreamHash,
    stream_name: &str,
    start_event_number: i64,
    max_count: i64,
    last_event_number: i64,
    age_threshold_unix_millis: i64,
) -> RetentionResult {
    if start_event_number > last_event_number {
        return RetentionResult {
            events: Vec::new(),
            next_event_number: start_event_number,
            is_end_of_stream: true,
        };
    }

    let end_event_number = (start_event_number + max_count - 1).min(last_event_number);
    let mut index_entries = table_index.get_range(stream_hash, start_event_number, end_event_number, None);
    let mut effective_start = start_event_number;
    if index_entries.is_empty() {
        if let Some(oldest) = table_index.try_get_oldest_entry(stream_hash) {
            if oldest.version > effective_start {
                effective_start = oldest.version;
                let retried_end = (effective_start + max_count - 1).min(last_event_number);
                index_entries = table_index.get_range(stream_hash, effective_start, retried_end, None);
            }
        }
        if index_entries.is_empty() {
            return RetentionResult {
                events: Vec::new(),
                next_event_number: effective_start,
                is_end_of_stream: false,
            };
        }
    }

    let matching = |entry: &IndexEntry| -> Option<PrepareRecord> {
        fetch.fetch(entry.log_position).filter(|p| p.event_stream_id == stream_name)
    };

    // Scan from the newest entry in the window backward: versions correlate
    // with time, so the moment we hit an expired entry everything further
    // back is expired too and we can stop.
    let mut live: Vec<(IndexEntry, PrepareRecord)> = Vec::new();
    for entry in index_entries.iter().rev() {
        let Some(prepare) = matching(entry) else { continue };
        if prepare.timestamp_unix_millis < age_threshold_unix_millis {
            break;
        }
        live.push(entry.clone_with_prepare(prepare));
    }
    live.reverse();
    if !live.is_empty() {
        let cap = (start_event_number + max_count) as usize;
        live.retain(|(e, _)| (e.version as usize) < cap);
        let next_event_number = live.last().map(|(e, _)| e.version + 1).unwrap_or(effective_start);
        return RetentionResult {
            events: live,
            next_event_number: next_event_number.min(last_event_number + 1),
            is_end_of_stream: next_event_number > last_event_number,
        };
    }

    if let Some(latest_entry) = table_index.try_get_latest_entry(stream_hash) {
        if let Some(latest_prepare) = matching(&latest_entry) {
            if latest_prepare.timestamp_unix_millis < age_threshold_unix_millis
                || last_event_number < start_event_number
            {
                return RetentionResult {
                    events: Vec::new(),
                    next_event_number: last_event_number + 1,
                    is_end_of_stream: true,
                };
            }
        }
    }

    let mut low = index_entries[0].version;
    let mut high = last_event_number;
    let mut best_next_event_number = effective_start;

    while low <= high {
        let mid = low + (high - low) / 2;
        let window_end = (mid + max_count - 1).min(last_event_number);
        let window = table_index.get_range(stream_hash, mid, window_end, None);
        if window.is_empty() {
            break;
        }
        // low_prepare: the earliest (lowest-version) entry in the window that
        // matches this stream, used to tell whether the whole window is
        // still live. high_prepare: the latest (highest-version) matching
        // entry, used to tell whether the whole window has already expired.
        let low_prepare = window.iter().find_map(|e| matching(e).map(|p| (e, p)));
        let high_prepare = window.iter().rev().find_map(|e| matching(e).map(|p| (e, p)));
        let (Some((low_entry, low_record)), Some((_high_entry, high_record))) = (low_prepare, high_prepare) else {
            break;
        };

        if low_record.timestamp_unix_millis >= age_threshold_unix_millis {
            best_next_event_number = low_entry.version;
            high = mid - 1;
        } else if high_record.timestamp_unix_millis < age_threshold_unix_millis {
            low = mid + window.len() as i64;
        } else {
            let mut result: Vec<(IndexEntry, PrepareRecord)> = Vec::new();
            for entry in &window {
                let Some(prepare) = matching(entry) else { continue };
                if prepare.timestamp_unix_millis >= age_threshold_unix_millis {
                    result.push((entry.clone_with_prepare(prepare)));
                }
            }
            let next_event_number = result.last().map(|(e, _)| e.version + 1).unwrap_or(window_end + 1);
            return RetentionResult {
                events: result,
                next_event_number: next_event_number.min(last_event_number + 1),
                is_end_of_stream: next_event_number > last_event_number,
            };
        }
    }

    RetentionResult {
        events: Vec::new(),
        next_event_number: best_next_event_number,
        is_end_of_stream: false,
    }
}

trait IndexEntryExt {
    fn clone_with_prepare(&self, prepare: PrepareRecord) -> (IndexEntry, PrepareRecord);
}

impl IndexEntryExt for IndexEntry {
    fn clone_with_prepare(&self, prepare: PrepareRecord) -> (IndexEntry, PrepareRecord) {
        (*self, prepare)
    }
}

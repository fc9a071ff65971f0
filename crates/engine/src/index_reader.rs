//! The Index Reader: orchestrates the hasher, table index, TF reader pool,
//! backend cache and retention logic to answer the read operations of
//! §4.1.

use std::sync::Arc;

use logindex_core::error::ArgumentError;
use logindex_core::metadata::StreamMetadata;
use logindex_core::names;
use logindex_core::record::{PrepareFlags, PrepareRecord};
use logindex_core::stream_id::{StreamHash, StringStreamId};
use logindex_core::{DELETED_STREAM, INVALID_LAST_EVENT_NUMBER, NO_STREAM};
use logindex_durability::TfReaderPool;
use logindex_security::{self, EffectiveAcl};
use logindex_storage::retention::{self, PrepareFetcher, RetentionResult};
use logindex_storage::{IndexBackendCache, TableIndex};

use crate::config::IndexReaderConfig;
use crate::hasher::{StreamHasher, TwoHashStreamHasher};
use crate::stats::{IndexReaderCounters, IndexReaderStats};

#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub stream: String,
    pub event_number: i64,
    pub event_type: String,
    pub data: Vec<u8>,
    pub metadata: Vec<u8>,
    pub timestamp_unix_millis: i64,
}

impl EventRecord {
    fn from_prepare(stream: &str, prepare: &PrepareRecord) -> Self {
        EventRecord {
            stream: stream.to_string(),
            event_number: prepare.event_number,
            event_type: prepare.event_type.clone(),
            data: prepare.data.clone(),
            metadata: prepare.metadata.clone(),
            timestamp_unix_millis: prepare.timestamp_unix_millis,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadEventOutcome {
    Success(EventRecord),
    NotFound,
    NoStream,
    StreamDeleted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexReadEventResult {
    pub outcome: ReadEventOutcome,
    pub metadata: StreamMetadata,
    pub last_event_number: i64,
    pub original_stream_exists: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexReadStreamResult {
    pub events: Vec<EventRecord>,
    pub next_event_number: i64,
    pub last_event_number: i64,
    pub is_end_of_stream: bool,
}

impl IndexReadStreamResult {
    fn stream_deleted(last_event_number: i64) -> Self {
        IndexReadStreamResult {
            events: Vec::new(),
            next_event_number: 0,
            last_event_number,
            is_end_of_stream: true,
        }
    }

    fn no_stream() -> Self {
        IndexReadStreamResult {
            events: Vec::new(),
            next_event_number: 0,
            last_event_number: NO_STREAM,
            is_end_of_stream: true,
        }
    }
}

pub struct IndexReader {
    table_index: Arc<dyn TableIndex>,
    reader_pool: Arc<TfReaderPool>,
    cache: Arc<IndexBackendCache>,
    hasher: Box<dyn StreamHasher<StringStreamId>>,
    config: IndexReaderConfig,
    counters: IndexReaderCounters,
}

impl IndexReader {
    pub fn new(
        table_index: Arc<dyn TableIndex>,
        reader_pool: Arc<TfReaderPool>,
        cache: Arc<IndexBackendCache>,
        config: IndexReaderConfig,
    ) -> Self {
        Self::with_hasher(table_index, reader_pool, cache, config, Box::new(TwoHashStreamHasher))
    }

    /// Like [`IndexReader::new`], but with an injectable hasher. Production
    /// callers always get [`TwoHashStreamHasher`] through `new`; this seam
    /// exists for tests that need to force a hash collision deterministically
    /// (see §8 scenario E) without searching for naturally colliding names.
    pub fn with_hasher(
        table_index: Arc<dyn TableIndex>,
        reader_pool: Arc<TfReaderPool>,
        cache: Arc<IndexBackendCache>,
        config: IndexReaderConfig,
        hasher: Box<dyn StreamHasher<StringStreamId>>,
    ) -> Self {
        IndexReader {
            table_index,
            reader_pool,
            cache,
            hasher,
            config,
            counters: IndexReaderCounters::default(),
        }
    }

    pub fn stats(&self) -> IndexReaderStats {
        self.counters.snapshot()
    }

    fn hash_of(&self, stream: &str) -> StreamHash {
        self.hasher.hash(&StringStreamId(stream.to_string()))
    }

    fn fetch_prepare(&self, position: i64) -> Option<PrepareRecord> {
        let lease = self.reader_pool.borrow();
        match lease.try_read_at(position)?.record {
            logindex_durability::LogRecord::Prepare(p) => Some(p),
            logindex_durability::LogRecord::Commit(_) => None,
        }
    }

    fn fetcher(&self) -> impl PrepareFetcher + '_ {
        move |position: i64| self.fetch_prepare(position)
    }

    /// Pure table-index resolution of `stream`'s last event number (§4.2
    /// steps 3-6), with no cache interaction and no awareness of the
    /// stream's own soft-delete metadata. Used both as the cached value
    /// for ordinary streams and, uncached, to probe a metastream's last
    /// event without re-entering [`IndexReader::get_stream_last_event_number`]'s
    /// deletion check (which would otherwise recurse: `X`'s deletion check
    /// reads `$$X`, and `$$X`'s own resolution checks whether `X` is
    /// deleted).
    fn raw_last_event_number(&self, stream: &str) -> i64 {
        let hash = self.hash_of(stream);
        let Some(latest_entry) = self.table_index.try_get_latest_entry(hash) else {
            return NO_STREAM;
        };

        match self.fetch_prepare(latest_entry.log_position) {
            Some(prepare) if prepare.event_stream_id == stream => {
                let mut latest_version = latest_entry.version;
                let extra = self.table_index.get_range(
                    hash,
                    latest_entry.version + 1,
                    i64::MAX,
                    Some(self.config.hash_collision_read_limit + 1),
                );
                for entry in extra {
                    if let Some(p) = self.fetch_prepare(entry.log_position) {
                        if p.event_stream_id == stream && entry.version > latest_version {
                            latest_version = entry.version;
                        }
                    }
                }
                latest_version
            }
            _ => {
                let candidates = self.table_index.get_range(hash, 0, i64::MAX, Some(self.config.hash_collision_read_limit));
                let mut provisional: Option<i64> = None;
                for entry in candidates {
                    match self.fetch_prepare(entry.log_position) {
                        Some(p) if p.event_stream_id == stream => {
                            provisional = Some(provisional.map_or(entry.version, |v| v.max(entry.version)));
                        }
                        _ => self.counters.record_hash_collision(),
                    }
                }
                match provisional {
                    Some(v) => v,
                    None => {
                        tracing::warn!(
                            target: "logindex::index_reader",
                            stream,
                            hash_collision_read_limit = self.config.hash_collision_read_limit,
                            "exhausted hash collision read limit resolving last event number"
                        );
                        INVALID_LAST_EVENT_NUMBER
                    }
                }
            }
        }
    }

    /// Whether `stream`'s own metastream carries `$tb == DeletedStream`.
    /// Metastream metadata is a fixed constant and never checks itself for
    /// deletion (the data-model invariant that a metastream's metadata is
    /// never read from the log), so this is only ever called for ordinary
    /// streams.
    fn own_truncate_before_is_deleted(&self, stream: &str) -> bool {
        let metastream = names::metastream_of(stream);
        let metastream_last = self.raw_last_event_number(&metastream);
        if metastream_last == NO_STREAM || metastream_last == INVALID_LAST_EVENT_NUMBER {
            return false;
        }
        let hash = self.hash_of(&metastream);
        let entries = self
            .table_index
            .get_range(hash, metastream_last, metastream_last, Some(self.config.hash_collision_read_limit));
        let Some(prepare) = entries
            .into_iter()
            .find_map(|e| self.fetch_prepare(e.log_position).filter(|p| p.event_stream_id == metastream))
        else {
            return false;
        };
        if !prepare.flags.contains(PrepareFlags::IS_JSON) || prepare.data.is_empty() {
            return false;
        }
        StreamMetadata::from_json(&prepare.data, prepare.record_version).truncate_before == Some(DELETED_STREAM)
    }

    /// §4.2: resolve a stream's last event number.
    pub fn get_stream_last_event_number(&self, stream: &str) -> Result<i64, ArgumentError> {
        if stream.is_empty() {
            return Err(ArgumentError::EmptyStreamName);
        }

        if let Some(original) = names::original_stream_of(stream) {
            if self.get_stream_last_event_number(original)? == DELETED_STREAM {
                return Ok(DELETED_STREAM);
            }
            let cached = self.cache.try_get_last_event_number(stream);
            if let Some(value) = cached.value {
                self.counters.record_cache_hit();
                return Ok(value);
            }
            self.counters.record_cache_miss();
            let resolved = self.raw_last_event_number(stream);
            return Ok(self.cache.update_last_event_number_if_version_matches(stream, cached.generation, resolved));
        }

        let cached = self.cache.try_get_last_event_number(stream);
        if let Some(value) = cached.value {
            self.counters.record_cache_hit();
            return Ok(value);
        }
        self.counters.record_cache_miss();

        let mut resolved = self.raw_last_event_number(stream);
        if resolved != DELETED_STREAM && self.own_truncate_before_is_deleted(stream) {
            resolved = DELETED_STREAM;
        }

        Ok(self.cache.update_last_event_number_if_version_matches(stream, cached.generation, resolved))
    }

    /// §4.3: resolve a stream's metadata.
    pub fn get_stream_metadata(&self, stream: &str) -> Result<StreamMetadata, ArgumentError> {
        if stream.is_empty() {
            return Err(ArgumentError::EmptyStreamName);
        }
        if names::is_metastream(stream) {
            return Ok(self.config.metastream_metadata.clone());
        }

        let cached = self.cache.try_get_metadata(stream);
        if let Some(value) = cached.value {
            self.counters.record_cache_hit();
            return Ok(value);
        }
        self.counters.record_cache_miss();

        let metastream = names::metastream_of(stream);
        let metastream_last = self.get_stream_last_event_number(&metastream)?;
        let metadata = if metastream_last == NO_STREAM || metastream_last == INVALID_LAST_EVENT_NUMBER {
            StreamMetadata::empty()
        } else {
            let hash = self.hash_of(&metastream);
            let entries = self.table_index.get_range(hash, metastream_last, metastream_last, Some(self.config.hash_collision_read_limit));
            entries
                .into_iter()
                .find_map(|e| self.fetch_prepare(e.log_position).filter(|p| p.event_stream_id == metastream))
                .filter(|p| p.flags.contains(PrepareFlags::IS_JSON) && !p.data.is_empty())
                .map(|p| StreamMetadata::from_json(&p.data, p.record_version))
                .unwrap_or_else(StreamMetadata::empty)
        };

        Ok(self.cache.update_metadata_if_version_matches(stream, cached.generation, metadata))
    }

    /// §4.7: assemble the effective ACL for a stream.
    pub fn get_effective_acl(&self, stream: &str) -> Result<EffectiveAcl, ArgumentError> {
        let metadata = self.get_stream_metadata(stream)?;
        let stream_layer = metadata.acl.map(logindex_security::AclLayer::from);
        let settings = self.cache.system_settings();
        let settings_layer = logindex_security::system_settings_layer_for(&settings, names::is_system_stream(stream));
        let default_layer = logindex_security::default_acl();
        Ok(logindex_security::assemble_effective_acl(
            stream_layer.as_ref(),
            settings_layer,
            &default_layer,
        ))
    }

    /// Bypasses retention; used for metadata assembly and replication.
    pub fn read_prepare(&self, stream: &str, event_number: i64) -> Result<Option<PrepareRecord>, ArgumentError> {
        if stream.is_empty() {
            return Err(ArgumentError::EmptyStreamName);
        }
        if event_number < 0 {
            return Err(ArgumentError::InvalidEventNumber(event_number));
        }
        let hash = self.hash_of(stream);
        let entries = self.table_index.get_range(hash, event_number, event_number, Some(self.config.hash_collision_read_limit));
        Ok(entries
            .into_iter()
            .find_map(|e| self.fetch_prepare(e.log_position).filter(|p| p.event_stream_id == stream)))
    }

    pub fn get_event_stream_id_by_transaction_id(&self, transaction_position: i64) -> Option<String> {
        let lease = self.reader_pool.borrow();
        match lease.try_read_at(transaction_position)?.record {
            logindex_durability::LogRecord::Prepare(p) => Some(p.event_stream_id),
            logindex_durability::LogRecord::Commit(_) => None,
        }
    }

    fn resolve_stream_state(&self, stream: &str) -> Result<StreamState, ArgumentError> {
        let last_event_number = self.get_stream_last_event_number(stream)?;
        if last_event_number == NO_STREAM {
            return Ok(StreamState::NoStream);
        }
        if last_event_number == DELETED_STREAM {
            return Ok(StreamState::Deleted);
        }
        let metadata = self.get_stream_metadata(stream)?;
        Ok(StreamState::Present { last_event_number, metadata })
    }

    /// §4.1 `read_event`.
    pub fn read_event(&self, stream: &str, event_number: i64) -> Result<IndexReadEventResult, ArgumentError> {
        if stream.is_empty() {
            return Err(ArgumentError::EmptyStreamName);
        }
        if event_number < -1 {
            return Err(ArgumentError::InvalidEventNumber(event_number));
        }

        let original_stream_exists = names::original_stream_of(stream)
            .map(|original| matches!(self.resolve_stream_state(original), Ok(StreamState::Present { .. })));

        match self.resolve_stream_state(stream)? {
            StreamState::NoStream => Ok(IndexReadEventResult {
                outcome: ReadEventOutcome::NoStream,
                metadata: StreamMetadata::empty(),
                last_event_number: NO_STREAM,
                original_stream_exists,
            }),
            StreamState::Deleted => Ok(IndexReadEventResult {
                outcome: ReadEventOutcome::StreamDeleted,
                metadata: StreamMetadata::empty(),
                last_event_number: DELETED_STREAM,
                original_stream_exists,
            }),
            StreamState::Present { last_event_number, metadata } => {
                let requested = if event_number == -1 { last_event_number } else { event_number };
                let min_event_number = metadata.min_event_number_from_count_and_truncate(last_event_number);
                if min_event_number == DELETED_STREAM || requested < min_event_number || requested > last_event_number {
                    return Ok(IndexReadEventResult {
                        outcome: ReadEventOutcome::NotFound,
                        metadata,
                        last_event_number,
                        original_stream_exists,
                    });
                }
                let found = self.read_prepare(stream, requested)?;
                let outcome = match found {
                    Some(p) => ReadEventOutcome::Success(EventRecord::from_prepare(stream, &p)),
                    None => ReadEventOutcome::NotFound,
                };
                Ok(IndexReadEventResult {
                    outcome,
                    metadata,
                    last_event_number,
                    original_stream_exists,
                })
            }
        }
    }

    /// §4.4/§4.5 `read_stream_forward`.
    pub fn read_stream_forward(&self, stream: &str, from: i64, max_count: i64) -> Result<IndexReadStreamResult, ArgumentError> {
        if stream.is_empty() {
            return Err(ArgumentError::EmptyStreamName);
        }
        if from < 0 {
            return Err(ArgumentError::InvalidEventNumber(from));
        }
        if max_count <= 0 {
            return Err(ArgumentError::InvalidCount(max_count));
        }

        match self.resolve_stream_state(stream)? {
            StreamState::NoStream => Ok(IndexReadStreamResult::no_stream()),
            StreamState::Deleted => Ok(IndexReadStreamResult::stream_deleted(DELETED_STREAM)),
            StreamState::Present { last_event_number, metadata } => {
                let min_event_number = metadata.min_event_number_from_count_and_truncate(last_event_number);
                if min_event_number == DELETED_STREAM {
                    return Ok(IndexReadStreamResult::stream_deleted(DELETED_STREAM));
                }
                let start = from.max(min_event_number);
                let end = (start + max_count - 1).min(last_event_number);
                if end < start {
                    return Ok(IndexReadStreamResult {
                        events: Vec::new(),
                        next_event_number: start,
                        last_event_number,
                        is_end_of_stream: end >= last_event_number,
                    });
                }

                let hash = self.hash_of(stream);
                let fetch = self.fetcher();
                let result: RetentionResult = if let Some(max_age_seconds) = metadata.max_age_seconds {
                    let age_threshold = now_unix_millis() - max_age_seconds * 1000;
                    retention::read_max_age_window(
                        self.table_index.as_ref(),
                        &fetch,
                        hash,
                        stream,
                        start,
                        max_count,
                        last_event_number,
                        age_threshold,
                    )
                } else {
                    retention::read_plain_window(
                        self.table_index.as_ref(),
                        &fetch,
                        hash,
                        stream,
                        start,
                        end,
                        last_event_number,
                        self.config.skip_index_scan_on_read,
                    )
                };

                Ok(IndexReadStreamResult {
                    events: result.events.iter().map(|(_, p)| EventRecord::from_prepare(stream, p)).collect(),
                    next_event_number: result.next_event_number,
                    last_event_number,
                    is_end_of_stream: result.is_end_of_stream,
                })
            }
        }
    }

    /// §4.6 `read_stream_backward`.
    pub fn read_stream_backward(&self, stream: &str, from: i64, max_count: i64) -> Result<IndexReadStreamResult, ArgumentError> {
        if stream.is_empty() {
            return Err(ArgumentError::EmptyStreamName);
        }
        if max_count <= 0 {
            return Err(ArgumentError::InvalidCount(max_count));
        }

        match self.resolve_stream_state(stream)? {
            StreamState::NoStream => Ok(IndexReadStreamResult::no_stream()),
            StreamState::Deleted => Ok(IndexReadStreamResult::stream_deleted(DELETED_STREAM)),
            StreamState::Present { last_event_number, metadata } => {
                let min_event_number = metadata.min_event_number_from_count_and_truncate(last_event_number);
                if min_event_number == DELETED_STREAM {
                    return Ok(IndexReadStreamResult::stream_deleted(DELETED_STREAM));
                }
                let end = if from < 0 { last_event_number } else { from };
                if end < min_event_number {
                    return Ok(IndexReadStreamResult {
                        events: Vec::new(),
                        next_event_number: end,
                        last_event_number,
                        is_end_of_stream: true,
                    });
                }
                let start = (end - max_count + 1).max(min_event_number).max(0);

                let hash = self.hash_of(stream);
                let fetch = self.fetcher();
                let mut result = retention::read_plain_window(
                    self.table_index.as_ref(),
                    &fetch,
                    hash,
                    stream,
                    start,
                    end,
                    last_event_number,
                    self.config.skip_index_scan_on_read,
                );

                if let Some(max_age_seconds) = metadata.max_age_seconds {
                    let age_threshold = now_unix_millis() - max_age_seconds * 1000;
                    result.events.retain(|(_, p)| p.timestamp_unix_millis >= age_threshold);
                }

                let is_end_of_stream =
                    start <= min_event_number || result.events.first().map(|(e, _)| e.version) != Some(start);
                result.events.reverse();
                let next_event_number = result.events.last().map(|(e, _)| e.version - 1).unwrap_or(start - 1);
                Ok(IndexReadStreamResult {
                    events: result.events.iter().map(|(_, p)| EventRecord::from_prepare(stream, p)).collect(),
                    next_event_number,
                    last_event_number,
                    is_end_of_stream,
                })
            }
        }
    }
}

enum StreamState {
    NoStream,
    Deleted,
    Present { last_event_number: i64, metadata: StreamMetadata },
}

fn now_unix_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

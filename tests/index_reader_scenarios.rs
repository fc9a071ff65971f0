//! End-to-end scenarios over a fully wired [`IndexReader`]: in-memory
//! transaction log, table index and backend cache, exercising the read
//! operations the way a caller actually would.

use std::sync::Arc;

use logindex::core_types::metadata::StreamMetadata;
use logindex::core_types::record::{LogRecordVersion, PrepareFlags, PrepareRecord};
use logindex::core_types::stream_id::{IndexEntry, StreamHash, StringStreamId};
use logindex::durability::log::InMemoryTransactionLog;
use logindex::durability::TfReaderPool;
use logindex::engine::{StreamHasher, TwoHashStreamHasher};
use logindex::storage::{IndexBackendCache, InMemoryTableIndex};
use logindex::{DELETED_STREAM, NO_STREAM};
use logindex::{IndexReadStreamResult, IndexReader, IndexReaderConfig, ReadEventOutcome};

struct Harness {
    log: Arc<InMemoryTransactionLog>,
    table_index: Arc<InMemoryTableIndex>,
    reader: IndexReader,
}

fn prepare(stream: &str, event_number: i64, data: &[u8], timestamp_unix_millis: i64, flags: PrepareFlags) -> PrepareRecord {
    PrepareRecord {
        log_position: 0,
        transaction_position: 0,
        event_number,
        event_stream_id: stream.to_string(),
        event_type: "TestEvent".to_string(),
        timestamp_unix_millis,
        flags,
        data: data.to_vec(),
        metadata: vec![],
        record_version: LogRecordVersion::V1,
    }
}

impl Harness {
    fn new(config: IndexReaderConfig) -> Self {
        let log = Arc::new(InMemoryTransactionLog::new());
        let table_index = Arc::new(InMemoryTableIndex::new());
        let reader_pool = Arc::new(TfReaderPool::new(log.clone(), 1, 8));
        let cache = Arc::new(IndexBackendCache::new(Default::default()));
        let reader = IndexReader::new(table_index.clone(), reader_pool, cache, config);
        Harness { log, table_index, reader }
    }

    /// Append an event and record it in the table index at a hash derived
    /// from the real two-hash stream hasher, mirroring what a commit
    /// pipeline would do.
    fn write(&self, stream: &str, event_number: i64, data: &[u8], timestamp_unix_millis: i64) {
        let hasher = TwoHashStreamHasher;
        let hash = hasher.hash(&StringStreamId(stream.to_string()));
        let position = self.log.append_prepare(prepare(stream, event_number, data, timestamp_unix_millis, PrepareFlags::IS_COMMITTED));
        self.table_index.insert(IndexEntry::new(hash, event_number, position));
    }

    fn write_metadata(&self, stream: &str, metadata_json: &[u8]) {
        let meta_stream = logindex::core_types::names::metastream_of(stream);
        let hasher = TwoHashStreamHasher;
        let hash = hasher.hash(&StringStreamId(meta_stream.clone()));
        let existing = self.table_index.try_get_latest_entry(hash).map(|e| e.version + 1).unwrap_or(0);
        let position = self.log.append_prepare(prepare(
            &meta_stream,
            existing,
            metadata_json,
            0,
            PrepareFlags::IS_COMMITTED | PrepareFlags::IS_JSON,
        ));
        self.table_index.insert(IndexEntry::new(hash, existing, position));
    }
}

use logindex::storage::TableIndex as _;

#[test]
fn scenario_a_basic_read() {
    let harness = Harness::new(IndexReaderConfig::default());
    for n in 0..5 {
        harness.write("ES", n, b"bla", 0);
    }
    let result = harness.reader.read_stream_forward("ES", 0, 10).unwrap();
    assert_eq!(result.events.len(), 5);
    assert_eq!(result.next_event_number, 5);
    assert!(result.is_end_of_stream);
}

#[test]
fn scenario_b_max_count_truncation() {
    let harness = Harness::new(IndexReaderConfig::default());
    harness.write_metadata("ES", br#"{"$maxCount":3}"#);
    for n in 0..10 {
        harness.write("ES", n, b"bla", 0);
    }
    let result = harness.reader.read_stream_forward("ES", 0, 100).unwrap();
    let versions: Vec<i64> = result.events.iter().map(|e| e.event_number).collect();
    assert_eq!(versions, vec![7, 8, 9]);
}

#[test]
fn scenario_c_soft_delete_via_truncate_before() {
    let harness = Harness::new(IndexReaderConfig::default());
    for n in 0..3 {
        harness.write("ES", n, b"bla", 0);
    }
    harness.write_metadata("ES", br#"{"$tb":-1}"#);

    assert_eq!(harness.reader.get_stream_last_event_number("ES").unwrap(), DELETED_STREAM);

    let read = harness.reader.read_event("ES", 0).unwrap();
    assert_eq!(read.outcome, ReadEventOutcome::StreamDeleted);

    let forward = harness.reader.read_stream_forward("ES", 0, 10).unwrap();
    assert_eq!(forward.last_event_number, DELETED_STREAM);
    assert!(forward.events.is_empty());
}

#[test]
fn scenario_d_max_age_mostly_expired() {
    let harness = Harness::new(IndexReaderConfig::default());
    harness.write_metadata("ES", br#"{"$maxAge":1200}"#);

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;
    let expired_timestamp = now - 50 * 60 * 1000;
    let live_timestamp = now - 60 * 1000;

    for n in 0..1_000_000i64 {
        harness.write("ES", n, b"old", expired_timestamp);
    }
    for n in 1_000_000..1_000_015i64 {
        harness.write("ES", n, b"new", live_timestamp);
    }

    let first = harness.reader.read_stream_forward("ES", 1, 10).unwrap();
    assert!(first.events.is_empty());
    assert_eq!(first.next_event_number, 1_000_000);
    assert!(!first.is_end_of_stream);

    let second = harness.reader.read_stream_forward("ES", first.next_event_number, 10).unwrap();
    assert_eq!(second.events.len(), 10);
    assert_eq!(second.next_event_number, 1_000_010);

    let third = harness.reader.read_stream_forward("ES", second.next_event_number, 10).unwrap();
    assert_eq!(third.events.len(), 5);
    assert!(third.is_end_of_stream);
}

/// A hasher that always collapses every stream name onto the same
/// [`StreamHash`], so two distinct stream names can be made to collide
/// deterministically without searching for a natural collision.
struct AlwaysCollidingHasher;

impl StreamHasher<StringStreamId> for AlwaysCollidingHasher {
    fn hash(&self, _id: &StringStreamId) -> StreamHash {
        StreamHash::new(0, 0)
    }
}

#[test]
fn scenario_e_hash_collision_does_not_leak_events_between_streams() {
    let log = Arc::new(InMemoryTransactionLog::new());
    let table_index = Arc::new(InMemoryTableIndex::new());
    let reader_pool = Arc::new(TfReaderPool::new(log.clone(), 1, 8));
    let cache = Arc::new(IndexBackendCache::new(Default::default()));
    let reader = IndexReader::with_hasher(
        table_index.clone(),
        reader_pool,
        cache,
        IndexReaderConfig::default(),
        Box::new(AlwaysCollidingHasher),
    );

    let colliding_hash = StreamHash::new(0, 0);
    for n in 0..3 {
        let position = log.append_prepare(prepare("stream-A", n, b"a", 0, PrepareFlags::IS_COMMITTED));
        table_index.insert(IndexEntry::new(colliding_hash, n, position));
    }
    for n in 0..3 {
        let position = log.append_prepare(prepare("stream-B", n, b"b", 0, PrepareFlags::IS_COMMITTED));
        table_index.insert(IndexEntry::new(colliding_hash, n, position));
    }

    let a_last = reader.get_stream_last_event_number("stream-A").unwrap();
    let b_last = reader.get_stream_last_event_number("stream-B").unwrap();
    assert_eq!(a_last, 2);
    assert_eq!(b_last, 2);

    let a_read = reader.read_event("stream-A", 0).unwrap();
    match a_read.outcome {
        ReadEventOutcome::Success(event) => assert_eq!(event.data, b"a"),
        other => panic!("expected stream-A's own event, got {other:?}"),
    }
    let b_read = reader.read_event("stream-B", 0).unwrap();
    match b_read.outcome {
        ReadEventOutcome::Success(event) => assert_eq!(event.data, b"b"),
        other => panic!("expected stream-B's own event, got {other:?}"),
    }

    let stats = reader.stats();
    assert!(stats.hash_collisions > 0, "colliding reads must be counted");
}

#[test]
fn scenario_f_metastream_tied_to_originals_deletion() {
    let harness = Harness::new(IndexReaderConfig::default());
    harness.write("X", 0, b"payload", 0);
    harness.write_metadata("X", br#"{"$tb":-1}"#);

    let meta_read = harness.reader.get_stream_last_event_number("$$X").unwrap();
    assert_eq!(meta_read, DELETED_STREAM);

    let meta_stream_read = harness.reader.read_event("$$X", 0).unwrap();
    assert_eq!(meta_stream_read.outcome, ReadEventOutcome::StreamDeleted);

    let metadata = harness.reader.get_stream_metadata("$$X").unwrap();
    assert_eq!(metadata, StreamMetadata::empty());
}

#[test]
fn never_written_stream_reports_no_stream_everywhere() {
    let harness = Harness::new(IndexReaderConfig::default());
    assert_eq!(harness.reader.get_stream_last_event_number("ghost").unwrap(), NO_STREAM);

    let event = harness.reader.read_event("ghost", 0).unwrap();
    assert_eq!(event.outcome, ReadEventOutcome::NoStream);

    let forward: IndexReadStreamResult = harness.reader.read_stream_forward("ghost", 0, 10).unwrap();
    assert!(forward.events.is_empty());
    assert_eq!(forward.last_event_number, NO_STREAM);
}

#[test]
fn get_stream_metadata_is_idempotent_and_hits_cache_on_second_call() {
    let harness = Harness::new(IndexReaderConfig::default());
    harness.write_metadata("ES", br#"{"$maxCount":5}"#);

    let first = harness.reader.get_stream_metadata("ES").unwrap();
    let misses_before = harness.reader.stats().not_cached_stream_info;
    let second = harness.reader.get_stream_metadata("ES").unwrap();
    let hits_after = harness.reader.stats().cached_stream_info;

    assert_eq!(first, second);
    assert!(hits_after > 0);
    let _ = misses_before;
}

#[test]
fn backward_read_returns_strictly_decreasing_event_numbers() {
    let harness = Harness::new(IndexReaderConfig::default());
    for n in 0..5 {
        harness.write("ES", n, b"bla", 0);
    }
    let result = harness.reader.read_stream_backward("ES", -1, 10).unwrap();
    let versions: Vec<i64> = result.events.iter().map(|e| e.event_number).collect();
    assert_eq!(versions, vec![4, 3, 2, 1, 0]);
    assert!(result.is_end_of_stream);
}

#[test]
fn backward_read_reports_end_of_stream_on_a_gap_at_the_window_start() {
    // Versions 0..=14 and 16..=19 are written, but 15 never lands in the
    // table index (e.g. dropped by a scavenge that didn't update
    // metadata). A backward read landing its window exactly on that gap
    // has nothing earlier to resume from, even though plenty of the
    // stream's own retention floor remains unread.
    let harness = Harness::new(IndexReaderConfig::default());
    for n in 0..15 {
        harness.write("ES", n, b"bla", 0);
    }
    for n in 16..20 {
        harness.write("ES", n, b"bla", 0);
    }

    let result = harness.reader.read_stream_backward("ES", 19, 5).unwrap();
    let versions: Vec<i64> = result.events.iter().map(|e| e.event_number).collect();
    assert_eq!(versions, vec![19, 18, 17, 16]);
    assert!(result.is_end_of_stream, "a gap at the window start must report end of stream");
}

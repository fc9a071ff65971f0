//! Stream-existence filter bootstrapping, §4.9.
//!
//! Two modes depending on log format. Both are expressed as plain
//! functions over the already-read-only collaborators rather than a
//! stateful "initializer" object, since bootstrapping happens once before
//! any reader is handed out and has no steady-state behavior worth
//! modeling as a type.

use logindex_core::stream_id::IndexEntry;
use logindex_durability::{Checkpoint, LogRecord, TfReaderPool};
use logindex_storage::{StreamExistenceFilter, TableIndex};
use std::sync::Arc;

/// Format A (hash-keyed): one entry per distinct stream hash already in
/// the table index, then continue scanning the TF log from
/// `max(prepare_checkpoint, commit_checkpoint)` for anything committed
/// since the index was last flushed.
pub fn initialize_hash_keyed(
    table_index: &dyn TableIndex,
    reader_pool: &Arc<TfReaderPool>,
    prepare_checkpoint: &dyn Checkpoint,
    commit_checkpoint: &dyn Checkpoint,
    filter: &dyn StreamExistenceFilter,
) {
    let filter_checkpoint = filter.checkpoint().read();
    let index_checkpoint = prepare_checkpoint.read().max(commit_checkpoint.read());

    let resume_from = if filter_checkpoint > index_checkpoint {
        filter_checkpoint
    } else {
        for entry in table_index.iterate_all() {
            filter.add(&hash_key_bytes(&entry));
        }
        index_checkpoint
    };

    let lease = reader_pool.borrow();
    let mut position = resume_from.max(0);
    while let Some(read) = lease.try_read_next(position) {
        if let LogRecord::Prepare(prepare) = read.record {
            filter.add(prepare.event_stream_id.as_bytes());
        }
        position = read.post_position;
    }
}

/// Format B (name-keyed): iterate the persisted stream-name index,
/// emitting each stream name. There is no TF log continuation step here
/// because the name index itself is the authoritative set of known
/// streams.
pub fn initialize_name_keyed(names: impl Iterator<Item = String>, filter: &dyn StreamExistenceFilter) {
    for name in names {
        filter.add(name.as_bytes());
    }
}

fn hash_key_bytes(entry: &IndexEntry) -> Vec<u8> {
    entry.stream_hash.0.to_le_bytes().to_vec()
}

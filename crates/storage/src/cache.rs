//! The versioned backend cache: per-stream last-event-number and metadata
//! slots, updated via compare-and-swap so the commit pipeline always wins
//! races against reader-side cache refreshes.

use dashmap::DashMap;
use logindex_core::metadata::StreamMetadata;
use logindex_security::SystemSettings;
use parking_lot::RwLock;

/// A cached value paired with the generation it was written at. The
/// commit pipeline bumps the generation on every write; a reader's
/// `update_if_version_matches` only takes effect if the generation it
/// observed during its lookup is still current.
#[derive(Debug, Clone)]
pub struct VersionedSlot<T> {
    pub generation: u64,
    pub value: T,
}

/// Outcome of `TryGet`: either a cache hit with the current generation, or
/// a miss carrying the generation the caller should present to
/// `update_if_version_matches` (0 if the key has never been written).
pub struct TryGetResult<T> {
    pub generation: u64,
    pub value: Option<T>,
}

pub struct IndexBackendCache {
    last_event_number: DashMap<String, VersionedSlot<i64>>,
    metadata: DashMap<String, VersionedSlot<StreamMetadata>>,
    system_settings: RwLock<SystemSettings>,
}

impl IndexBackendCache {
    pub fn new(system_settings: SystemSettings) -> Self {
        IndexBackendCache {
            last_event_number: DashMap::new(),
            metadata: DashMap::new(),
            system_settings: RwLock::new(system_settings),
        }
    }

    pub fn try_get_last_event_number(&self, stream: &str) -> TryGetResult<i64> {
        match self.last_event_number.get(stream) {
            Some(slot) => TryGetResult {
                generation: slot.generation,
                value: Some(slot.value),
            },
            None => TryGetResult {
                generation: 0,
                value: None,
            },
        }
    }

    /// Write `value` for `stream` only if the slot's current generation
    /// still matches `expected_generation`; bumps the generation on
    /// success. Returns the value now in the cache either way (the
    /// caller's value on success, the winning value on a lost race).
    pub fn update_last_event_number_if_version_matches(
        &self,
        stream: &str,
        expected_generation: u64,
        value: i64,
    ) -> i64 {
        let mut entry = self.last_event_number.entry(stream.to_string()).or_insert(VersionedSlot {
            generation: 0,
            value,
        });
        if entry.generation == expected_generation {
            entry.generation += 1;
            entry.value = value;
        }
        entry.value
    }

    /// Unconditional write used by the commit pipeline, always wins.
    pub fn commit_last_event_number(&self, stream: &str, value: i64) {
        let mut entry = self.last_event_number.entry(stream.to_string()).or_insert(VersionedSlot {
            generation: 0,
            value,
        });
        entry.generation += 1;
        entry.value = value;
    }

    pub fn try_get_metadata(&self, stream: &str) -> TryGetResult<StreamMetadata> {
        match self.metadata.get(stream) {
            Some(slot) => TryGetResult {
                generation: slot.generation,
                value: Some(slot.value.clone()),
            },
            None => TryGetResult {
                generation: 0,
                value: None,
            },
        }
    }

    pub fn update_metadata_if_version_matches(
        &self,
        stream: &str,
        expected_generation: u64,
        value: StreamMetadata,
    ) -> StreamMetadata {
        let mut entry = self.metadata.entry(stream.to_string()).or_insert(VersionedSlot {
            generation: 0,
            value: value.clone(),
        });
        if entry.generation == expected_generation {
            entry.generation += 1;
            entry.value = value;
        }
        entry.value.clone()
    }

    pub fn system_settings(&self) -> SystemSettings {
        self.system_settings.read().clone()
    }
}

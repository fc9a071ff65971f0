//! Stream-name index for format B (numeric stream ids): a persistent
//! name→id mapping with a reverse lookup, plus the metastream-aware
//! decorator the reader composes on top of it.
//!
//! Format A (string stream ids) has no analogue of this module — a
//! stream's name already is its id there. This module only matters when
//! the log format allocates small integer ids instead.

use logindex_core::names;
use logindex_core::stream_id::NumericStreamId;
use parking_lot::RwLock;
use std::collections::HashMap;

/// The raw, undecorated name↔id mapping.
pub trait StreamNameIndex: Send + Sync {
    fn id_of(&self, name: &str) -> Option<NumericStreamId>;
    fn name_of(&self, id: NumericStreamId) -> Option<String>;
    /// Allocate and bind a fresh id for `name`, returning the existing id
    /// if one is already bound (bindings are immutable once created).
    fn get_or_allocate(&self, name: &str) -> NumericStreamId;
}

/// In-memory name↔id store. Ids are allocated as
/// `first_value + k * interval`; the slot immediately after an allocated
/// id is reserved for that stream's metastream (`id + 1`), so `interval`
/// must be at least 2.
pub struct InMemoryStreamNameIndex {
    first_value: u32,
    interval: u32,
    next_k: RwLock<u32>,
    by_name: RwLock<HashMap<String, NumericStreamId>>,
    by_id: RwLock<HashMap<NumericStreamId, String>>,
}

impl InMemoryStreamNameIndex {
    pub fn new(first_value: u32, interval: u32) -> Self {
        assert!(interval >= 2, "interval must leave room for the metastream id");
        InMemoryStreamNameIndex {
            first_value,
            interval,
            next_k: RwLock::new(0),
            by_name: RwLock::new(HashMap::new()),
            by_id: RwLock::new(HashMap::new()),
        }
    }
}

impl StreamNameIndex for InMemoryStreamNameIndex {
    fn id_of(&self, name: &str) -> Option<NumericStreamId> {
        self.by_name.read().get(name).copied()
    }

    fn name_of(&self, id: NumericStreamId) -> Option<String> {
        self.by_id.read().get(&id).cloned()
    }

    fn get_or_allocate(&self, name: &str) -> NumericStreamId {
        if let Some(existing) = self.id_of(name) {
            return existing;
        }
        let mut by_name = self.by_name.write();
        let mut by_id = self.by_id.write();
        // Re-check under the write lock: another caller may have raced us.
        if let Some(existing) = by_name.get(name) {
            return *existing;
        }
        let mut next_k = self.next_k.write();
        let id = NumericStreamId(self.first_value + *next_k * self.interval);
        *next_k += 1;
        by_name.insert(name.to_string(), id);
        by_id.insert(id, name.to_string());
        id
    }
}

/// Wraps a raw [`StreamNameIndex`] to recognize the `$$`-prefix
/// metastream convention at the name layer and translate it to
/// `original_id + 1` at the id layer, per §4.8.
pub struct MetastreamDecorator<'a> {
    inner: &'a dyn StreamNameIndex,
}

impl<'a> MetastreamDecorator<'a> {
    pub fn new(inner: &'a dyn StreamNameIndex) -> Self {
        MetastreamDecorator { inner }
    }

    pub fn id_of(&self, name: &str) -> Option<NumericStreamId> {
        match names::original_stream_of(name) {
            Some(original_name) => self.inner.id_of(original_name).map(NumericStreamId::metastream_id),
            None => self.inner.id_of(name),
        }
    }

    pub fn name_of(&self, id: NumericStreamId) -> Option<String> {
        match id.original_id() {
            Some(original_id) => self.inner.name_of(original_id).map(|n| names::metastream_of(&n)),
            None => self.inner.name_of(id),
        }
    }

    pub fn get_or_allocate(&self, name: &str) -> NumericStreamId {
        match names::original_stream_of(name) {
            Some(original_name) => self.inner.get_or_allocate(original_name).metastream_id(),
            None => self.inner.get_or_allocate(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_ids_on_the_arithmetic_sequence() {
        let index = InMemoryStreamNameIndex::new(1, 2);
        let a = index.get_or_allocate("order-1");
        let b = index.get_or_allocate("order-2");
        assert_eq!(a, NumericStreamId(1));
        assert_eq!(b, NumericStreamId(3));
    }

    #[test]
    fn binding_is_immutable_once_created() {
        let index = InMemoryStreamNameIndex::new(1, 2);
        let first = index.get_or_allocate("order-1");
        let second = index.get_or_allocate("order-1");
        assert_eq!(first, second);
    }

    #[test]
    fn both_directions_agree() {
        let index = InMemoryStreamNameIndex::new(1, 2);
        let id = index.get_or_allocate("order-1");
        assert_eq!(index.name_of(id), Some("order-1".to_string()));
        assert_eq!(index.id_of("order-1"), Some(id));
    }

    #[test]
    fn metastream_decorator_translates_name_to_id_plus_one() {
        let index = InMemoryStreamNameIndex::new(1, 2);
        let original_id = index.get_or_allocate("order-1");
        let decorator = MetastreamDecorator::new(&index);
        let meta_id = decorator.get_or_allocate("$$order-1");
        assert_eq!(meta_id, original_id.metastream_id());
    }

    #[test]
    fn metastream_decorator_translates_id_back_to_metastream_name() {
        let index = InMemoryStreamNameIndex::new(1, 2);
        let original_id = index.get_or_allocate("order-1");
        let decorator = MetastreamDecorator::new(&index);
        assert_eq!(
            decorator.name_of(original_id.metastream_id()),
            Some("$$order-1".to_string())
        );
    }

    #[test]
    fn non_metastream_names_pass_through_unchanged() {
        let index = InMemoryStreamNameIndex::new(1, 2);
        let decorator = MetastreamDecorator::new(&index);
        let id = decorator.get_or_allocate("order-1");
        assert_eq!(id, NumericStreamId(1));
    }
}

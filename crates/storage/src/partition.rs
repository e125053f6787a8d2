//! One logical partition: an id index over slots
//!
//! # Lock order
//!
//! partition map shard → partition index → slot. A slot lock is never held
//! while taking the index lock.

use parking_lot::RwLock;
use quire_core::PartitionKey;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::slot::Slot;

#[derive(Debug, Default)]
struct PartitionIndex {
    by_id: FxHashMap<String, Arc<Slot>>,
    /// Slots keyed by creation sequence for stable scan order
    order: BTreeMap<u64, Arc<Slot>>,
    next_seq: u64,
}

/// Slots sharing one partition-key value
#[derive(Debug)]
pub struct Partition {
    key: PartitionKey,
    index: RwLock<PartitionIndex>,
}

impl Partition {
    /// Create an empty partition
    pub fn new(key: PartitionKey) -> Self {
        Self {
            key,
            index: RwLock::new(PartitionIndex::default()),
        }
    }

    /// Partition-key value
    pub fn key(&self) -> &PartitionKey {
        &self.key
    }

    /// Slot for `id`, if one is linked
    pub fn get(&self, id: &str) -> Option<Arc<Slot>> {
        self.index.read().by_id.get(id).cloned()
    }

    /// Slot for `id`, linking a fresh vacant one if needed
    pub fn get_or_insert(&self, id: &str) -> Arc<Slot> {
        if let Some(slot) = self.get(id) {
            return slot;
        }
        let mut index = self.index.write();
        if let Some(slot) = index.by_id.get(id) {
            return Arc::clone(slot);
        }
        let seq = index.next_seq;
        index.next_seq += 1;
        let slot = Arc::new(Slot::new(id, seq));
        index.by_id.insert(id.to_string(), Arc::clone(&slot));
        index.order.insert(seq, Arc::clone(&slot));
        slot
    }

    /// Unlink `slot` if it is still linked and holds no document
    ///
    /// Returns true if the slot was retired. Callers must not hold the
    /// slot lock.
    pub fn retire_if_vacant(&self, slot: &Arc<Slot>) -> bool {
        let mut index = self.index.write();
        let linked = index
            .by_id
            .get(slot.id())
            .map_or(false, |current| Arc::ptr_eq(current, slot));
        if !linked {
            return false;
        }
        let mut state = slot.lock();
        if !state.is_vacant() {
            return false;
        }
        Slot::retire(&mut state);
        drop(state);
        index.by_id.remove(slot.id());
        index.order.remove(&slot.seq());
        true
    }

    /// Linked slots in creation order
    ///
    /// The returned list is a point-in-time copy of the index; slot
    /// contents are read later under each slot's own lock.
    pub fn slots(&self) -> Vec<Arc<Slot>> {
        self.index.read().order.values().cloned().collect()
    }

    /// Number of linked slots, including in-flight vacant ones
    pub fn slot_count(&self) -> usize {
        self.index.read().by_id.len()
    }

    /// Number of slots currently holding a document
    pub fn live_count(&self) -> usize {
        self.slots()
            .iter()
            .filter(|slot| !slot.lock().is_vacant())
            .count()
    }
}

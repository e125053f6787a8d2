//! Partition-sharded document storage
//!
//! # Design
//!
//! - DashMap: partitions sharded by partition-key value, reads of
//!   different partitions never contend
//! - Per-partition index: FxHashMap by id plus a creation-ordered map for scans
//! - Per-document mutex: every check-then-set on one document is serialized
//!
//! Partitions are created lazily on first write and never unlinked from the
//! map. An empty partition is simply not reported by [`PartitionedStore::partition_keys`].

use dashmap::DashMap;
use quire_core::{Document, PartitionKey};
use std::sync::Arc;

use crate::partition::Partition;
use crate::slot::SlotState;

/// Documents grouped by partition-key value
#[derive(Debug, Default)]
pub struct PartitionedStore {
    partitions: DashMap<PartitionKey, Arc<Partition>>,
}

impl PartitionedStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            partitions: DashMap::new(),
        }
    }

    /// Partition for `key`, if it has ever been written
    pub fn partition(&self, key: &PartitionKey) -> Option<Arc<Partition>> {
        self.partitions.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Partition for `key`, creating it if needed
    pub fn partition_or_create(&self, key: &PartitionKey) -> Arc<Partition> {
        if let Some(partition) = self.partition(key) {
            return partition;
        }
        let entry = self
            .partitions
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Partition::new(key.clone())));
        Arc::clone(entry.value())
    }

    // ========================================================================
    // Document access
    // ========================================================================

    /// Current document for (key, id)
    pub fn get(&self, key: &PartitionKey, id: &str) -> Option<Document> {
        self.partition(key)?.get(id)?.snapshot()
    }

    /// Run `f` under the lock of the slot for (key, id), creating the slot if
    /// needed
    ///
    /// If `f` leaves the slot vacant, the slot is unlinked afterwards.
    pub fn write<R>(&self, key: &PartitionKey, id: &str, f: impl FnOnce(&mut SlotState) -> R) -> R {
        let partition = self.partition_or_create(key);
        loop {
            let slot = partition.get_or_insert(id);
            let mut state = slot.lock();
            if state.is_retired() {
                continue;
            }
            let result = f(&mut state);
            let vacant = state.is_vacant();
            drop(state);
            if vacant {
                partition.retire_if_vacant(&slot);
            }
            return result;
        }
    }

    /// Run `f` under the lock of an existing slot for (key, id)
    ///
    /// Returns `None` without calling `f` when no slot is linked. `f` may
    /// still observe a vacant slot briefly left by a concurrent delete.
    pub fn write_existing<R>(
        &self,
        key: &PartitionKey,
        id: &str,
        f: impl FnOnce(&mut SlotState) -> R,
    ) -> Option<R> {
        let partition = self.partition(key)?;
        loop {
            let slot = partition.get(id)?;
            let mut state = slot.lock();
            if state.is_retired() {
                continue;
            }
            let result = f(&mut state);
            let vacant = state.is_vacant();
            drop(state);
            if vacant {
                partition.retire_if_vacant(&slot);
            }
            return Some(result);
        }
    }

    // ========================================================================
    // Partition enumeration
    // ========================================================================

    /// All partitions ordered by partition-key value
    pub fn partitions_sorted(&self) -> Vec<Arc<Partition>> {
        let mut partitions: Vec<_> = self
            .partitions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        partitions.sort_by(|a, b| a.key().cmp(b.key()));
        partitions
    }

    /// Partition-key values that currently hold at least one document
    pub fn partition_keys(&self) -> Vec<PartitionKey> {
        self.partitions_sorted()
            .into_iter()
            .filter(|partition| partition.live_count() > 0)
            .map(|partition| partition.key().clone())
            .collect()
    }

    /// Number of non-empty partitions
    pub fn partition_count(&self) -> usize {
        self.partition_keys().len()
    }

    /// Total stored documents across all partitions
    pub fn document_count(&self) -> usize {
        self.partitions_sorted()
            .iter()
            .map(|partition| partition.live_count())
            .sum()
    }
}

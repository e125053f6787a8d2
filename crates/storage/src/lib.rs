//! Storage layer for Quire
//!
//! This crate implements the in-memory document backend:
//! - PartitionedStore: DashMap of partitions keyed by partition-key value
//! - Partition: id index plus creation-ordered scan list
//! - Slot: per-document mutex serializing every read-modify-write
//!
//! # Concurrency
//!
//! - Different partitions never contend
//! - Different documents in one partition contend only on index updates
//! - Scans copy the slot list and lock each slot lazily

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod partition;
pub mod sharded;
pub mod slot;

pub use partition::Partition;
pub use sharded::PartitionedStore;
pub use slot::{Slot, SlotState};

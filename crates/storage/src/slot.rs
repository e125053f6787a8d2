//! Per-document storage cells
//!
//! A [`Slot`] holds at most one document for one (partition, id). Every
//! read and write of that document happens under the slot's mutex, which
//! makes check-then-set sequences (token checks, patch batches) atomic with
//! respect to other operations on the same document.
//!
//! A slot that has been removed from its partition index is *retired*.
//! Writers that lock a retired slot must go back to the index for a fresh
//! one; nothing is ever stored into a retired slot.

use parking_lot::{Mutex, MutexGuard};
use quire_core::Document;

/// Mutable contents of a slot
#[derive(Debug, Default)]
pub struct SlotState {
    document: Option<Document>,
    retired: bool,
}

impl SlotState {
    /// The stored document, if any
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// True once the slot has been unlinked from its partition
    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// True if no document is stored
    pub fn is_vacant(&self) -> bool {
        self.document.is_none()
    }

    /// Store a document, returning the previous one
    pub fn put(&mut self, document: Document) -> Option<Document> {
        debug_assert!(!self.retired, "write into retired slot");
        self.document.replace(document)
    }

    /// Remove the stored document
    pub fn take(&mut self) -> Option<Document> {
        self.document.take()
    }
}

/// Lockable cell for one document
#[derive(Debug)]
pub struct Slot {
    id: String,
    seq: u64,
    state: Mutex<SlotState>,
}

impl Slot {
    /// Create an empty slot
    ///
    /// `seq` orders slots within a partition by creation.
    pub fn new(id: impl Into<String>, seq: u64) -> Self {
        Self {
            id: id.into(),
            seq,
            state: Mutex::new(SlotState::default()),
        }
    }

    /// Document id this slot addresses
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Creation sequence within the partition
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Acquire the slot lock
    pub fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock()
    }

    /// Clone of the current document, taken under the lock
    pub fn snapshot(&self) -> Option<Document> {
        self.state.lock().document().cloned()
    }

    pub(crate) fn retire(state: &mut SlotState) {
        state.retired = true;
    }
}

//! Lazy query results
//!
//! A [`FeedIterator`] walks partitions in order. Each partition's slot list
//! is copied when the feed reaches it, and each slot is locked only while
//! its document is read, so every yielded document reflects one completed
//! write but the feed as a whole is not a point-in-time snapshot.

use quire_core::Document;
use quire_storage::{Partition, Slot};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::query::CompiledQuery;

/// Single-pass sequence of matching documents
pub struct FeedIterator {
    partitions: VecDeque<Arc<Partition>>,
    slots: std::vec::IntoIter<Arc<Slot>>,
    filter: CompiledQuery,
    page_size: usize,
    peeked: Option<Document>,
    done: bool,
}

impl FeedIterator {
    /// Feed over `partitions` in the given order
    pub fn new(partitions: Vec<Arc<Partition>>, filter: CompiledQuery, page_size: usize) -> Self {
        Self {
            partitions: partitions.into(),
            slots: Vec::new().into_iter(),
            filter,
            page_size: page_size.max(1),
            peeked: None,
            done: false,
        }
    }

    /// Documents returned per page
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// True if at least one more document will be yielded
    pub fn has_more_results(&mut self) -> bool {
        if self.peeked.is_none() {
            self.peeked = self.advance();
        }
        self.peeked.is_some()
    }

    /// Up to `page_size` documents; empty once the feed is drained
    pub fn next_page(&mut self) -> Vec<Document> {
        let page_size = self.page_size;
        self.by_ref().take(page_size).collect()
    }

    fn advance(&mut self) -> Option<Document> {
        if self.done {
            return None;
        }
        loop {
            for slot in self.slots.by_ref() {
                if let Some(document) = slot.snapshot() {
                    if self.filter.matches(document.body()) {
                        return Some(document);
                    }
                }
            }
            match self.partitions.pop_front() {
                Some(partition) => self.slots = partition.slots().into_iter(),
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

impl Iterator for FeedIterator {
    type Item = Document;

    fn next(&mut self) -> Option<Document> {
        self.peeked.take().or_else(|| self.advance())
    }
}

impl fmt::Debug for FeedIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedIterator")
            .field("filter", &self.filter.to_string())
            .field("remaining_partitions", &self.partitions.len())
            .field("page_size", &self.page_size)
            .field("done", &self.done)
            .finish()
    }
}

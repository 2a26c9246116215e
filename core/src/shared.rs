use crate::index::Index;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Published {
    index: Arc<Index>,
    generation: u64,
}

/// Publication point for the current index.
///
/// Readers take a cheap `Arc` snapshot and search it without holding any
/// lock. A rebuild builds a complete new [`Index`] elsewhere and swaps it in;
/// snapshots taken earlier keep the old index alive until they are dropped.
///
/// Each rebuild draws a ticket before it reads the corpus. A build is only
/// published if no build with a later ticket got there first, so a slow
/// rebuild over an older corpus snapshot never replaces a newer one.
#[derive(Debug, Clone)]
pub struct SharedIndex {
    inner: Arc<RwLock<Published>>,
    tickets: Arc<AtomicU64>,
}

impl SharedIndex {
    pub fn new(index: Index) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Published { index: Arc::new(index), generation: 0 })),
            tickets: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn snapshot(&self) -> Arc<Index> {
        self.inner.read().index.clone()
    }

    /// Reserve a generation for a rebuild about to start.
    pub fn ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish a build made under `ticket`. Returns the replaced index, or
    /// `None` when a build with a later ticket is already published.
    pub fn publish_as(&self, ticket: u64, index: Index) -> Option<Arc<Index>> {
        let mut current = self.inner.write();
        if ticket <= current.generation {
            tracing::info!(ticket, published = current.generation, "discarding superseded index build");
            return None;
        }
        current.generation = ticket;
        Some(std::mem::replace(&mut current.index, Arc::new(index)))
    }

    /// Replace the current index unconditionally, returning the previous one.
    pub fn publish(&self, index: Index) -> Arc<Index> {
        let mut current = self.inner.write();
        current.generation = self.ticket();
        std::mem::replace(&mut current.index, Arc::new(index))
    }
}

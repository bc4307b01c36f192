//! Received item log.
//!
//! The server numbers every item it sends this slot, starting at 0, and
//! delivers them in batches tagged with the index of their first item. The
//! log is the append-only local copy of that sequence. It may be read from
//! any thread while the dispatch thread appends to it.
//!
//! # Invariants
//!
//! - The log never contains gaps: a batch is appended only when its start
//!   index equals the current length
//! - Entries are never reordered or removed; a resync replaces the whole log
//!   through [`ItemLogHandle::replace`] instead
//! - Public positions are 1-based (`get(1)` is the first item received)

use std::sync::Arc;

use parking_lot::RwLock;

/// Result of offering a batch to the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Batch was contiguous and has been appended.
    Appended {
        /// Number of entries appended
        count: usize,
        /// Log length after the append
        len: usize,
    },
    /// Batch did not start where the log ends. Nothing was appended.
    Diverged {
        /// Index the log expected (its current length)
        expected: usize,
        /// Index the batch started at
        received: usize,
    },
}

/// Append-only sequence of items received from the server.
#[derive(Debug)]
pub struct ReceivedItems<T> {
    entries: RwLock<Vec<T>>,
}

impl<T> Default for ReceivedItems<T> {
    fn default() -> Self {
        Self { entries: RwLock::new(Vec::new()) }
    }
}

impl<T: Clone> ReceivedItems<T> {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items received.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if nothing has been received.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Item at 1-based `position`, or `None` if out of range.
    pub fn get(&self, position: usize) -> Option<T> {
        let index = position.checked_sub(1)?;
        self.entries.read().get(index).cloned()
    }

    /// Item following 1-based `position`.
    ///
    /// `next_after(0)` is the first item. Returns `None` once the caller has
    /// consumed everything received so far.
    pub fn next_after(&self, position: usize) -> Option<T> {
        self.entries.read().get(position).cloned()
    }

    /// Copy of every entry, in order.
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.read().clone()
    }

    /// Append `items` if `start_index` is exactly the current length.
    ///
    /// The length check and the append happen under one write lock.
    pub fn append_batch(&self, start_index: usize, items: Vec<T>) -> AppendOutcome {
        let mut entries = self.entries.write();
        let expected = entries.len();
        if start_index != expected {
            return AppendOutcome::Diverged { expected, received: start_index };
        }

        let count = items.len();
        entries.extend(items);
        AppendOutcome::Appended { count, len: entries.len() }
    }
}

/// Swappable reference to the current [`ReceivedItems`] log.
///
/// Readers take a cheap [`Arc`] to the current log. A resync installs a
/// fresh empty log; readers holding the old `Arc` keep a consistent (stale)
/// view and never observe a half-cleared log.
#[derive(Debug)]
pub struct ItemLogHandle<T> {
    current: RwLock<Arc<ReceivedItems<T>>>,
}

impl<T> Default for ItemLogHandle<T> {
    fn default() -> Self {
        Self { current: RwLock::new(Arc::new(ReceivedItems::default())) }
    }
}

impl<T: Clone> ItemLogHandle<T> {
    /// Create a handle to an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// The log currently installed.
    pub fn current(&self) -> Arc<ReceivedItems<T>> {
        Arc::clone(&self.current.read())
    }

    /// Install a fresh empty log and return the one it replaced.
    pub fn replace(&self) -> Arc<ReceivedItems<T>> {
        std::mem::replace(&mut *self.current.write(), Arc::new(ReceivedItems::new()))
    }
}

//! Undo journal for datastore transactions

use crate::types::Address;

/// One reversible datastore mutation
#[derive(Debug, Clone)]
pub(crate) enum JournalEntry {
    /// A page was stored at this address
    Inserted(Address),
    /// A promise was aliased to a value
    Resolved(Address),
    /// A waiter was appended to a promise's promisee list
    PromiseeAdded { promise: Address, waiter: Address },
    /// A waiter was removed from position `index`
    PromiseeRemoved {
        promise: Address,
        waiter: Address,
        index: usize,
    },
    /// All waiters of a promise were taken on resolution
    PromiseesTaken {
        promise: Address,
        waiters: Vec<Address>,
    },
}

/// Mutations recorded since the last `begin()`
#[derive(Debug, Default)]
pub(crate) struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub(crate) fn record(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// Entries in undo order (most recent first)
    pub(crate) fn drain_reversed(&mut self) -> impl Iterator<Item = JournalEntry> + '_ {
        self.entries.drain(..).rev()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

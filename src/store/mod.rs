//! Datastore
//!
//! In-memory, content-addressed store of immutable pages. Besides pages it
//! keeps the alias table (resolved promises), the promisee registry (who is
//! waiting for which promise) and an undo journal so callers can make a group
//! of mutations all-or-nothing.

mod journal;

use crate::error::StorageError;
use crate::page::id::{compute_page_address, compute_promise_address};
use crate::page::{Page, Promise};
use crate::types::Address;
use journal::{Journal, JournalEntry};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, trace};

/// Content-addressed page store with promises and aliases
#[derive(Debug, Default)]
pub struct Datastore {
    pages: HashMap<Address, Page>,
    aliases: HashMap<Address, Address>,
    promisees: HashMap<Address, Vec<Address>>,
    next_promise: u64,
    journal: Option<Journal>,
}

impl Datastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored pages, promises included
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.pages.contains_key(address)
    }

    /// Store a page and return its address
    ///
    /// Structurally equal content (after canonicalizing every referenced
    /// address) returns the existing address. An unresolved promise always
    /// gets a fresh address; a resolved one is a fresh promise aliased to its
    /// value.
    pub fn insert(&mut self, page: Page) -> Result<Address, StorageError> {
        if let Page::Promise(promise) = page {
            let address = self.make_promise();
            if let Some(value) = promise.resolved_value {
                self.resolve_promise(address, value)?;
            }
            return Ok(address);
        }

        let address = compute_page_address(&page, |link| self.canonicalize(link))?;
        if self.pages.contains_key(&address) {
            trace!(address = %address, "Deduplicated page");
            return Ok(address);
        }

        debug!(address = %address, links = page.links().len(), "Inserted page");
        self.pages.insert(address, page);
        self.record(JournalEntry::Inserted(address));
        Ok(address)
    }

    /// Allocate a fresh unresolved promise
    pub fn make_promise(&mut self) -> Address {
        let address = loop {
            self.next_promise += 1;
            let candidate = compute_promise_address(self.next_promise);
            if !self.pages.contains_key(&candidate) {
                break candidate;
            }
        };
        self.pages.insert(address, Page::Promise(Promise::default()));
        self.record(JournalEntry::Inserted(address));
        address
    }

    /// Return the page an address denotes, following aliases
    pub fn dereference(&self, address: Address) -> Result<&Page, StorageError> {
        let canonical = self.canonicalize(address)?;
        self.pages
            .get(&canonical)
            .ok_or(StorageError::UnknownAddress(canonical))
    }

    /// Follow the alias table to a fixed point
    pub fn canonicalize(&self, address: Address) -> Result<Address, StorageError> {
        let mut current = address;
        let mut steps = 0;
        while let Some(next) = self.aliases.get(&current) {
            steps += 1;
            if steps > self.aliases.len() {
                return Err(StorageError::BrokenAliasChain(address));
            }
            current = *next;
        }
        if !self.pages.contains_key(&current) {
            return Err(StorageError::UnknownAddress(current));
        }
        Ok(current)
    }

    /// False only for promises that have not been resolved yet
    pub fn is_resolved(&self, address: Address) -> Result<bool, StorageError> {
        Ok(!matches!(self.dereference(address)?, Page::Promise(_)))
    }

    /// Alias `promise` to `value` and hand back everyone who was waiting
    ///
    /// Promises are single-assignment, and a value may not contain its own
    /// promise (the page graph must stay acyclic).
    pub fn resolve_promise(
        &mut self,
        promise: Address,
        value: Address,
    ) -> Result<Vec<Address>, StorageError> {
        match self.pages.get(&promise) {
            None => return Err(StorageError::UnknownAddress(promise)),
            Some(Page::Promise(Promise {
                resolved_value: Some(_),
            })) => return Err(StorageError::PromiseAlreadyResolved(promise)),
            Some(Page::Promise(_)) => {}
            Some(_) => return Err(StorageError::NotAPromise(promise)),
        }
        if self.aliases.contains_key(&promise) {
            return Err(StorageError::PromiseAlreadyResolved(promise));
        }
        self.canonicalize(value)?;
        if self.reaches(value, promise)? {
            return Err(StorageError::CyclicAlias { promise, value });
        }

        self.aliases.insert(promise, value);
        self.pages.insert(
            promise,
            Page::Promise(Promise {
                resolved_value: Some(value),
            }),
        );
        self.record(JournalEntry::Resolved(promise));

        let waiters = self.promisees.remove(&promise).unwrap_or_default();
        if !waiters.is_empty() {
            self.record(JournalEntry::PromiseesTaken {
                promise,
                waiters: waiters.clone(),
            });
        }
        debug!(
            promise = %promise,
            value = %value,
            waiters = waiters.len(),
            "Resolved promise"
        );
        Ok(waiters)
    }

    /// Whether anyone is still waiting for this promise
    pub fn has_promisees(&self, promise: Address) -> bool {
        self.promisees
            .get(&promise)
            .map_or(false, |waiters| !waiters.is_empty())
    }

    /// Record that `waiter` needs the value of `promise`
    ///
    /// Registering the same waiter twice is a no-op.
    pub fn register_promisee(&mut self, promise: Address, waiter: Address) {
        let waiters = self.promisees.entry(promise).or_default();
        if waiters.contains(&waiter) {
            return;
        }
        waiters.push(waiter);
        trace!(promise = %promise, waiter = %waiter, "Registered promisee");
        self.record(JournalEntry::PromiseeAdded { promise, waiter });
    }

    /// Withdraw a registration made with [`Datastore::register_promisee`]
    pub fn unregister_promisee(&mut self, promise: Address, waiter: Address) {
        let Some(waiters) = self.promisees.get_mut(&promise) else {
            return;
        };
        let Some(index) = waiters.iter().position(|w| *w == waiter) else {
            return;
        };
        waiters.remove(index);
        if waiters.is_empty() {
            self.promisees.remove(&promise);
        }
        self.record(JournalEntry::PromiseeRemoved {
            promise,
            waiter,
            index,
        });
    }

    /// Start recording mutations so they can be rolled back
    pub fn begin(&mut self) {
        self.journal = Some(Journal::default());
    }

    /// Keep every mutation since `begin()`
    pub fn commit(&mut self) {
        if let Some(journal) = self.journal.take() {
            trace!(mutations = journal.len(), "Committed datastore transaction");
        }
    }

    /// Undo every mutation since `begin()`
    pub fn rollback(&mut self) {
        let Some(mut journal) = self.journal.take() else {
            return;
        };
        let undone = journal.len();
        for entry in journal.drain_reversed() {
            match entry {
                JournalEntry::Inserted(address) => {
                    self.pages.remove(&address);
                }
                JournalEntry::Resolved(promise) => {
                    self.aliases.remove(&promise);
                    self.pages
                        .insert(promise, Page::Promise(Promise::default()));
                }
                JournalEntry::PromiseeAdded { promise, waiter } => {
                    if let Some(waiters) = self.promisees.get_mut(&promise) {
                        if let Some(index) = waiters.iter().rposition(|w| *w == waiter) {
                            waiters.remove(index);
                        }
                        if waiters.is_empty() {
                            self.promisees.remove(&promise);
                        }
                    }
                }
                JournalEntry::PromiseeRemoved {
                    promise,
                    waiter,
                    index,
                } => {
                    let waiters = self.promisees.entry(promise).or_default();
                    let index = index.min(waiters.len());
                    waiters.insert(index, waiter);
                }
                JournalEntry::PromiseesTaken { promise, waiters } => {
                    self.promisees.insert(promise, waiters);
                }
            }
        }
        debug!(mutations = undone, "Rolled back datastore transaction");
    }

    fn record(&mut self, entry: JournalEntry) {
        if let Some(journal) = self.journal.as_mut() {
            journal.record(entry);
        }
    }

    /// Whether `target` is reachable from `start` through links and aliases
    fn reaches(&self, start: Address, target: Address) -> Result<bool, StorageError> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(address) = queue.pop_front() {
            if address == target || self.canonicalize(address)? == target {
                return Ok(true);
            }
            if !seen.insert(address) {
                continue;
            }
            queue.extend(self.dereference(address)?.links());
        }
        Ok(false)
    }
}

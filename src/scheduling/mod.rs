//! Scheduling
//!
//! The [`Scheduler`] owns the datastore and everything that outlives a single
//! session: the automation cache and the cancellation token. Work happens in
//! a [`Session`], which borrows the scheduler for as long as one root question
//! is being answered.

mod action;
mod cancel;
mod session;

pub use crate::config::SchedulerConfig;
pub use action::Action;
pub use cancel::CancellationToken;
pub use session::{Outcome, Session, SessionSummary};

use crate::store::Datastore;
use std::collections::HashMap;

/// Shared state for answering root questions one session at a time
#[derive(Debug, Default)]
pub struct Scheduler {
    db: Datastore,
    /// Context display -> action last taken in a context that looked like that
    cache: HashMap<String, Action>,
    config: SchedulerConfig,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(db: Datastore) -> Self {
        Self::with_config(db, SchedulerConfig::default())
    }

    pub fn with_config(db: Datastore, config: SchedulerConfig) -> Self {
        Self {
            db,
            cache: HashMap::new(),
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn db(&self) -> &Datastore {
        &self.db
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Token that cancels whatever this scheduler is running
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The action recorded for a context display, if any
    pub fn cached_action(&self, display: &str) -> Option<&Action> {
        self.cache.get(display)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Forget every recorded action
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Start answering `question`
    pub fn open_session(&mut self, question: &str) -> Result<Session<'_>, crate::error::SchedulerError> {
        Session::open(self, question)
    }
}

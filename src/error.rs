//! Error types for the quilt question decomposition engine.

use crate::types::Address;
use thiserror::Error;

/// Datastore errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Unknown address: {0}")]
    UnknownAddress(Address),

    #[error("Alias chain starting at {0} never reaches a page")]
    BrokenAliasChain(Address),

    #[error("Promise {0} is already resolved")]
    PromiseAlreadyResolved(Address),

    #[error("Address {0} is not a promise")]
    NotAPromise(Address),

    #[error("Resolving promise {promise} to {value} would make the value contain its own promise")]
    CyclicAlias { promise: Address, value: Address },
}

impl StorageError {
    /// Internal-consistency faults. Anything else is caused by user input.
    pub fn is_fatal(&self) -> bool {
        match self {
            StorageError::UnknownAddress(_)
            | StorageError::BrokenAliasChain(_)
            | StorageError::PromiseAlreadyResolved(_)
            | StorageError::NotAPromise(_) => true,
            StorageError::CyclicAlias { .. } => false,
        }
    }
}

/// Hypertext parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HypertextError {
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("Unknown pointer: {0}")]
    UnknownPointer(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors producing a serialized view of a context
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Scheduler and session errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("Unknown pointer: {0}")]
    UnknownPointer(String),

    #[error("Pointer {0} is already unlocked")]
    AlreadyUnlocked(String),

    #[error("Pointer {0} cannot be asked as a subquestion")]
    UnaskableReference(String),

    #[error("Action resulted in an infinite loop: {0}")]
    InfiniteLoop(String),

    #[error("Recursion depth limit of {0} exceeded")]
    DepthExceeded(usize),

    #[error("Automation stopped after {0} replayed actions")]
    BudgetExhausted(usize),

    #[error("Action cancelled")]
    Cancelled,

    #[error("Fell off the stack: no blocking context left while the root question is unanswered")]
    FellOffStack,

    #[error("Session was aborted by an earlier internal fault")]
    SessionAborted,

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Hypertext error: {0}")]
    Hypertext(HypertextError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SchedulerError {
    /// Whether the error indicates a violated invariant. Fatal errors abort the
    /// session; everything else leaves it usable.
    pub fn is_fatal(&self) -> bool {
        match self {
            SchedulerError::FellOffStack | SchedulerError::SessionAborted => true,
            SchedulerError::Storage(e) => e.is_fatal(),
            SchedulerError::Hypertext(HypertextError::Storage(e)) => e.is_fatal(),
            _ => false,
        }
    }
}

impl From<HypertextError> for SchedulerError {
    fn from(err: HypertextError) -> Self {
        match err {
            HypertextError::UnknownPointer(name) => SchedulerError::UnknownPointer(name),
            HypertextError::Storage(e) => SchedulerError::Storage(e),
            other => SchedulerError::Hypertext(other),
        }
    }
}

/// Configuration and logging setup errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

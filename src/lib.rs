//! Quilt: Recursive Question Decomposition
//!
//! Questions are answered by splitting them into subquestions, each worked on
//! in its own workspace that only sees what was explicitly unlocked. All data
//! lives in a content-addressed store of immutable pages; answers that do not
//! exist yet are promises, resolved exactly once.
//!
//! ```no_run
//! use quilt::scheduling::{Action, Scheduler};
//! use quilt::store::Datastore;
//!
//! let mut scheduler = Scheduler::new(Datastore::new());
//! let mut session = scheduler.open_session("What is 351 * 5019?")?;
//! session.act(Action::AskSubquestion("What is 300 * 5019?".into()))?;
//! # Ok::<(), quilt::error::SchedulerError>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod hypertext;
pub mod logging;
pub mod page;
pub mod scheduling;
pub mod store;
pub mod types;

pub use config::{ConfigLoader, QuiltConfig, SchedulerConfig};
pub use context::Context;
pub use error::{ConfigError, HypertextError, RenderError, SchedulerError, StorageError};
pub use scheduling::{Action, CancellationToken, Outcome, Scheduler, Session, SessionSummary};
pub use store::Datastore;
pub use types::Address;

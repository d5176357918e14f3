//! Sessions
//!
//! A session answers one root question. Open contexts live on a stack of
//! slots; the top slot is the current context, and a slot whose context
//! unlocked a pending promise is suspended until that promise resolves.
//! Subquestions are scheduled lazily: asking pushes the sub-context below the
//! asking one, and it only becomes current once somebody waits for its answer.
//!
//! Every [`Session::act`] is all-or-nothing. The datastore records an undo
//! journal and the session snapshots its own state, so a failed action leaves
//! no trace.

use super::{Action, Scheduler};
use crate::context::{workspace_page, Context, ContextId};
use crate::error::{SchedulerError, StorageError};
use crate::hypertext::{insert_raw_hypertext, parse, render_anonymous, Piece};
use crate::page::{Page, RawHypertext, Subquestion, Workspace};
use crate::store::Datastore;
use crate::types::Address;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use tracing::{debug, info, trace, warn};

/// Result of a successful action
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The context to work in next
    Context(Context),
    /// The root question is answered; carries the final answer text
    Finished(String),
}

impl Outcome {
    pub fn context(&self) -> Option<&Context> {
        match self {
            Outcome::Context(context) => Some(context),
            Outcome::Finished(_) => None,
        }
    }

    pub fn final_answer(&self) -> Option<&str> {
        match self {
            Outcome::Finished(answer) => Some(answer),
            Outcome::Context(_) => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Outcome::Finished(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Context(context) => context.fmt(f),
            Outcome::Finished(answer) => f.write_str(answer),
        }
    }
}

/// What is left of a session once it is closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub root_answer: Option<String>,
    pub fulfilled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    context: ContextId,
    /// Unresolved promise this slot unlocked and now waits for
    waiting_on: Option<Address>,
}

impl Slot {
    fn ready(context: ContextId) -> Self {
        Self {
            context,
            waiting_on: None,
        }
    }

    fn is_ready(&self) -> bool {
        self.waiting_on.is_none()
    }
}

struct Snapshot {
    stack: Vec<Slot>,
    contexts: usize,
    registrations: usize,
    root_answer: Option<String>,
}

/// An open root question
pub struct Session<'s> {
    scheduler: &'s mut Scheduler,
    /// Every context this session has built; [`ContextId`]s index into it
    contexts: Vec<Context>,
    stack: Vec<Slot>,
    root_workspace: Address,
    root_answer_promise: Address,
    root_answer: Option<String>,
    /// (promise, waiter) pairs registered with the datastore
    registrations: Vec<(Address, Address)>,
    /// Cache entries overwritten by the running action, for rollback
    cache_log: Vec<(String, Option<Action>)>,
    aborted: bool,
}

impl<'s> Session<'s> {
    /// Create the root workspace for `question` and run automation on it
    ///
    /// If recorded actions answer the question outright the session comes
    /// back already fulfilled.
    pub fn open(scheduler: &'s mut Scheduler, question: &str) -> Result<Self, SchedulerError> {
        scheduler.db.begin();
        let root = match create_root(&mut scheduler.db, question) {
            Ok(root) => root,
            Err(e) => {
                scheduler.db.rollback();
                warn!(error = %e, "Failed to open session");
                return Err(e);
            }
        };
        let (root_workspace, root_answer_promise, context) = root;

        let mut session = Session {
            scheduler,
            contexts: vec![context],
            stack: vec![Slot::ready(ContextId(0))],
            root_workspace,
            root_answer_promise,
            root_answer: None,
            registrations: Vec::new(),
            cache_log: Vec::new(),
            aborted: false,
        };
        session.register(root_answer_promise, root_workspace);

        match session.automate() {
            Ok(()) => {
                session.scheduler.db.commit();
                info!(
                    workspace = %root_workspace,
                    fulfilled = session.is_fulfilled(),
                    "Opened session"
                );
                Ok(session)
            }
            Err(e) => {
                session.scheduler.db.rollback();
                session.registrations.clear();
                warn!(error = %e, "Automation failed while opening session");
                Err(e)
            }
        }
    }

    /// Apply one action to the current context
    pub fn act(&mut self, action: Action) -> Result<Outcome, SchedulerError> {
        if self.aborted {
            return Err(SchedulerError::SessionAborted);
        }
        if self.is_fulfilled() {
            return Err(SchedulerError::InvalidAction(
                "the root question is already answered".to_string(),
            ));
        }

        debug!(action = %action, "Dispatching action");
        let snapshot = self.snapshot();
        self.cache_log.clear();
        self.scheduler.db.begin();

        match self.act_and_automate(action) {
            Ok(outcome) => {
                self.scheduler.db.commit();
                Ok(outcome)
            }
            Err(e) => {
                self.scheduler.db.rollback();
                self.restore(snapshot);
                if e.is_fatal() {
                    self.aborted = true;
                    warn!(error = %e, "Session aborted");
                } else {
                    warn!(error = %e, "Rejected action");
                }
                Err(e)
            }
        }
    }

    /// The context to act in next; `None` once the root question is answered
    pub fn current_context(&self) -> Option<&Context> {
        if self.is_fulfilled() {
            return None;
        }
        self.stack
            .last()
            .and_then(|slot| self.contexts.get(slot.context.index()))
    }

    /// Final answer text, set once the root answer is complete
    pub fn root_answer(&self) -> Option<&str> {
        self.root_answer.as_deref()
    }

    pub fn is_fulfilled(&self) -> bool {
        self.root_answer.is_some()
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Number of open contexts, suspended ones included
    pub fn open_contexts(&self) -> usize {
        self.stack.len()
    }

    pub fn db(&self) -> &Datastore {
        &self.scheduler.db
    }

    /// Close the session
    pub fn finish(self) -> SessionSummary {
        SessionSummary {
            root_answer: self.root_answer.clone(),
            fulfilled: self.is_fulfilled(),
        }
    }

    fn act_and_automate(&mut self, action: Action) -> Result<Outcome, SchedulerError> {
        let display = self.current()?.to_string();
        if self.dispatch(&action)? {
            self.record(display, action);
        }
        self.automate()?;
        self.outcome()
    }

    /// Run one action; false if it changed nothing
    fn dispatch(&mut self, action: &Action) -> Result<bool, SchedulerError> {
        match action {
            Action::AskSubquestion(text) => self.ask(text),
            Action::Reply(text) => self.reply(text).map(|_| true),
            Action::Unlock(name) => self.unlock(name).map(|_| true),
            Action::Scratch(text) => self.scratch(text).map(|_| true),
        }
    }

    /// Replay recorded actions while the current context has been seen before
    fn automate(&mut self) -> Result<(), SchedulerError> {
        if !self.scheduler.config.automation {
            return Ok(());
        }

        let mut steps = 0;
        while !self.is_fulfilled() {
            let display = self.current()?.to_string();
            let Some(action) = self.scheduler.cache.get(&display).cloned() else {
                return Ok(());
            };

            self.check_cancelled()?;
            if steps >= self.scheduler.config.max_automated_steps {
                return Err(SchedulerError::BudgetExhausted(steps));
            }

            steps += 1;
            trace!(action = %action, step = steps, "Replaying recorded action");
            self.dispatch(&action)?;

            if !self.is_fulfilled() && self.current()?.to_string() == display {
                trace!(action = %action, "Replay changed nothing; stopping automation");
                return Ok(());
            }
        }
        Ok(())
    }

    fn ask(&mut self, text: &str) -> Result<bool, SchedulerError> {
        self.check_cancelled()?;
        let current = self.current()?.clone();
        let db = &mut self.scheduler.db;
        let workspace = workspace_page(db, current.workspace())?.clone();

        if let Some(name) = lone_pointer(text)? {
            if let Some(&address) = current.name_pointers().get(&name) {
                let address = db.canonicalize(address)?;
                if address == db.canonicalize(current.workspace())?
                    || address == db.canonicalize(workspace.question)?
                {
                    return Err(SchedulerError::UnaskableReference(name));
                }
            }
        }

        let question = insert_raw_hypertext(text, db, current.name_pointers())?;
        let canonical = db.canonicalize(question)?;
        for sub in &workspace.subquestions {
            if db.canonicalize(sub.question)? == canonical {
                debug!(question = %question, "Subquestion already asked here");
                return Ok(false);
            }
        }

        let sub_workspace = create_workspace(db, question, Some(current.workspace()))?;
        let sub_page = workspace_page(db, sub_workspace)?;
        let subquestion = Subquestion {
            question,
            answer: sub_page.answer_promise,
            workspace: sub_page.final_workspace_promise,
        };
        let next_workspace = db.insert(workspace.with_subquestion(subquestion).into())?;

        let mut unlocked = current.unlocked_locations_from_workspace(next_workspace, db)?;
        unlocked.insert(question);
        let parent = Context::new(next_workspace, db, Some(unlocked), current.parent())?;
        let parent_id = push_context(&mut self.contexts, parent);

        let child = Context::new(sub_workspace, db, None, Some(parent_id))?;
        if child.is_own_ancestor(&self.contexts, db)? {
            return Err(SchedulerError::InfiniteLoop(render_anonymous(question, db)?));
        }
        if let Some(max_depth) = self.scheduler.config.max_depth {
            if child.depth(&self.contexts) > max_depth {
                return Err(SchedulerError::DepthExceeded(max_depth));
            }
        }
        let child_id = push_context(&mut self.contexts, child);

        self.stack.pop();
        self.stack.push(Slot::ready(child_id));
        self.stack.push(Slot::ready(parent_id));
        debug!(
            question = %question,
            workspace = %sub_workspace,
            open = self.stack.len(),
            "Asked subquestion"
        );
        Ok(true)
    }

    fn reply(&mut self, text: &str) -> Result<(), SchedulerError> {
        self.check_cancelled()?;
        let current = self.current()?.clone();
        let db = &mut self.scheduler.db;
        let workspace = workspace_page(db, current.workspace())?.clone();

        let answer = insert_raw_hypertext(text, db, current.name_pointers())?;
        db.resolve_promise(workspace.answer_promise, answer)?;
        db.resolve_promise(workspace.final_workspace_promise, current.workspace())?;
        self.stack.pop();
        debug!(workspace = %current.workspace(), answer = %answer, "Replied");

        let resolved = [workspace.answer_promise, workspace.final_workspace_promise];
        for slot in self.stack.iter_mut() {
            let Some(promise) = slot.waiting_on else {
                continue;
            };
            if !resolved.contains(&promise) {
                continue;
            }
            let waiting = &self.contexts[slot.context.index()];
            let woken = waiting.with_unlocked(db, waiting.unlocked_locations().clone())?;
            *slot = Slot::ready(push_context(&mut self.contexts, woken));
            trace!(promise = %promise, "Woke waiting context");
        }

        if db.is_resolved(self.root_answer_promise)? {
            let pending = pending_promises(db, self.root_answer_promise)?;
            if pending.is_empty() {
                let answer = render_anonymous(self.root_answer_promise, db)?;
                info!(answer = %answer, "Root question answered");
                self.root_answer = Some(format!("The final answer is: {}", answer));
                self.stack.clear();
                return Ok(());
            }
            for promise in pending {
                self.register(promise, self.root_workspace);
            }
        }

        self.schedule_next()
    }

    fn unlock(&mut self, name: &str) -> Result<(), SchedulerError> {
        let current = self.current()?.clone();
        let address = *current
            .name_pointers()
            .get(name)
            .ok_or_else(|| SchedulerError::UnknownPointer(name.to_string()))?;
        if current.is_unlocked(&address) {
            return Err(SchedulerError::AlreadyUnlocked(name.to_string()));
        }

        let db = &self.scheduler.db;
        let mut unlocked = current.unlocked_locations().clone();
        unlocked.insert(address);
        let rebuilt = current.with_unlocked(db, unlocked)?;
        let pending = !db.is_resolved(address)?;
        self.replace_current(rebuilt)?;

        if pending {
            self.register(address, current.workspace());
            if let Some(top) = self.stack.last_mut() {
                top.waiting_on = Some(address);
            }
            debug!(pointer = name, promise = %address, "Waiting for unresolved promise");
            self.schedule_next()?;
        }
        Ok(())
    }

    fn scratch(&mut self, text: &str) -> Result<(), SchedulerError> {
        let current = self.current()?.clone();
        let db = &mut self.scheduler.db;
        let workspace = workspace_page(db, current.workspace())?.clone();

        let scratchpad = insert_raw_hypertext(text, db, current.name_pointers())?;
        let next_workspace = db.insert(workspace.with_scratchpad(scratchpad).into())?;
        let unlocked = current.unlocked_locations_by_address(next_workspace, db, &[scratchpad])?;
        let rebuilt = Context::new(next_workspace, db, Some(unlocked), current.parent())?;
        self.replace_current(rebuilt)
    }

    /// Make the nearest ready slot that somebody waits on current
    fn schedule_next(&mut self) -> Result<(), SchedulerError> {
        let db = &self.scheduler.db;
        let mut chosen = None;
        for (index, slot) in self.stack.iter().enumerate().rev() {
            if slot.is_ready() && self.contexts[slot.context.index()].is_blocking(db)? {
                chosen = Some(index);
                break;
            }
        }

        let index = chosen.ok_or(SchedulerError::FellOffStack)?;
        let slot = self.stack.remove(index);
        self.stack.push(slot);
        trace!(open = self.stack.len(), "Scheduled next context");
        Ok(())
    }

    fn current(&self) -> Result<&Context, SchedulerError> {
        self.stack
            .last()
            .and_then(|slot| self.contexts.get(slot.context.index()))
            .ok_or(SchedulerError::FellOffStack)
    }

    fn replace_current(&mut self, context: Context) -> Result<(), SchedulerError> {
        let id = push_context(&mut self.contexts, context);
        let top = self.stack.last_mut().ok_or(SchedulerError::FellOffStack)?;
        top.context = id;
        Ok(())
    }

    fn outcome(&self) -> Result<Outcome, SchedulerError> {
        match &self.root_answer {
            Some(answer) => Ok(Outcome::Finished(answer.clone())),
            None => Ok(Outcome::Context(self.current()?.clone())),
        }
    }

    fn register(&mut self, promise: Address, waiter: Address) {
        self.scheduler.db.register_promisee(promise, waiter);
        if !self.registrations.contains(&(promise, waiter)) {
            self.registrations.push((promise, waiter));
        }
    }

    fn record(&mut self, display: String, action: Action) {
        let previous = self.scheduler.cache.insert(display.clone(), action);
        self.cache_log.push((display, previous));
    }

    fn check_cancelled(&self) -> Result<(), SchedulerError> {
        if self.scheduler.cancel.is_cancelled() {
            return Err(SchedulerError::Cancelled);
        }
        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            stack: self.stack.clone(),
            contexts: self.contexts.len(),
            registrations: self.registrations.len(),
            root_answer: self.root_answer.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.stack = snapshot.stack;
        self.contexts.truncate(snapshot.contexts);
        self.registrations.truncate(snapshot.registrations);
        self.root_answer = snapshot.root_answer;
        for (display, previous) in self.cache_log.drain(..).rev() {
            match previous {
                Some(action) => self.scheduler.cache.insert(display, action),
                None => self.scheduler.cache.remove(&display),
            };
        }
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        for (promise, waiter) in self.registrations.drain(..) {
            self.scheduler.db.unregister_promisee(promise, waiter);
        }
        debug!(fulfilled = self.root_answer.is_some(), "Closed session");
    }
}

fn push_context(contexts: &mut Vec<Context>, context: Context) -> ContextId {
    contexts.push(context);
    ContextId(contexts.len() - 1)
}

fn create_root(
    db: &mut Datastore,
    question: &str,
) -> Result<(Address, Address, Context), SchedulerError> {
    let question = insert_raw_hypertext(question, db, &HashMap::new())?;
    let workspace = create_workspace(db, question, None)?;
    let answer_promise = workspace_page(db, workspace)?.answer_promise;
    let context = Context::new(workspace, db, None, None)?;
    Ok((workspace, answer_promise, context))
}

/// Fresh workspace with an empty scratchpad and its own pair of promises
fn create_workspace(
    db: &mut Datastore,
    question: Address,
    predecessor: Option<Address>,
) -> Result<Address, StorageError> {
    let scratchpad = db.insert(RawHypertext::empty().into())?;
    let answer_promise = db.make_promise();
    let final_workspace_promise = db.make_promise();
    db.insert(
        Workspace {
            question,
            scratchpad,
            subquestions: Vec::new(),
            answer_promise,
            final_workspace_promise,
            predecessor,
        }
        .into(),
    )
}

/// The pointer name if `text` is nothing but a single pointer
fn lone_pointer(text: &str) -> Result<Option<String>, SchedulerError> {
    let pieces = parse(text)?;
    let mut significant = pieces
        .iter()
        .filter(|piece| !matches!(piece, Piece::Text(t) if t.trim().is_empty()));
    match (significant.next(), significant.next()) {
        (Some(Piece::Pointer { name, .. }), None) => Ok(Some(name.clone())),
        _ => Ok(None),
    }
}

/// Unresolved promises an answer still depends on
///
/// Follows hypertext links and resolved promises; workspaces count as
/// complete values and are not entered.
fn pending_promises(db: &Datastore, root: Address) -> Result<Vec<Address>, StorageError> {
    let mut pending = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([root]);
    while let Some(address) = queue.pop_front() {
        if !seen.insert(address) {
            continue;
        }
        match db.dereference(address)? {
            Page::Promise(_) => pending.push(address),
            Page::RawHypertext(hypertext) => queue.extend(hypertext.links()),
            Page::Workspace(_) => {}
        }
    }
    Ok(pending)
}

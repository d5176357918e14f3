//! Contexts
//!
//! A context is the view of one workspace at one point of the recursion: which
//! locations are unlocked (shown with content rather than as a bare pointer)
//! and which short name every visible address goes by. Contexts are derived
//! data, rebuilt from the datastore and an unlock set whenever anything
//! changes; they are never edited in place.

mod data;

pub use data::{ContextData, SubquestionData};

use crate::error::{RenderError, StorageError};
use crate::hypertext::{make_link_data, visit_unlocked_region, Link};
use crate::page::Workspace;
use crate::store::Datastore;
use crate::types::Address;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Index of a context in its session's context arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub(crate) usize);

impl ContextId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Pointer naming maps for one workspace
type Naming = (HashMap<Address, String>, HashMap<String, Address>);

/// A named-visibility view rooted at one workspace
#[derive(Debug, Clone)]
pub struct Context {
    workspace: Address,
    unlocked_locations: HashSet<Address>,
    pointer_names: HashMap<Address, String>,
    name_pointers: HashMap<String, Address>,
    display: String,
    parent: Option<ContextId>,
}

impl Context {
    /// Build the context for `workspace`
    ///
    /// Without an explicit unlock set the default is visible: the workspace
    /// itself, its question, scratchpad and predecessor, and the question of
    /// every subquestion. The workspace is always unlocked.
    pub fn new(
        workspace: Address,
        db: &Datastore,
        unlocked_locations: Option<HashSet<Address>>,
        parent: Option<ContextId>,
    ) -> Result<Self, StorageError> {
        let root = workspace_page(db, workspace)?;
        let unlocked_locations = match unlocked_locations {
            Some(mut unlocked) => {
                unlocked.insert(workspace);
                unlocked
            }
            None => default_unlocked(workspace, root),
        };

        Self::build(workspace, db, unlocked_locations, parent, None)
    }

    /// Rebuild the same workspace with a different unlock set
    ///
    /// Every pointer name that is still visible keeps its meaning; pages that
    /// become visible get fresh `$n` names counting on from the highest name
    /// this context has handed out. Also used to refresh a context after a
    /// promise it shows has been resolved.
    pub fn with_unlocked(
        &self,
        db: &Datastore,
        mut unlocked_locations: HashSet<Address>,
    ) -> Result<Self, StorageError> {
        unlocked_locations.insert(self.workspace);
        Self::build(
            self.workspace,
            db,
            unlocked_locations,
            self.parent,
            Some(&self.pointer_names),
        )
    }

    fn build(
        workspace: Address,
        db: &Datastore,
        unlocked_locations: HashSet<Address>,
        parent: Option<ContextId>,
        previous: Option<&HashMap<Address, String>>,
    ) -> Result<Self, StorageError> {
        let (pointer_names, name_pointers) =
            name_pointers(workspace, workspace, db, &unlocked_locations, previous)?;

        let mut context = Self {
            workspace,
            unlocked_locations,
            pointer_names,
            name_pointers,
            display: String::new(),
            parent,
        };
        context.display = context.to_data(db)?.to_string();
        Ok(context)
    }

    pub fn workspace(&self) -> Address {
        self.workspace
    }

    pub fn unlocked_locations(&self) -> &HashSet<Address> {
        &self.unlocked_locations
    }

    pub fn is_unlocked(&self, address: &Address) -> bool {
        self.unlocked_locations.contains(address)
    }

    pub fn pointer_names(&self) -> &HashMap<Address, String> {
        &self.pointer_names
    }

    pub fn name_pointers(&self) -> &HashMap<String, Address> {
        &self.name_pointers
    }

    pub fn parent(&self) -> Option<ContextId> {
        self.parent
    }

    /// Names that are visible but not unlocked, sorted
    pub fn locked_pointers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .name_pointers
            .iter()
            .filter(|(_, address)| !self.unlocked_locations.contains(address))
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Carry this context's unlock set over to another workspace
    ///
    /// The two workspaces are walked in lockstep; whatever is unlocked here is
    /// unlocked at the same position there. Only meaningful when the old
    /// workspace's links are a prefix of the new one's.
    pub fn unlocked_locations_from_workspace(
        &self,
        workspace: Address,
        db: &Datastore,
    ) -> Result<HashSet<Address>, StorageError> {
        Ok(visit_unlocked_region(
            self.workspace,
            workspace,
            db,
            Some(&self.unlocked_locations),
        )?
        .into_iter()
        .collect())
    }

    /// This context's unlock set, restricted to what is still visible from
    /// another workspace
    ///
    /// Locations are matched by address, never by position, so replacing or
    /// reordering links cannot unlock anything new. `extra` locations are
    /// unlocked as well.
    pub fn unlocked_locations_by_address(
        &self,
        workspace: Address,
        db: &Datastore,
        extra: &[Address],
    ) -> Result<HashSet<Address>, StorageError> {
        let mut unlocked = self.unlocked_locations.clone();
        unlocked.insert(workspace);
        unlocked.extend(extra.iter().copied());
        let visible: HashSet<Address> =
            visit_unlocked_region(workspace, workspace, db, Some(&unlocked))?
                .into_iter()
                .collect();
        unlocked.retain(|address| visible.contains(address));
        Ok(unlocked)
    }

    /// The name map this context's unlock set induces on another workspace
    pub fn name_pointers_for_workspace(
        &self,
        workspace: Address,
        db: &Datastore,
    ) -> Result<HashMap<String, Address>, StorageError> {
        Ok(name_pointers(self.workspace, workspace, db, &self.unlocked_locations, None)?.1)
    }

    /// Structured rendering: each slot as a [`Link`]
    pub fn to_data(&self, db: &Datastore) -> Result<ContextData, StorageError> {
        let link_data = make_link_data(
            self.workspace,
            db,
            Some(&self.unlocked_locations),
            Some(&self.pointer_names),
        )?;
        let workspace = workspace_page(db, self.workspace)?;
        let lookup = |address: Address| -> Result<Link, StorageError> {
            link_data
                .get(&address)
                .cloned()
                .ok_or(StorageError::UnknownAddress(address))
        };

        Ok(ContextData {
            predecessor: workspace.predecessor.map(lookup).transpose()?,
            question: lookup(workspace.question)?,
            scratchpad: lookup(workspace.scratchpad)?,
            subquestions: workspace
                .subquestions
                .iter()
                .map(|sub| {
                    Ok(SubquestionData {
                        question: lookup(sub.question)?,
                        answer: lookup(sub.answer)?,
                        workspace: lookup(sub.workspace)?,
                    })
                })
                .collect::<Result<_, StorageError>>()?,
        })
    }

    /// JSON rendering of [`Context::to_data`]
    pub fn to_json(&self, db: &Datastore) -> Result<serde_json::Value, RenderError> {
        Ok(serde_json::to_value(self.to_data(db)?)?)
    }

    /// True if some ancestor works on the same workspace or the same question
    ///
    /// Asking a question that a live ancestor is already answering would recurse
    /// forever.
    pub fn is_own_ancestor(&self, arena: &[Context], db: &Datastore) -> Result<bool, StorageError> {
        let own_workspace = db.canonicalize(self.workspace)?;
        let own_question = db.canonicalize(workspace_page(db, self.workspace)?.question)?;

        let mut current = self.parent;
        while let Some(ContextId(index)) = current {
            let Some(ancestor) = arena.get(index) else {
                break;
            };
            if db.canonicalize(ancestor.workspace)? == own_workspace {
                return Ok(true);
            }
            let ancestor_question = workspace_page(db, ancestor.workspace)?.question;
            if db.canonicalize(ancestor_question)? == own_question {
                return Ok(true);
            }
            current = ancestor.parent;
        }
        Ok(false)
    }

    /// Number of ancestors
    pub fn depth(&self, arena: &[Context]) -> usize {
        let mut depth = 0;
        let mut current = self.parent;
        while let Some(ContextId(index)) = current {
            let Some(ancestor) = arena.get(index) else {
                break;
            };
            depth += 1;
            current = ancestor.parent;
        }
        depth
    }

    /// Whether anyone is waiting for this workspace's answer or final state
    pub fn is_blocking(&self, db: &Datastore) -> Result<bool, StorageError> {
        let workspace = workspace_page(db, self.workspace)?;
        Ok(db.has_promisees(workspace.answer_promise)
            || db.has_promisees(workspace.final_workspace_promise))
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

// Contexts that print the same are the same context.
impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.display == other.display
    }
}

impl Eq for Context {}

impl Hash for Context {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.display.hash(state);
    }
}

pub(crate) fn workspace_page(db: &Datastore, address: Address) -> Result<&Workspace, StorageError> {
    db.dereference(address)?
        .as_workspace()
        .ok_or(StorageError::UnknownAddress(address))
}

fn default_unlocked(address: Address, workspace: &Workspace) -> HashSet<Address> {
    let mut unlocked = HashSet::from([address, workspace.question, workspace.scratchpad]);
    unlocked.extend(workspace.predecessor);
    unlocked.extend(workspace.subquestions.iter().map(|sub| sub.question));
    unlocked
}

/// Assign `$q/$a/$w` names to subquestions of `workspace`, then `$1, $2, ...`
/// to everything else visible, in visitation order.
///
/// Addresses that already have a `$n` name in `previous` keep it; new ones
/// are numbered after the highest name in `previous`.
fn name_pointers(
    template: Address,
    workspace: Address,
    db: &Datastore,
    unlocked: &HashSet<Address>,
    previous: Option<&HashMap<Address, String>>,
) -> Result<Naming, StorageError> {
    let mut naming: Naming = (HashMap::new(), HashMap::new());
    fn assign((pointers, names): &mut Naming, address: Address, name: String) {
        pointers.insert(address, name.clone());
        names.insert(name, address);
    }

    let root = workspace_page(db, workspace)?;
    for (i, sub) in root.subquestions.iter().enumerate().rev() {
        let i = i + 1;
        assign(&mut naming, sub.question, format!("$q{}", i));
        assign(&mut naming, sub.answer, format!("$a{}", i));
        assign(&mut naming, sub.workspace, format!("$w{}", i));
    }

    let mut fresh = Vec::new();
    for visited in visit_unlocked_region(template, workspace, db, Some(unlocked))? {
        for link in db.dereference(visited)?.links() {
            if naming.0.contains_key(&link) || fresh.contains(&link) {
                continue;
            }
            match previous.and_then(|names| names.get(&link)) {
                Some(name) if numbered(name).is_some() => assign(&mut naming, link, name.clone()),
                _ => fresh.push(link),
            }
        }
    }

    let mut count = previous
        .into_iter()
        .flat_map(|names| names.values())
        .filter_map(|name| numbered(name))
        .max()
        .unwrap_or(0);
    for link in fresh {
        count += 1;
        assign(&mut naming, link, format!("${}", count));
    }

    Ok(naming)
}

/// The number in a `$n` name
fn numbered(name: &str) -> Option<usize> {
    name.strip_prefix('$')?.parse().ok()
}

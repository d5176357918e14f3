//! Rendering links between pages
//!
//! Pointer names can appear as ordinary substrings of other pages' text, so
//! pages are rendered in topological order: a page is rendered only after
//! every page it points to (through unlocked locations) already has its text.

use crate::error::StorageError;
use crate::hypertext::visit::visit_unlocked_region;
use crate::store::Datastore;
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// How a referenced page is shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Link {
    /// Only the pointer name is visible
    Locked { pointer: String },
    /// Pointer name together with the content
    Unlocked { pointer: String, content: String },
    /// Content without any name
    Anonymous { content: String },
}

impl Link {
    pub fn pointer(&self) -> Option<&str> {
        match self {
            Link::Locked { pointer } | Link::Unlocked { pointer, .. } => Some(pointer),
            Link::Anonymous { .. } => None,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Link::Unlocked { content, .. } | Link::Anonymous { content } => Some(content),
            Link::Locked { .. } => None,
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Locked { pointer } => write!(f, "{}", pointer),
            Link::Unlocked { pointer, content } => write!(f, "[{}: {}]", pointer, content),
            Link::Anonymous { content } => write!(f, "[{}]", content),
        }
    }
}

/// Compute how every page reachable from `root` is shown
///
/// With `pointer_names`, locations outside `unlocked` become
/// [`Link::Locked`] and the rest [`Link::Unlocked`]; the root itself is left
/// out. Without names everything (root included) is rendered as
/// [`Link::Anonymous`] content.
pub fn make_link_data(
    root: Address,
    db: &Datastore,
    unlocked: Option<&HashSet<Address>>,
    pointer_names: Option<&HashMap<Address, String>>,
) -> Result<HashMap<Address, Link>, StorageError> {
    let is_unlocked = |address: &Address| unlocked.map_or(true, |set| set.contains(address));

    // In-degree over the "points to when unlocked" relation.
    let mut include_counts: HashMap<Address, usize> = HashMap::new();
    for address in visit_unlocked_region(root, root, db, unlocked)? {
        for link in db.dereference(address)?.links() {
            *include_counts.entry(link).or_default() += 1;
        }
    }

    // Kahn's algorithm; the ready queue keeps discovery order.
    let mut ready = VecDeque::from([root]);
    let mut order = Vec::new();
    while let Some(address) = ready.pop_front() {
        order.push(address);
        if !is_unlocked(&address) {
            continue;
        }
        for link in db.dereference(address)?.links() {
            if let Some(count) = include_counts.get_mut(&link) {
                *count -= 1;
                if *count == 0 {
                    ready.push_back(link);
                }
            }
        }
    }

    let mut link_data: HashMap<Address, Link> = HashMap::new();
    for address in order.into_iter().rev() {
        let link = match pointer_names {
            Some(names) => {
                if address == root {
                    continue;
                }
                let pointer = names
                    .get(&address)
                    .cloned()
                    .unwrap_or_else(|| format!("@{}", address));
                if is_unlocked(&address) {
                    let content = db.dereference(address)?.render(&link_data);
                    Link::Unlocked { pointer, content }
                } else {
                    Link::Locked { pointer }
                }
            }
            None => Link::Anonymous {
                content: db.dereference(address)?.render(&link_data),
            },
        };
        link_data.insert(address, link);
    }

    Ok(link_data)
}

/// Fully expanded text of a page, every reference inlined
pub fn render_anonymous(root: Address, db: &Datastore) -> Result<String, StorageError> {
    let link_data = make_link_data(root, db, None, None)?;
    Ok(match link_data.get(&root) {
        Some(link) => link.content().unwrap_or_default().to_string(),
        None => db.dereference(root)?.render(&link_data),
    })
}

//! Pages
//!
//! Immutable units of storage. Every page is content-addressed and, once
//! inserted, never changes; logical edits produce a new page.

pub mod id;

use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One piece of a hypertext: literal text or a reference to another page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chunk {
    Text(String),
    Link(Address),
}

/// Text with embedded references
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHypertext {
    pub chunks: Vec<Chunk>,
}

impl RawHypertext {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    /// The empty hypertext, used for fresh scratchpads
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn links(&self) -> Vec<Address> {
        self.chunks
            .iter()
            .filter_map(|chunk| match chunk {
                Chunk::Link(address) => Some(*address),
                Chunk::Text(_) => None,
            })
            .collect()
    }

    /// Render with each link replaced by its entry in `display_map`
    pub fn render<D: fmt::Display>(&self, display_map: &HashMap<Address, D>) -> String {
        let mut out = String::new();
        for chunk in &self.chunks {
            match chunk {
                Chunk::Text(text) => out.push_str(text),
                Chunk::Link(address) => out.push_str(&display_of(display_map, address)),
            }
        }
        out
    }
}

/// A (question, answer, workspace) triple recorded when a subquestion is asked
///
/// `answer` is the sub-workspace's answer promise and `workspace` its final
/// workspace promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subquestion {
    pub question: Address,
    pub answer: Address,
    pub workspace: Address,
}

/// The state of one level of the recursion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub question: Address,
    pub scratchpad: Address,
    pub subquestions: Vec<Subquestion>,
    pub answer_promise: Address,
    pub final_workspace_promise: Address,
    pub predecessor: Option<Address>,
}

impl Workspace {
    /// Outgoing references in naming order.
    ///
    /// The workspace's own answer and final-workspace promises are identity,
    /// not content, and are deliberately absent: nothing reachable from a
    /// workspace can name its own pending answer.
    pub fn links(&self) -> Vec<Address> {
        let mut links = vec![self.question, self.scratchpad];
        links.extend(self.predecessor);
        for sub in &self.subquestions {
            links.push(sub.question);
            links.push(sub.answer);
            links.push(sub.workspace);
        }
        links
    }

    /// Copy of this workspace with one more subquestion
    pub fn with_subquestion(&self, subquestion: Subquestion) -> Self {
        let mut next = self.clone();
        next.subquestions.push(subquestion);
        next
    }

    /// Copy of this workspace with a different scratchpad
    pub fn with_scratchpad(&self, scratchpad: Address) -> Self {
        Self {
            scratchpad,
            ..self.clone()
        }
    }

    /// Single-line rendering used when a workspace appears inside a link
    pub fn render<D: fmt::Display>(&self, display_map: &HashMap<Address, D>) -> String {
        let mut out = String::new();
        if let Some(predecessor) = &self.predecessor {
            out.push_str(&format!("Predecessor: {}; ", display_of(display_map, predecessor)));
        }
        out.push_str(&format!(
            "Question: {}; Scratchpad: {}; Subquestions:",
            display_of(display_map, &self.question),
            display_of(display_map, &self.scratchpad),
        ));
        if self.subquestions.is_empty() {
            out.push_str(" none");
        }
        for (i, sub) in self.subquestions.iter().enumerate() {
            out.push_str(&format!(
                " {}. {} {} {}",
                i + 1,
                display_of(display_map, &sub.question),
                display_of(display_map, &sub.answer),
                display_of(display_map, &sub.workspace),
            ));
        }
        out
    }
}

/// Placeholder for a value that does not exist yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promise {
    pub resolved_value: Option<Address>,
}

/// Content of an unresolved promise shown in expanded form
pub const UNRESOLVED: &str = "<unresolved>";

/// A stored page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Page {
    RawHypertext(RawHypertext),
    Workspace(Workspace),
    Promise(Promise),
}

impl Page {
    pub fn links(&self) -> Vec<Address> {
        match self {
            Page::RawHypertext(hypertext) => hypertext.links(),
            Page::Workspace(workspace) => workspace.links(),
            Page::Promise(_) => Vec::new(),
        }
    }

    pub fn render<D: fmt::Display>(&self, display_map: &HashMap<Address, D>) -> String {
        match self {
            Page::RawHypertext(hypertext) => hypertext.render(display_map),
            Page::Workspace(workspace) => workspace.render(display_map),
            Page::Promise(_) => UNRESOLVED.to_string(),
        }
    }

    pub fn as_workspace(&self) -> Option<&Workspace> {
        match self {
            Page::Workspace(workspace) => Some(workspace),
            _ => None,
        }
    }

    pub fn as_hypertext(&self) -> Option<&RawHypertext> {
        match self {
            Page::RawHypertext(hypertext) => Some(hypertext),
            _ => None,
        }
    }
}

impl From<RawHypertext> for Page {
    fn from(hypertext: RawHypertext) -> Self {
        Page::RawHypertext(hypertext)
    }
}

impl From<Workspace> for Page {
    fn from(workspace: Workspace) -> Self {
        Page::Workspace(workspace)
    }
}

fn display_of<D: fmt::Display>(display_map: &HashMap<Address, D>, address: &Address) -> String {
    match display_map.get(address) {
        Some(display) => display.to_string(),
        None => format!("@{}", address),
    }
}

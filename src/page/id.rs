//! Address computation for pages

use crate::error::StorageError;
use crate::page::{Chunk, Page};
use crate::types::Address;
use blake3::Hasher;

/// Compute the content address of a page
///
/// Address = hash(kind || fields), where every referenced address is first
/// passed through `canonicalize`. Pages that differ only in whether they point
/// at a resolved promise or at its value therefore share an address.
///
/// Unresolved promises have no content; see [`compute_promise_address`].
pub fn compute_page_address<F>(page: &Page, mut canonicalize: F) -> Result<Address, StorageError>
where
    F: FnMut(Address) -> Result<Address, StorageError>,
{
    let mut hasher = Hasher::new();

    match page {
        Page::RawHypertext(hypertext) => {
            hasher.update(b"hypertext");
            hasher.update(&(hypertext.chunks.len() as u64).to_be_bytes());
            for chunk in &hypertext.chunks {
                match chunk {
                    Chunk::Text(text) => {
                        hasher.update(b"text:");
                        hasher.update(&(text.len() as u64).to_be_bytes());
                        hasher.update(text.as_bytes());
                    }
                    Chunk::Link(address) => {
                        hasher.update(b"link:");
                        hasher.update(canonicalize(*address)?.as_bytes());
                    }
                }
            }
        }
        Page::Workspace(workspace) => {
            hasher.update(b"workspace");
            hasher.update(canonicalize(workspace.question)?.as_bytes());
            hasher.update(canonicalize(workspace.scratchpad)?.as_bytes());
            // Own promises are identity, not content: never canonicalize them.
            hasher.update(workspace.answer_promise.as_bytes());
            hasher.update(workspace.final_workspace_promise.as_bytes());
            match workspace.predecessor {
                Some(predecessor) => {
                    hasher.update(b"predecessor:");
                    hasher.update(canonicalize(predecessor)?.as_bytes());
                }
                None => {
                    hasher.update(b"root");
                }
            }
            hasher.update(&(workspace.subquestions.len() as u64).to_be_bytes());
            for sub in &workspace.subquestions {
                hasher.update(canonicalize(sub.question)?.as_bytes());
                hasher.update(sub.answer.as_bytes());
                hasher.update(sub.workspace.as_bytes());
            }
        }
        Page::Promise(_) => {
            hasher.update(b"promise-value");
        }
    }

    Ok(Address::from_hash(*hasher.finalize().as_bytes()))
}

/// Compute the address of a fresh promise
///
/// Promises carry no content, so each one is keyed by a nonce that the
/// datastore never reuses.
pub fn compute_promise_address(nonce: u64) -> Address {
    let mut hasher = Hasher::new();
    hasher.update(b"promise:");
    hasher.update(&nonce.to_be_bytes());
    Address::from_hash(*hasher.finalize().as_bytes())
}

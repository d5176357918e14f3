//! Hypertext
//!
//! Text with embedded pointers, as typed by a user and as stored in the
//! datastore. Parsing happens in two phases: the whole input is parsed and every
//! pointer resolved first, and only then are pages inserted bottom-up, so a bad
//! input never leaves orphaned pages behind.

pub mod link;
pub mod parser;
pub mod visit;

pub use link::{make_link_data, render_anonymous, Link};
pub use parser::{is_pointer_name, parse, Piece};
pub use visit::visit_unlocked_region;

use crate::error::HypertextError;
use crate::page::{Chunk, RawHypertext};
use crate::store::Datastore;
use crate::types::Address;
use std::collections::HashMap;

/// Parse `content`, resolve its pointers against `names` and store it
pub fn insert_raw_hypertext(
    content: &str,
    db: &mut Datastore,
    names: &HashMap<String, Address>,
) -> Result<Address, HypertextError> {
    let hypertext = create_raw_hypertext(content, db, names)?;
    Ok(db.insert(hypertext.into())?)
}

/// Like [`insert_raw_hypertext`] but return the top-level page uninserted
///
/// Bracketed sub-hypertexts are still stored, since the top-level page needs
/// their addresses.
pub fn create_raw_hypertext(
    content: &str,
    db: &mut Datastore,
    names: &HashMap<String, Address>,
) -> Result<RawHypertext, HypertextError> {
    let pieces = parse(content)?;
    check_pointers(&pieces, names)?;
    build(&pieces, db, names)
}

fn check_pointers(pieces: &[Piece], names: &HashMap<String, Address>) -> Result<(), HypertextError> {
    for piece in pieces {
        match piece {
            Piece::Text(_) => {}
            Piece::Pointer { name, .. } => {
                if !names.contains_key(name) {
                    return Err(HypertextError::UnknownPointer(name.clone()));
                }
            }
            Piece::Expanded(inner) => check_pointers(inner, names)?,
        }
    }
    Ok(())
}

fn build(
    pieces: &[Piece],
    db: &mut Datastore,
    names: &HashMap<String, Address>,
) -> Result<RawHypertext, HypertextError> {
    let mut chunks = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let chunk = match piece {
            Piece::Text(text) => Chunk::Text(text.clone()),
            Piece::Pointer { name, .. } => {
                let address = names
                    .get(name)
                    .ok_or_else(|| HypertextError::UnknownPointer(name.clone()))?;
                Chunk::Link(*address)
            }
            Piece::Expanded(inner) => {
                let page = build(inner, db, names)?;
                Chunk::Link(db.insert(page.into())?)
            }
        };
        chunks.push(chunk);
    }
    Ok(RawHypertext::new(chunks))
}

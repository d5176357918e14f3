//! Shared identifier types

use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte BLAKE3 digest
pub type Hash = [u8; 32];

/// Content-derived identifier of a page in the datastore.
///
/// Addresses are opaque: they support equality, hashing and display, nothing
/// else. Two insertions of structurally equal content yield the same address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(Hash);

impl Address {
    pub(crate) fn from_hash(hash: Hash) -> Self {
        Address(hash)
    }

    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    /// Full hex encoding of the digest
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form, like an abbreviated commit id.
        write!(f, "{}", &self.to_hex()[..12])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

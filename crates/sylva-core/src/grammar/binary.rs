//! Compact binary round-trip for grammars using postcard.
//!
//! Useful for embedding a pre-parsed grammar in a build artifact without
//! shipping (and re-parsing) the JSON source.

use super::json::LoadError;
use super::types::Grammar;

impl Grammar {
    /// Deserializes a grammar from its binary form.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, LoadError> {
        postcard::from_bytes(bytes).map_err(LoadError::Binary)
    }

    /// Serializes the grammar to the binary form.
    pub fn to_binary(&self) -> Vec<u8> {
        postcard::to_allocvec(self).expect("grammar serialization should not fail")
    }
}

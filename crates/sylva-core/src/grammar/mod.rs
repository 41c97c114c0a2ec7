//! Grammar description types.
//!
//! The on-disk format is the tree-sitter `grammar.json` dialect: rules are
//! externally tagged expression trees, and the top-level object carries the
//! `extras`/`externals`/`precedences`/`conflicts`/`inline`/`word` sections.
//! A compact binary round-trip is provided for embedding compiled-in
//! grammars, and [`build`] offers the same combinators programmatically.

pub mod build;

mod binary;
mod json;
mod types;

#[cfg(test)]
mod binary_tests;
#[cfg(test)]
mod json_tests;

pub use json::LoadError;
pub use types::{Grammar, Precedence, PrecedenceEntry, Rule};

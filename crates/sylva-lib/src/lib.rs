//! Sylva: a grammar-driven parser runtime.
//!
//! Feed it a declarative grammar (the tree-sitter `grammar.json` dialect,
//! modeled by `sylva-core`) and source text; it produces a lossless concrete
//! syntax tree. Ambiguity is resolved through precedence, associativity, and
//! declared conflicts; context-sensitive tokens are delegated to a pluggable
//! external scanner; syntax errors become error nodes in the tree, never
//! aborts.
//!
//! # Example
//!
//! ```
//! use sylva_lib::{GrammarTable, parse};
//! use sylva_core::Grammar;
//!
//! let grammar = Grammar::from_json(r#"{
//!     "name": "words",
//!     "rules": {
//!         "source_file": { "type": "REPEAT", "content": { "type": "SYMBOL", "name": "word" } },
//!         "word": { "type": "PATTERN", "value": "[a-z]+" }
//!     },
//!     "extras": [ { "type": "PATTERN", "value": "\\s" } ]
//! }"#).unwrap();
//!
//! let table = GrammarTable::compile(&grammar).unwrap();
//! let outcome = parse("hello world", &table).unwrap();
//! assert!(!outcome.diagnostics.has_errors());
//! ```

pub mod diagnostics;
pub mod engine;
pub mod lexer;
pub mod table;
pub mod tree;

#[cfg(test)]
mod tests;

pub use diagnostics::{Diagnostics, DiagnosticsPrinter, Severity};
pub use engine::{ParseOptions, ParseOutcome, parse, parse_with_scanner};
pub use lexer::{ExternalMatch, ExternalScanner, NoExternalScanner, Token, ValidExternals};
pub use table::{GrammarError, GrammarTable};
pub use tree::{NodeRef, SyntaxTree, TokenRef};

/// Fatal parse-time errors.
///
/// Syntax errors never appear here; they are recovered locally and surface
/// as diagnostics plus error nodes in the tree. The only mid-parse abort
/// paths are the fuel limits.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Execution fuel exhausted (too many parser operations).
    #[error("execution limit exceeded")]
    ExecFuelExhausted,

    /// Recursion fuel exhausted (input nested too deeply).
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,
}

/// Result type for parse operations.
pub type Result<T> = std::result::Result<T, Error>;

//! The parsing engine.
//!
//! [`parse`] runs a compiled [`GrammarTable`] over source text and always
//! produces a tree covering the whole input; syntax errors surface as
//! diagnostics and error nodes, never as an `Err`. The only fatal paths
//! are the fuel limits in [`ParseOptions`].

mod core;
mod event;
mod rules;


pub(crate) use event::{Event, OpenKind};

use crate::diagnostics::Diagnostics;
use crate::lexer::{ExternalScanner, NoExternalScanner};
use crate::table::GrammarTable;
use crate::tree::{self, SyntaxTree};

/// Limits for one parse.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Upper bound on parser operations; `None` is unlimited.
    pub exec_fuel: Option<u32>,
    /// Upper bound on rule nesting depth.
    pub recursion_fuel: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            exec_fuel: None,
            recursion_fuel: 512,
        }
    }
}

impl ParseOptions {
    pub fn exec_fuel(mut self, fuel: u32) -> Self {
        self.exec_fuel = Some(fuel);
        self
    }

    pub fn recursion_fuel(mut self, fuel: u32) -> Self {
        self.recursion_fuel = fuel;
        self
    }
}

/// A finished parse: the tree plus everything that went wrong.
#[derive(Debug)]
pub struct ParseOutcome {
    pub tree: SyntaxTree,
    pub diagnostics: Diagnostics,
}

/// Parses `source` with the built-in lexer only.
pub fn parse(source: &str, table: &GrammarTable) -> crate::Result<ParseOutcome> {
    parse_with_scanner(source, table, &NoExternalScanner, ParseOptions::default())
}

/// Parses `source`, delegating the grammar's external tokens to `scanner`.
pub fn parse_with_scanner(
    source: &str,
    table: &GrammarTable,
    scanner: &dyn ExternalScanner,
    options: ParseOptions,
) -> crate::Result<ParseOutcome> {
    let mut parser = core::Parser::new(source, table, scanner, &options);
    parser.run()?;
    let (events, diagnostics) = parser.finish();
    let tree = tree::build(table, source, events);
    Ok(ParseOutcome { tree, diagnostics })
}

//! Context-sensitive tokenization.
//!
//! There is no token stream: the engine asks for a token at a byte offset
//! together with the set of terminals it would accept there, and the lexer
//! answers with the best match from exactly that set. The same input can
//! therefore lex differently in different grammar positions, which is what
//! makes keyword/identifier overlap and island grammars workable.
//!
//! Match selection: longest wins; on equal length an external beats a
//! literal beats a pattern; remaining ties go to the lower terminal id,
//! which is declaration order.

pub(crate) mod dfa;
mod external;

#[cfg(test)]
mod lexer_tests;

use text_size::{TextRange, TextSize};

pub use external::{ExternalMatch, ExternalScanner, NoExternalScanner, ValidExternals};

use crate::table::{GrammarTable, TerminalDef, TerminalId, TokenSet};

/// A lexed token: a terminal and the byte range it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub(crate) terminal: TerminalId,
    pub(crate) range: TextRange,
}

impl Token {
    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn len(&self) -> usize {
        self.range.len().into()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// The token's slice of the source text.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        let start: usize = self.range.start().into();
        let end: usize = self.range.end().into();
        &source[start..end]
    }
}

pub(crate) struct Lexer<'a> {
    source: &'a str,
    table: &'a GrammarTable,
    scanner: &'a dyn ExternalScanner,
    /// Every terminal, for recovery lexing with no expectations.
    all: TokenSet,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(
        source: &'a str,
        table: &'a GrammarTable,
        scanner: &'a dyn ExternalScanner,
    ) -> Self {
        let mut all = TokenSet::empty(table.terminals.len());
        for index in 0..table.terminals.len() {
            all.insert(TerminalId(index as u16));
        }
        Self {
            source,
            table,
            scanner,
            all,
        }
    }

    /// Best token at `offset` drawn from `expected`.
    pub(crate) fn token_at(&self, offset: usize, expected: &TokenSet) -> Option<Token> {
        let rest = &self.source.as_bytes()[offset..];
        let mut best: Option<(usize, u8, TerminalId)> = None;

        let valid = self.valid_externals(expected);
        if !valid.is_empty() {
            if let Some(found) = self.scanner.scan(self.source, offset, &valid) {
                if found.length > 0 && (found.index as usize) < self.table.externals.len() {
                    let terminal = self.table.externals[found.index as usize];
                    consider(&mut best, found.length, 0, terminal);
                }
            }
        }

        for terminal in expected.iter() {
            match &self.table.terminal(terminal).def {
                TerminalDef::Literal { text, keyword } => {
                    if !rest.starts_with(text.as_bytes()) {
                        continue;
                    }
                    if *keyword && !self.keyword_fits(rest, text.len()) {
                        continue;
                    }
                    consider(&mut best, text.len(), 1, terminal);
                }
                TerminalDef::Pattern { dfa } => {
                    if let Some(len) = dfa::longest_match(dfa, rest) {
                        if len > 0 {
                            consider(&mut best, len, 2, terminal);
                        }
                    }
                }
                TerminalDef::External { .. } => {}
            }
        }

        best.map(|(len, _, terminal)| Token {
            terminal,
            range: range_at(offset, len),
        })
    }

    /// Best token from the whole terminal set; used when skipping
    /// unparseable input and for naming what was found in diagnostics.
    pub(crate) fn any_token_at(&self, offset: usize) -> Option<Token> {
        self.token_at(offset, &self.all)
    }

    /// Longest extra (trivia) token at `offset`, if any.
    pub(crate) fn trivia_at(&self, offset: usize) -> Option<Token> {
        let rest = &self.source.as_bytes()[offset..];
        let mut best: Option<(usize, u8, TerminalId)> = None;

        for &terminal in &self.table.extras {
            match &self.table.terminal(terminal).def {
                TerminalDef::Literal { text, .. } => {
                    if rest.starts_with(text.as_bytes()) {
                        consider(&mut best, text.len(), 1, terminal);
                    }
                }
                TerminalDef::Pattern { dfa } => {
                    if let Some(len) = dfa::longest_match(dfa, rest) {
                        if len > 0 {
                            consider(&mut best, len, 2, terminal);
                        }
                    }
                }
                TerminalDef::External { index } => {
                    let mut valid = ValidExternals::default();
                    valid.insert(*index);
                    if let Some(found) = self.scanner.scan(self.source, offset, &valid) {
                        if found.index == *index && found.length > 0 {
                            consider(&mut best, found.length, 0, terminal);
                        }
                    }
                }
            }
        }

        best.map(|(len, _, terminal)| Token {
            terminal,
            range: range_at(offset, len),
        })
    }

    pub(crate) fn at_end(&self, offset: usize) -> bool {
        offset >= self.source.len()
    }

    fn valid_externals(&self, expected: &TokenSet) -> ValidExternals {
        let mut valid = ValidExternals::default();
        for &terminal in &self.table.externals {
            if expected.contains(terminal) {
                if let TerminalDef::External { index } = &self.table.terminal(terminal).def {
                    valid.insert(*index);
                }
            }
        }
        valid
    }

    /// A keyword literal only lexes where the word rule's match stops with
    /// it; `ifx` must lex as one identifier, not `if` + `x`.
    fn keyword_fits(&self, rest: &[u8], len: usize) -> bool {
        let Some(word) = self.table.word else {
            return true;
        };
        let TerminalDef::Pattern { dfa } = &self.table.terminal(word).def else {
            return true;
        };
        dfa::longest_match(dfa, rest) == Some(len)
    }
}

fn consider(best: &mut Option<(usize, u8, TerminalId)>, len: usize, rank: u8, terminal: TerminalId) {
    let better = match best {
        None => true,
        Some((best_len, best_rank, best_terminal)) => {
            len > *best_len
                || (len == *best_len
                    && (rank < *best_rank || (rank == *best_rank && terminal < *best_terminal)))
        }
    };
    if better {
        *best = Some((len, rank, terminal));
    }
}

fn range_at(offset: usize, len: usize) -> TextRange {
    let start = TextSize::from(offset as u32);
    TextRange::new(start, start + TextSize::from(len as u32))
}

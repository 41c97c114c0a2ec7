//! External scanner interface.
//!
//! Some tokens cannot be described by the grammar (nesting comments,
//! heredocs, indentation). The grammar declares them in `externals` and the
//! host program supplies an [`ExternalScanner`] to recognize them. The
//! scanner is consulted first at every lex point where at least one
//! external is acceptable, so it can shadow built-in tokens.

/// The subset of external tokens acceptable at the current position,
/// identified by their position in the grammar's `externals` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidExternals {
    bits: u64,
}

impl ValidExternals {
    pub(crate) fn insert(&mut self, index: u16) {
        self.bits |= 1 << index;
    }

    pub fn contains(&self, index: u16) -> bool {
        index < 64 && self.bits & (1 << index) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Indices of the valid externals, ascending.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        (0..64).filter(|&index| self.contains(index))
    }
}

/// A token recognized by an external scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalMatch {
    /// Position in the grammar's `externals` list.
    pub index: u16,
    /// Length of the token in bytes.
    pub length: usize,
}

/// Recognizes tokens the declarative grammar cannot express.
///
/// `scan` is called with the full source, the byte offset to lex at, and
/// the set of externals the parser would accept there. Returning `None`
/// falls through to the built-in lexer.
pub trait ExternalScanner {
    fn scan(&self, source: &str, offset: usize, valid: &ValidExternals) -> Option<ExternalMatch>;
}

/// Scanner for grammars without externals.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalScanner;

impl ExternalScanner for NoExternalScanner {
    fn scan(&self, _: &str, _: usize, _: &ValidExternals) -> Option<ExternalMatch> {
        None
    }
}

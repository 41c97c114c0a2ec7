//! Growable bitset over terminal ids.
//!
//! Terminal counts are grammar-dependent, so unlike a fixed-width lexer
//! token set this one sizes itself to the table it belongs to.

use super::TerminalId;

/// Set of terminals with O(1) membership testing.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct TokenSet {
    bits: Vec<u64>,
}

impl TokenSet {
    pub(crate) fn empty(terminal_count: usize) -> Self {
        Self {
            bits: vec![0; terminal_count.div_ceil(64)],
        }
    }

    pub(crate) fn insert(&mut self, id: TerminalId) -> bool {
        let (word, bit) = Self::locate(id);
        let prev = self.bits[word];
        self.bits[word] |= bit;
        self.bits[word] != prev
    }

    pub(crate) fn contains(&self, id: TerminalId) -> bool {
        let (word, bit) = Self::locate(id);
        self.bits.get(word).is_some_and(|w| w & bit != 0)
    }

    /// Unions `other` into `self`; reports whether anything changed.
    pub(crate) fn union_with(&mut self, other: &TokenSet) -> bool {
        let mut changed = false;
        for (dst, src) in self.bits.iter_mut().zip(&other.bits) {
            let prev = *dst;
            *dst |= src;
            changed |= *dst != prev;
        }
        changed
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.bits.iter().all(|w| *w == 0)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = TerminalId> + '_ {
        self.bits.iter().enumerate().flat_map(|(word, &w)| {
            (0..64)
                .filter(move |bit| w & (1 << bit) != 0)
                .map(move |bit| TerminalId((word * 64 + bit) as u16))
        })
    }

    fn locate(id: TerminalId) -> (usize, u64) {
        let index = id.0 as usize;
        (index / 64, 1 << (index % 64))
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter().map(|id| id.0)).finish()
    }
}

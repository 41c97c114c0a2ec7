//! Longest-match execution of pattern DFAs.

use regex_automata::dfa::dense;
use regex_automata::dfa::Automaton;
use regex_automata::{Anchored, Input};

/// Runs an anchored DFA over `haystack` and returns the length of the
/// longest match starting at position 0.
///
/// Dense DFAs report matches delayed by one byte, so the match seen after
/// consuming byte `i` ended at `i`; the end-of-input transition catches a
/// match that runs to the end.
pub(crate) fn longest_match(dfa: &dense::DFA<Vec<u32>>, haystack: &[u8]) -> Option<usize> {
    let input = Input::new(haystack).anchored(Anchored::Yes);
    let mut state = dfa.start_state_forward(&input).ok()?;
    let mut last = None;

    for (i, &byte) in haystack.iter().enumerate() {
        state = dfa.next_state(state, byte);
        if dfa.is_special_state(state) {
            if dfa.is_match_state(state) {
                last = Some(i);
            } else if dfa.is_dead_state(state) || dfa.is_quit_state(state) {
                return last;
            }
        }
    }

    state = dfa.next_eoi_state(state);
    if dfa.is_match_state(state) {
        last = Some(haystack.len());
    }
    last
}

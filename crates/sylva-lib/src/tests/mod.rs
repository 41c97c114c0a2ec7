//! End-to-end tests over a small C-like grammar.

mod helpers;

mod expression_tests;
mod externals_tests;
mod json_grammar_tests;
mod structure_tests;

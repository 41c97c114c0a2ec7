//! Core data model for sylva grammars.
//!
//! A [`Grammar`] is the declarative description a parser runtime consumes:
//! named production rules built from combinator primitives, precedence
//! orderings, declared conflicts, external-scanner tokens, and trivia
//! declarations. This crate only models and (de)serializes that data;
//! compiling it into a runnable table is the job of `sylva-lib`.

pub mod grammar;

pub use grammar::{Grammar, LoadError, Precedence, PrecedenceEntry, Rule};

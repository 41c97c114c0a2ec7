//! Programmatic rule combinators.
//!
//! Mirrors the DSL grammar authors use in `grammar.js`, so grammars can be
//! assembled in Rust (mainly for tests and embedded tooling):
//!
//! ```
//! use sylva_core::grammar::build::*;
//!
//! let rule = seq([sym("expression"), lit(";")]);
//! ```

use super::types::{Precedence, Rule};

/// Literal terminal.
pub fn lit(text: &str) -> Rule {
    Rule::String(text.to_string())
}

/// Regex terminal.
pub fn pattern(regex: &str) -> Rule {
    Rule::Pattern {
        value: regex.to_string(),
        flags: None,
    }
}

/// Reference to a named rule or external token.
pub fn sym(name: &str) -> Rule {
    Rule::Symbol(name.to_string())
}

/// Empty match.
pub fn blank() -> Rule {
    Rule::Blank
}

pub fn seq(members: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Seq(members.into_iter().collect())
}

pub fn choice(members: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Choice(members.into_iter().collect())
}

/// Zero or one, encoded the way grammar.json does (`CHOICE [rule, BLANK]`).
pub fn optional(rule: Rule) -> Rule {
    Rule::Choice(vec![rule, Rule::Blank])
}

pub fn repeat(rule: Rule) -> Rule {
    Rule::Repeat(Box::new(rule))
}

pub fn repeat1(rule: Rule) -> Rule {
    Rule::Repeat1(Box::new(rule))
}

pub fn field(name: &str, rule: Rule) -> Rule {
    Rule::Field {
        name: name.to_string(),
        content: Box::new(rule),
    }
}

/// Renames the matched node, keeping its shape.
pub fn alias(rule: Rule, value: &str, named: bool) -> Rule {
    Rule::Alias {
        content: Box::new(rule),
        value: value.to_string(),
        named,
    }
}

/// Forces the content to lex as one token.
pub fn token(rule: Rule) -> Rule {
    Rule::Token(Box::new(rule))
}

pub fn immediate_token(rule: Rule) -> Rule {
    Rule::ImmediateToken(Box::new(rule))
}

pub fn prec(value: i32, rule: Rule) -> Rule {
    Rule::Prec {
        value: Precedence::Integer(value),
        content: Box::new(rule),
    }
}

pub fn prec_left(value: i32, rule: Rule) -> Rule {
    Rule::PrecLeft {
        value: Precedence::Integer(value),
        content: Box::new(rule),
    }
}

pub fn prec_right(value: i32, rule: Rule) -> Rule {
    Rule::PrecRight {
        value: Precedence::Integer(value),
        content: Box::new(rule),
    }
}

/// Precedence by symbolic name, resolved through the grammar's orderings.
pub fn prec_named(name: &str, rule: Rule) -> Rule {
    Rule::Prec {
        value: Precedence::Name(name.to_string()),
        content: Box::new(rule),
    }
}

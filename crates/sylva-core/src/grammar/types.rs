//! Grammar type definitions.

use serde::{Deserialize, Serialize};

/// A complete grammar description.
///
/// The first entry in `rules` is the designated top-level rule; definition
/// order is significant everywhere (it is the final ambiguity tie-break).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grammar {
    /// Grammar name (e.g., "d", "json").
    pub name: String,
    /// Production rules in definition order.
    pub rules: Vec<(String, Rule)>,
    /// Trivia matched between any two significant tokens.
    #[serde(default)]
    pub extras: Vec<Rule>,
    /// Named precedence orderings; within one ordering, earlier binds tighter.
    #[serde(default)]
    pub precedences: Vec<Vec<PrecedenceEntry>>,
    /// Rule tuples allowed to compete for the same input span.
    #[serde(default)]
    pub conflicts: Vec<Vec<String>>,
    /// Tokens recognized by an external scanner instead of the built-in lexer.
    #[serde(default)]
    pub externals: Vec<Rule>,
    /// Rules spliced out of the tree, children promoted in place.
    #[serde(default)]
    pub inline: Vec<String>,
    /// The generic identifier token, for keyword disambiguation.
    #[serde(default)]
    pub word: Option<String>,
}

impl Grammar {
    /// Name of the designated entry rule (the first one defined).
    pub fn entry_rule(&self) -> Option<&str> {
        self.rules.first().map(|(name, _)| name.as_str())
    }

    /// Looks up a rule body by name.
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, body)| body)
    }
}

/// One node of a rule body expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rule {
    /// Matches the empty string.
    Blank,
    /// Literal terminal.
    String(String),
    /// Regex terminal.
    Pattern {
        value: String,
        #[serde(default)]
        flags: Option<String>,
    },
    /// Reference to another rule or an external token.
    Symbol(String),
    /// All members in order.
    Seq(Vec<Rule>),
    /// Any one member; earlier members win ties.
    Choice(Vec<Rule>),
    /// Zero or more.
    Repeat(Box<Rule>),
    /// One or more.
    Repeat1(Box<Rule>),
    /// Tags the matched child(ren) with a field name.
    Field { name: String, content: Box<Rule> },
    /// Renames the matched node without changing its shape.
    Alias {
        content: Box<Rule>,
        value: String,
        named: bool,
    },
    /// Forces the content to lex as a single token.
    Token(Box<Rule>),
    /// Like [`Rule::Token`] but disallows preceding trivia.
    ImmediateToken(Box<Rule>),
    /// Precedence annotation without associativity.
    Prec {
        value: Precedence,
        content: Box<Rule>,
    },
    /// Left-associative precedence.
    PrecLeft {
        value: Precedence,
        content: Box<Rule>,
    },
    /// Right-associative precedence.
    PrecRight {
        value: Precedence,
        content: Box<Rule>,
    },
}

impl Rule {
    /// Direct sub-expressions, in order.
    pub fn children(&self) -> Vec<&Rule> {
        match self {
            Rule::Blank | Rule::String(_) | Rule::Pattern { .. } | Rule::Symbol(_) => Vec::new(),
            Rule::Seq(members) | Rule::Choice(members) => members.iter().collect(),
            Rule::Repeat(content)
            | Rule::Repeat1(content)
            | Rule::Field { content, .. }
            | Rule::Alias { content, .. }
            | Rule::Token(content)
            | Rule::ImmediateToken(content)
            | Rule::Prec { content, .. }
            | Rule::PrecLeft { content, .. }
            | Rule::PrecRight { content, .. } => vec![content],
        }
    }

    /// Whether this expression is a bare terminal (literal or pattern).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Rule::String(_) | Rule::Pattern { .. })
    }

    /// Visits every expression in the tree, pre-order.
    pub fn walk(&self, f: &mut impl FnMut(&Rule)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }
}

/// A precedence value: literal, or a name resolved through the grammar's
/// precedence orderings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Precedence {
    Integer(i32),
    Name(String),
}

/// One entry of a precedence ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrecedenceEntry {
    /// A symbolic precedence name.
    Name(String),
    /// A rule reference ordered relative to its neighbors.
    Symbol(String),
}

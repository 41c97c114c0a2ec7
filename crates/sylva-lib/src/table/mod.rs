//! Compiled grammar tables.
//!
//! [`GrammarTable::compile`] lowers a declarative [`Grammar`] into the form
//! the engine executes: an expression arena indexed by [`ExprId`], an
//! interned terminal list with prebuilt DFAs for patterns, per-expression
//! FIRST sets, and the left-recursion groups that drive precedence climbing.
//! All name resolution and validity checking happens here, so the engine
//! itself never fails on a malformed grammar.

mod analysis;
mod compile;
pub(crate) mod regex;
mod token_set;

#[cfg(test)]
mod analysis_tests;

use regex_automata::dfa::dense;
use sylva_core::Grammar;

pub(crate) use token_set::TokenSet;

/// Index of a rule in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct RuleId(pub(crate) u16);

/// Index of an interned terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct TerminalId(pub(crate) u16);

/// Index of an interned field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct FieldId(pub(crate) u16);

/// Index of an interned alias name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct AliasId(pub(crate) u16);

/// Index into the expression arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ExprId(pub(crate) u32);

impl RuleId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl TerminalId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl FieldId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl AliasId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl ExprId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Associativity attached to a precedence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Assoc {
    #[default]
    None,
    Left,
    Right,
}

/// One node in the lowered expression arena.
///
/// Wrappers that only matter during matching (`Prec`, `Field`, `Alias`) stay
/// in the arena rather than being resolved away, so the engine can thread
/// them through at the point they apply.
#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Empty,
    Terminal {
        terminal: TerminalId,
        /// Suppresses trivia skipping before the match.
        immediate: bool,
    },
    Rule(RuleId),
    Seq(Vec<ExprId>),
    Choice(Vec<ExprId>),
    Repeat {
        content: ExprId,
        min_once: bool,
    },
    Field {
        field: FieldId,
        content: ExprId,
    },
    Prec {
        level: i32,
        assoc: Assoc,
        content: ExprId,
    },
    Alias {
        alias: AliasId,
        named: bool,
        content: ExprId,
    },
}

/// How a terminal is recognized in source text.
pub(crate) enum TerminalDef {
    Literal {
        text: String,
        /// Literal that also matches the `word` rule; such literals only
        /// lex when the word match does not extend past them.
        keyword: bool,
    },
    Pattern {
        dfa: dense::DFA<Vec<u32>>,
    },
    External {
        /// Position in the grammar's `externals` list, which is the
        /// contract with the external scanner.
        index: u16,
    },
}

pub(crate) struct Terminal {
    /// Display name: the defining rule's name for token rules and
    /// externals, the raw text for literals, the pattern source
    /// otherwise.
    pub(crate) name: String,
    pub(crate) def: TerminalDef,
}

/// Shape of a base (non-left-recursive) alternative.
#[derive(Debug, Clone)]
pub(crate) enum BaseShape {
    /// The alternative is exactly a reference to another rule in the same
    /// left-recursion group; the caller's binding power threads through.
    Unit(RuleId),
    Normal {
        /// Trailing same-group reference, if any. A prefix operator's
        /// operand parses with the binding power of the alternative's own
        /// precedence level.
        bp_target: Option<ExprId>,
    },
}

/// A top-level alternative of a rule that can start a parse of that rule.
#[derive(Debug, Clone)]
pub(crate) struct BaseAlt {
    pub(crate) expr: ExprId,
    /// Explicit precedence wrapper, if the alternative had one. Binding
    /// power threads into a trailing expression operand only when this is
    /// set; an unannotated alternative takes a full expression.
    pub(crate) prec: Option<(i32, Assoc)>,
    pub(crate) shape: BaseShape,
}

impl BaseAlt {
    pub(crate) fn level(&self) -> i32 {
        self.prec.map_or(0, |(level, _)| level)
    }
}

/// A left-recursive alternative, rewritten head/tail for climbing.
///
/// `owner` names the rule the alternative was declared in; when the
/// continuation applies, the node wrapped around the left operand gets the
/// owner's kind.
pub(crate) struct Continuation {
    pub(crate) owner: RuleId,
    pub(crate) level: i32,
    pub(crate) assoc: Assoc,
    /// Whether the level came from an explicit annotation. Chains are only
    /// diagnosed as non-associative when the author said so.
    pub(crate) explicit_prec: bool,
    /// Field the head reference was wrapped in, applied to the left
    /// operand after wrapping.
    pub(crate) head_field: Option<FieldId>,
    /// Everything after the head reference.
    pub(crate) tail: Vec<ExprId>,
    /// Trailing same-group reference inside the tail, if any; parses with
    /// the continuation's right binding power.
    pub(crate) bp_target: Option<ExprId>,
    /// FIRST set of the tail, used to gate the climb on lookahead.
    pub(crate) first: TokenSet,
}

/// A set of mutually left-recursive rules and their continuations, in
/// declaration order.
pub(crate) struct Group {
    pub(crate) members: Vec<RuleId>,
    pub(crate) continuations: Vec<Continuation>,
}

pub(crate) struct RuleInfo {
    pub(crate) name: String,
    /// Full lowered body, kept for FIRST computation and introspection.
    pub(crate) body: ExprId,
    /// Leading-underscore rules splice their children into the parent.
    pub(crate) hidden: bool,
    /// Listed in the grammar's `inline` section; spliced like hidden rules.
    pub(crate) inline: bool,
    /// Set when the whole rule lowers to a single terminal.
    pub(crate) token: Option<TerminalId>,
    /// Alternatives that can begin this rule. Left-recursive alternatives
    /// live in the group's continuation list instead.
    pub(crate) alts: Vec<BaseAlt>,
    pub(crate) group: Option<u16>,
}

/// Shared name table for rendering node kinds without the full table.
pub(crate) struct NameTable {
    pub(crate) rules: Vec<String>,
    pub(crate) aliases: Vec<String>,
    pub(crate) terminals: Vec<String>,
    pub(crate) fields: Vec<String>,
    /// Whether each terminal is a literal (and so anonymous in the tree).
    pub(crate) literal_terminals: Vec<bool>,
}

impl NameTable {
    /// Token-rule and external terminals produce named leaves; literals
    /// and recovery skips do not.
    pub(crate) fn named_terminal(&self, terminal: Option<TerminalId>) -> bool {
        terminal.is_some_and(|t| !self.literal_terminals[t.index()])
    }
}

/// A grammar compiled for execution.
pub struct GrammarTable {
    pub(crate) name: String,
    pub(crate) rules: Vec<RuleInfo>,
    pub(crate) exprs: Vec<Expr>,
    pub(crate) terminals: Vec<Terminal>,
    pub(crate) fields: Vec<String>,
    pub(crate) aliases: Vec<String>,
    /// Terminal for each external, in declared order.
    pub(crate) externals: Vec<TerminalId>,
    pub(crate) extras: Vec<TerminalId>,
    pub(crate) entry: RuleId,
    /// Rule pairs declared as expected conflicts, stored with the smaller
    /// id first.
    pub(crate) conflicts: std::collections::HashSet<(u16, u16)>,
    /// Tokens that recovery skips to: statement-ish closers plus the
    /// starters of the entry rule's repeated items.
    pub(crate) sync_set: TokenSet,
    pub(crate) word: Option<TerminalId>,
    /// FIRST set per arena expression.
    pub(crate) first: Vec<TokenSet>,
    /// Nullability per arena expression.
    pub(crate) nullable: Vec<bool>,
    pub(crate) groups: Vec<Group>,
    pub(crate) names: std::sync::Arc<NameTable>,
}

impl GrammarTable {
    /// Compiles `grammar` into an executable table.
    pub fn compile(grammar: &Grammar) -> Result<GrammarTable, GrammarError> {
        compile::compile(grammar)
    }

    /// The grammar's name.
    pub fn grammar_name(&self) -> &str {
        &self.name
    }

    /// Names of the external tokens, in the order the scanner sees them.
    pub fn external_names(&self) -> impl Iterator<Item = &str> {
        self.externals
            .iter()
            .map(|t| self.terminals[t.index()].name.as_str())
    }

    /// Number of rules in the table.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub(crate) fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub(crate) fn rule(&self, id: RuleId) -> &RuleInfo {
        &self.rules[id.index()]
    }

    pub(crate) fn terminal(&self, id: TerminalId) -> &Terminal {
        &self.terminals[id.index()]
    }

    pub(crate) fn first(&self, id: ExprId) -> &TokenSet {
        &self.first[id.index()]
    }

    pub(crate) fn is_nullable(&self, id: ExprId) -> bool {
        self.nullable[id.index()]
    }

    /// Human-readable name for a terminal, quoted for literals.
    pub(crate) fn terminal_name(&self, id: TerminalId) -> String {
        let terminal = self.terminal(id);
        match &terminal.def {
            TerminalDef::Literal { text, .. } => format!("\"{text}\""),
            _ => terminal.name.clone(),
        }
    }
}

impl std::fmt::Debug for GrammarTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrammarTable")
            .field("name", &self.name)
            .field("rules", &self.rules.len())
            .field("terminals", &self.terminals.len())
            .field("externals", &self.externals.len())
            .field("groups", &self.groups.len())
            .finish_non_exhaustive()
    }
}

/// Errors detected while compiling a grammar.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("grammar has no rules")]
    EmptyGrammar,

    #[error("rule `{rule}` references undefined name `{reference}`")]
    UndefinedRule { rule: String, reference: String },

    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("undefined precedence name `{name}` in rule `{rule}`")]
    UndefinedPrecedence { rule: String, name: String },

    #[error("conflict entry references undefined rule `{name}`")]
    InvalidConflict { name: String },

    #[error("rule `{rule}` is left-recursive without consuming input")]
    InvalidLeftRecursion { rule: String },

    #[error(
        "rules `{left}` and `{right}` compete for the same input; \
         declare a conflict or set precedence"
    )]
    UnresolvedConflict { left: String, right: String },

    #[error("`word` must name a token rule, but `{name}` is not one")]
    InvalidWordRule { name: String },

    #[error("grammar declares {count} externals, more than the supported 64")]
    TooManyExternals { count: usize },

    #[error(transparent)]
    Load(#[from] sylva_core::LoadError),
}

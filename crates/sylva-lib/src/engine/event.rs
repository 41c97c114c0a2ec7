//! Parse events.
//!
//! The engine does not build the tree directly; it appends events to a
//! flat buffer. Speculation then rolls back by truncating the buffer, and
//! precedence climbing wraps an already-parsed left operand by inserting
//! an `Open` at a saved checkpoint.

use text_size::TextRange;

use crate::table::{AliasId, FieldId, RuleId, TerminalId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Open {
        kind: OpenKind,
    },
    Close,
    Token {
        /// `None` for input skipped during recovery that no terminal
        /// matches.
        terminal: Option<TerminalId>,
        alias: Option<AliasId>,
        range: TextRange,
        trivia: bool,
    },
    /// Children produced until the matching [`Event::FieldEnd`] carry this
    /// field.
    FieldStart {
        field: FieldId,
    },
    FieldEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpenKind {
    Rule {
        rule: RuleId,
        alias: Option<(AliasId, bool)>,
        /// Field for the node's first child; used when a climbing
        /// continuation wraps its left operand.
        lhs_field: Option<FieldId>,
    },
    Error,
}

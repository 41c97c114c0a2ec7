use sylva_core::grammar::build::*;
use sylva_core::{Grammar, Rule};

use crate::{parse, GrammarTable, ParseOutcome};

fn binary_op(op: &str, level: i32) -> Rule {
    prec_left(
        level,
        seq([
            field("left", sym("_expression")),
            field("operator", lit(op)),
            field("right", sym("_expression")),
        ]),
    )
}

/// Statements, declarations, and an expression hierarchy with assignment,
/// comparison, additive, multiplicative, and prefix levels.
pub(crate) fn lang_grammar() -> Grammar {
    let rules = vec![
        ("source_file", repeat(sym("_statement"))),
        (
            "_statement",
            choice([sym("declaration"), sym("expression_statement")]),
        ),
        (
            "declaration",
            seq([
                sym("primitive_type"),
                field("name", sym("identifier")),
                optional(seq([lit("="), field("value", sym("_expression"))])),
                lit(";"),
            ]),
        ),
        ("primitive_type", choice([lit("int"), lit("bool")])),
        ("expression_statement", seq([sym("_expression"), lit(";")])),
        (
            "_expression",
            choice([
                sym("assignment_expression"),
                sym("binary_expression"),
                sym("unary_expression"),
                sym("parenthesized_expression"),
                sym("identifier"),
                sym("number"),
            ]),
        ),
        (
            "assignment_expression",
            prec_right(
                1,
                seq([
                    field("left", sym("_expression")),
                    lit("="),
                    field("right", sym("_expression")),
                ]),
            ),
        ),
        (
            "binary_expression",
            choice([
                prec(
                    2,
                    seq([
                        field("left", sym("_expression")),
                        field("operator", lit("==")),
                        field("right", sym("_expression")),
                    ]),
                ),
                binary_op("+", 3),
                binary_op("-", 3),
                binary_op("*", 4),
            ]),
        ),
        (
            "unary_expression",
            prec(5, seq([lit("-"), field("operand", sym("_expression"))])),
        ),
        (
            "parenthesized_expression",
            seq([lit("("), sym("_expression"), lit(")")]),
        ),
        ("identifier", pattern("[a-zA-Z_][a-zA-Z0-9_]*")),
        ("number", pattern("[0-9]+")),
    ];

    Grammar {
        name: "lang".to_string(),
        rules: rules
            .into_iter()
            .map(|(name, body)| (name.to_string(), body))
            .collect(),
        extras: vec![pattern("\\s+")],
        precedences: Vec::new(),
        conflicts: Vec::new(),
        externals: Vec::new(),
        inline: Vec::new(),
        word: Some("identifier".to_string()),
    }
}

pub(crate) fn lang() -> GrammarTable {
    GrammarTable::compile(&lang_grammar()).unwrap()
}

pub(crate) fn parse_lang(source: &str) -> ParseOutcome {
    parse(source, &lang()).unwrap()
}

/// Parses and renders the S-expression, panicking on diagnostics so the
/// happy-path tests stay terse.
pub(crate) fn sexp(source: &str) -> String {
    let outcome = parse_lang(source);
    assert!(
        outcome.diagnostics.is_empty(),
        "unexpected diagnostics:\n{}",
        outcome.diagnostics.render(source)
    );
    outcome.tree.to_sexp()
}

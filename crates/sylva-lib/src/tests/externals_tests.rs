use sylva_core::grammar::build::*;
use sylva_core::Grammar;

use crate::table::GrammarTable;
use crate::{
    parse_with_scanner, ExternalMatch, ExternalScanner, ParseOptions, ValidExternals,
};

/// Backtick-delimited strings, recognized outside the grammar.
struct Backticks;

impl ExternalScanner for Backticks {
    fn scan(&self, source: &str, offset: usize, valid: &ValidExternals) -> Option<ExternalMatch> {
        if !valid.contains(0) {
            return None;
        }
        if source.as_bytes().get(offset) != Some(&b'`') {
            return None;
        }
        let close = source[offset + 1..].find('`')?;
        Some(ExternalMatch {
            index: 0,
            length: close + 2,
        })
    }
}

fn literals_table() -> GrammarTable {
    let rules = vec![
        ("source_file", repeat(sym("_literal"))),
        ("_literal", choice([sym("string"), sym("raw_string")])),
        (
            "string",
            token(seq([lit("\""), pattern("[^\"]*"), lit("\"")])),
        ),
    ];
    let grammar = Grammar {
        name: "literals".to_string(),
        rules: rules
            .into_iter()
            .map(|(name, body)| (name.to_string(), body))
            .collect(),
        extras: vec![pattern("\\s+")],
        precedences: Vec::new(),
        conflicts: Vec::new(),
        externals: vec![sym("raw_string")],
        inline: Vec::new(),
        word: None,
    };
    GrammarTable::compile(&grammar).unwrap()
}

#[test]
fn scanner_and_builtin_lexer_split_the_work() {
    let table = literals_table();
    let source = "\"abc\" `xyz`";
    let outcome =
        parse_with_scanner(source, &table, &Backticks, ParseOptions::default()).unwrap();

    assert!(outcome.diagnostics.is_empty());
    insta::assert_snapshot!(
        outcome.tree.to_sexp(),
        @"(source_file (string) (raw_string))"
    );
    assert_eq!(outcome.tree.reconstruct(source), source);
}

#[test]
fn external_token_text_is_preserved() {
    let table = literals_table();
    let source = "`one two`";
    let outcome =
        parse_with_scanner(source, &table, &Backticks, ParseOptions::default()).unwrap();

    let root = outcome.tree.root();
    let token = root.child(0).unwrap().as_token().unwrap();
    assert_eq!(token.kind(), "raw_string");
    assert_eq!(token.text(source), "`one two`");
    assert!(token.is_named());
}

#[test]
fn unterminated_external_falls_through_to_recovery() {
    let table = literals_table();
    let source = "\"abc\" `xyz";
    let outcome =
        parse_with_scanner(source, &table, &Backticks, ParseOptions::default()).unwrap();

    assert!(outcome.diagnostics.has_errors());
    assert_eq!(outcome.tree.error_count(), 1);
    assert_eq!(outcome.tree.reconstruct(source), source);
}

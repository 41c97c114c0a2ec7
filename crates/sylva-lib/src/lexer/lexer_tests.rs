use sylva_core::grammar::build::*;
use sylva_core::Grammar;

use super::{ExternalMatch, ExternalScanner, Lexer, NoExternalScanner, ValidExternals};
use crate::table::{GrammarTable, TerminalId, TokenSet};

fn lex_grammar() -> GrammarTable {
    let grammar = Grammar {
        name: "lex".to_string(),
        rules: vec![
            ("source_file".to_string(), repeat(sym("_item"))),
            (
                "_item".to_string(),
                choice([
                    lit("if"),
                    lit("=="),
                    lit("="),
                    sym("identifier"),
                    sym("number"),
                ]),
            ),
            (
                "identifier".to_string(),
                pattern("[a-zA-Z_][a-zA-Z0-9_]*"),
            ),
            ("number".to_string(), pattern("[0-9]+")),
        ],
        extras: vec![pattern("\\s+")],
        precedences: Vec::new(),
        conflicts: Vec::new(),
        externals: Vec::new(),
        inline: Vec::new(),
        word: Some("identifier".to_string()),
    };
    GrammarTable::compile(&grammar).unwrap()
}

fn terminal(table: &GrammarTable, name: &str) -> TerminalId {
    let index = table
        .terminals
        .iter()
        .position(|t| t.name == name)
        .unwrap_or_else(|| panic!("no terminal named {name}"));
    TerminalId(index as u16)
}

fn expecting(table: &GrammarTable, names: &[&str]) -> TokenSet {
    let mut set = TokenSet::empty(table.terminals.len());
    for name in names {
        set.insert(terminal(table, name));
    }
    set
}

#[test]
fn longest_literal_wins() {
    let table = lex_grammar();
    let lexer = Lexer::new("== 1", &table, &NoExternalScanner);
    let expected = expecting(&table, &["=", "=="]);

    let token = lexer.token_at(0, &expected).unwrap();
    assert_eq!(token.terminal, terminal(&table, "=="));
    assert_eq!(token.len(), 2);
}

#[test]
fn keyword_needs_word_boundary() {
    let table = lex_grammar();
    let expected = expecting(&table, &["if", "identifier"]);

    // `ifx` continues as a word, so the keyword does not apply.
    let lexer = Lexer::new("ifx", &table, &NoExternalScanner);
    let token = lexer.token_at(0, &expected).unwrap();
    assert_eq!(token.terminal, terminal(&table, "identifier"));
    assert_eq!(token.len(), 3);

    // At a boundary the keyword beats the identifier of equal length.
    let lexer = Lexer::new("if x", &table, &NoExternalScanner);
    let token = lexer.token_at(0, &expected).unwrap();
    assert_eq!(token.terminal, terminal(&table, "if"));
    assert_eq!(token.len(), 2);
}

#[test]
fn keyword_text_lexes_as_identifier_when_keyword_not_expected() {
    let table = lex_grammar();
    let lexer = Lexer::new("if", &table, &NoExternalScanner);
    let expected = expecting(&table, &["identifier"]);

    let token = lexer.token_at(0, &expected).unwrap();
    assert_eq!(token.terminal, terminal(&table, "identifier"));
}

#[test]
fn expected_set_filters_candidates() {
    let table = lex_grammar();
    let lexer = Lexer::new("abc", &table, &NoExternalScanner);

    let numbers_only = expecting(&table, &["number"]);
    assert!(lexer.token_at(0, &numbers_only).is_none());
}

#[test]
fn trivia_matches_extras_only() {
    let table = lex_grammar();
    let lexer = Lexer::new("  a", &table, &NoExternalScanner);

    let trivia = lexer.trivia_at(0).unwrap();
    assert_eq!(trivia.len(), 2);
    assert!(lexer.trivia_at(2).is_none());
}

#[test]
fn any_token_ignores_expectations() {
    let table = lex_grammar();
    let lexer = Lexer::new("42", &table, &NoExternalScanner);

    let token = lexer.any_token_at(0).unwrap();
    assert_eq!(token.terminal, terminal(&table, "number"));
}

struct HashComments;

impl ExternalScanner for HashComments {
    fn scan(&self, source: &str, offset: usize, valid: &ValidExternals) -> Option<ExternalMatch> {
        if !valid.contains(0) || !source[offset..].starts_with('#') {
            return None;
        }
        let rest = &source[offset..];
        let length = rest.find('\n').unwrap_or(rest.len());
        Some(ExternalMatch { index: 0, length })
    }
}

fn external_grammar() -> GrammarTable {
    let grammar = Grammar {
        name: "ext".to_string(),
        rules: vec![
            ("source_file".to_string(), repeat(sym("_item"))),
            (
                "_item".to_string(),
                choice([sym("comment"), sym("identifier")]),
            ),
            (
                "identifier".to_string(),
                pattern("[a-zA-Z_][a-zA-Z0-9_]*"),
            ),
        ],
        extras: vec![pattern("\\s+")],
        precedences: Vec::new(),
        conflicts: Vec::new(),
        externals: vec![sym("comment")],
        inline: Vec::new(),
        word: None,
    };
    GrammarTable::compile(&grammar).unwrap()
}

#[test]
fn external_scanner_is_consulted_first() {
    let table = external_grammar();
    let lexer = Lexer::new("# note\nx", &table, &HashComments);
    let expected = expecting(&table, &["comment", "identifier"]);

    let token = lexer.token_at(0, &expected).unwrap();
    assert_eq!(token.terminal, terminal(&table, "comment"));
    assert_eq!(token.len(), 6);
}

#[test]
fn external_skipped_when_not_expected() {
    let table = external_grammar();
    let lexer = Lexer::new("# note", &table, &HashComments);
    let expected = expecting(&table, &["identifier"]);

    assert!(lexer.token_at(0, &expected).is_none());
}

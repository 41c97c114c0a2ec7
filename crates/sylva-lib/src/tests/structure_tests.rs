use sylva_core::grammar::build::*;
use sylva_core::{Grammar, Rule};

use crate::table::GrammarTable;
use crate::parse;

use super::helpers::parse_lang;

fn table_for(rules: Vec<(&str, Rule)>, inline: Vec<&str>) -> GrammarTable {
    let grammar = Grammar {
        name: "test".to_string(),
        rules: rules
            .into_iter()
            .map(|(name, body)| (name.to_string(), body))
            .collect(),
        extras: vec![pattern("\\s+")],
        precedences: Vec::new(),
        conflicts: Vec::new(),
        externals: Vec::new(),
        inline: inline.into_iter().map(str::to_string).collect(),
        word: None,
    };
    GrammarTable::compile(&grammar).unwrap()
}

#[test]
fn fields_are_queryable_by_name() {
    let source = "int x = 5;";
    let outcome = parse_lang(source);

    let root = outcome.tree.root();
    let declaration = root.child_nodes().next().unwrap();
    assert_eq!(declaration.kind(), "declaration");
    assert_eq!(declaration.text(source), source);

    let name = declaration.child_by_field("name").unwrap();
    assert_eq!(name.kind(), "identifier");
    assert_eq!(name.as_token().unwrap().text(source), "x");

    let value = declaration.child_by_field("value").unwrap();
    assert_eq!(value.as_token().unwrap().text(source), "5");

    assert_eq!(declaration.children_by_field("name").len(), 1);
    assert!(declaration.child_by_field("missing").is_none());
}

#[test]
fn operator_chains_expose_left_and_right() {
    let source = "a - b - c;";
    let outcome = parse_lang(source);

    let statement = outcome.tree.root().child_nodes().next().unwrap();
    let outer = statement.child_nodes().next().unwrap();
    assert_eq!(outer.kind(), "binary_expression");

    let left = outer.child_by_field("left").unwrap().as_node().unwrap();
    assert_eq!(left.kind(), "binary_expression");
    assert_eq!(left.text(source), "a - b");

    let operator = outer.child_by_field("operator").unwrap();
    assert_eq!(operator.as_token().unwrap().text(source), "-");

    let right = outer.child_by_field("right").unwrap();
    assert_eq!(right.as_token().unwrap().text(source), "c");
}

#[test]
fn hidden_rules_never_surface() {
    let rendered = parse_lang("int x = 5; x + 1;").tree.to_sexp();
    assert!(!rendered.contains("_statement"));
    assert!(!rendered.contains("_expression"));
}

#[test]
fn aliased_tokens_take_the_alias_name() {
    let table = table_for(
        vec![
            ("source_file", repeat(alias(sym("number"), "value", true))),
            ("number", pattern("[0-9]+")),
        ],
        Vec::new(),
    );
    let outcome = parse("1 2", &table).unwrap();
    insta::assert_snapshot!(outcome.tree.to_sexp(), @"(source_file (value) (value))");
}

#[test]
fn inline_rules_are_spliced_into_the_parent() {
    let table = table_for(
        vec![
            ("source_file", repeat(sym("item"))),
            ("item", seq([sym("number"), lit(";")])),
            ("number", pattern("[0-9]+")),
        ],
        vec!["item"],
    );
    let outcome = parse("1; 2;", &table).unwrap();
    insta::assert_snapshot!(outcome.tree.to_sexp(), @"(source_file (number) (number))");
}

#[test]
fn dump_shows_fields_and_token_text() {
    let source = "int x = 5;";
    let outcome = parse_lang(source);
    insta::assert_snapshot!(outcome.tree.dump(source), @r#"
    source_file
      declaration
        primitive_type
          int "int"
        name: identifier "x"
        = "="
        value: number "5"
        ; ";"
    "#);
}

#[test]
fn root_spans_the_whole_input() {
    let source = "  int x = 5;  ";
    let outcome = parse_lang(source);
    let root = outcome.tree.root();
    assert_eq!(u32::from(root.range().start()), 0);
    assert_eq!(u32::from(root.range().end()), source.len() as u32);
    assert_eq!(outcome.tree.reconstruct(source), source);
}

use sylva_core::grammar::build::*;
use sylva_core::{Grammar, Rule};

use super::*;

fn grammar(rules: Vec<(&str, Rule)>) -> Grammar {
    Grammar {
        name: "test".to_string(),
        rules: rules
            .into_iter()
            .map(|(name, body)| (name.to_string(), body))
            .collect(),
        extras: vec![pattern("\\s+")],
        precedences: Vec::new(),
        conflicts: Vec::new(),
        externals: Vec::new(),
        inline: Vec::new(),
        word: None,
    }
}

fn compile(grammar: &Grammar) -> GrammarTable {
    GrammarTable::compile(grammar).unwrap()
}

fn rule_named(table: &GrammarTable, name: &str) -> RuleId {
    let index = table
        .rules
        .iter()
        .position(|r| r.name == name)
        .unwrap_or_else(|| panic!("no rule `{name}`"));
    RuleId(index as u16)
}

fn terminal_named(table: &GrammarTable, name: &str) -> TerminalId {
    let index = table
        .terminals
        .iter()
        .position(|t| t.name == name)
        .unwrap_or_else(|| panic!("no terminal `{name}`"));
    TerminalId(index as u16)
}

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

fn expression_grammar() -> Grammar {
    grammar(vec![
        ("source_file", repeat(sym("_expression"))),
        (
            "_expression",
            choice([sym("binary_expression"), sym("identifier"), sym("number")]),
        ),
        (
            "binary_expression",
            choice([binary_op("+", 1), binary_op("*", 2)]),
        ),
        ("identifier", pattern("[a-z]+")),
        ("number", pattern("[0-9]+")),
    ])
}

#[test]
fn first_sets_follow_references() {
    let table = compile(&expression_grammar());
    let entry = table.rule(rule_named(&table, "source_file")).body;

    let first = table.first(entry);
    assert!(first.contains(terminal_named(&table, "identifier")));
    assert!(first.contains(terminal_named(&table, "number")));
    assert!(!first.contains(terminal_named(&table, "+")));
}

#[test]
fn repeat_bodies_are_nullable() {
    let table = compile(&expression_grammar());
    let entry = table.rule(rule_named(&table, "source_file")).body;
    assert!(table.is_nullable(entry));

    let ident = table.rule(rule_named(&table, "identifier")).body;
    assert!(!table.is_nullable(ident));
}

#[test]
fn left_recursion_forms_one_group() {
    let table = compile(&expression_grammar());

    let expr_group = table.rule(rule_named(&table, "_expression")).group;
    let binary_group = table.rule(rule_named(&table, "binary_expression")).group;
    assert!(expr_group.is_some());
    assert_eq!(expr_group, binary_group);

    assert!(table.rule(rule_named(&table, "source_file")).group.is_none());
    assert!(table.rule(rule_named(&table, "identifier")).group.is_none());
}

#[test]
fn continuations_are_sorted_tightest_first() {
    let table = compile(&expression_grammar());
    let group_index = table
        .rule(rule_named(&table, "binary_expression"))
        .group
        .unwrap();
    let group = &table.groups[group_index as usize];

    let levels: Vec<i32> = group.continuations.iter().map(|c| c.level).collect();
    assert_eq!(levels, vec![2, 1]);

    let mul = &group.continuations[0];
    assert_eq!(mul.owner, rule_named(&table, "binary_expression"));
    assert_eq!(mul.assoc, Assoc::Left);
    assert!(mul.explicit_prec);
    assert!(mul.head_field.is_some());
    assert!(mul.bp_target.is_some());
    assert!(mul.first.contains(terminal_named(&table, "*")));
    assert!(!mul.first.contains(terminal_named(&table, "+")));
}

#[test]
fn bare_group_reference_is_a_unit_alternative() {
    let table = compile(&expression_grammar());
    let info = table.rule(rule_named(&table, "_expression"));

    assert!(matches!(
        info.alts[0].shape,
        BaseShape::Unit(target) if target == rule_named(&table, "binary_expression")
    ));
    assert!(matches!(info.alts[1].shape, BaseShape::Normal { .. }));
}

#[test]
fn nullable_continuation_tail_is_rejected() {
    let g = grammar(vec![(
        "a",
        choice([seq([sym("a"), optional(lit("x"))]), lit("y")]),
    )]);
    let err = GrammarTable::compile(&g).unwrap_err();
    assert!(matches!(err, GrammarError::InvalidLeftRecursion { .. }));
}

#[test]
fn left_recursion_behind_nullable_prefix_is_rejected() {
    let g = grammar(vec![(
        "a",
        choice([seq([optional(lit("-")), sym("a"), lit("x")]), lit("y")]),
    )]);
    let err = GrammarTable::compile(&g).unwrap_err();
    assert!(matches!(err, GrammarError::InvalidLeftRecursion { .. }));
}

#[test]
fn unit_delegation_cycle_is_rejected() {
    let g = grammar(vec![
        ("a", choice([sym("b"), lit("x")])),
        ("b", sym("a")),
    ]);
    let err = GrammarTable::compile(&g).unwrap_err();
    assert!(matches!(err, GrammarError::InvalidLeftRecursion { .. }));
}

#[test]
fn indistinguishable_alternatives_need_a_conflict() {
    let g = grammar(vec![
        ("source_file", choice([sym("a"), sym("b")])),
        ("a", seq([lit("x"), lit("y")])),
        ("b", seq([lit("x"), lit("z")])),
    ]);
    let err = GrammarTable::compile(&g).unwrap_err();
    match err {
        GrammarError::UnresolvedConflict { left, right } => {
            assert_eq!(left, "a");
            assert_eq!(right, "b");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn declared_conflict_permits_competition() {
    let mut g = grammar(vec![
        ("source_file", choice([sym("a"), sym("b")])),
        ("a", seq([lit("x"), lit("y")])),
        ("b", seq([lit("x"), lit("z")])),
    ]);
    g.conflicts = vec![vec!["a".to_string(), "b".to_string()]];
    assert!(GrammarTable::compile(&g).is_ok());
}

#[test]
fn sync_set_has_closers_and_item_starters() {
    let table = compile(&grammar(vec![
        ("source_file", repeat(sym("statement"))),
        ("statement", seq([sym("identifier"), lit(";")])),
        ("identifier", pattern("[a-z]+")),
    ]));

    assert!(table.sync_set.contains(terminal_named(&table, ";")));
    assert!(table.sync_set.contains(terminal_named(&table, "identifier")));
}

use super::helpers::{parse_lang, sexp};

#[test]
fn product_binds_tighter_than_sum() {
    insta::assert_snapshot!(
        sexp("a + b * c;"),
        @"(source_file (expression_statement (binary_expression left: (identifier) right: (binary_expression left: (identifier) right: (identifier)))))"
    );
}

#[test]
fn product_on_the_left_closes_first() {
    insta::assert_snapshot!(
        sexp("a * b + c;"),
        @"(source_file (expression_statement (binary_expression left: (binary_expression left: (identifier) right: (identifier)) right: (identifier))))"
    );
}

#[test]
fn subtraction_is_left_associative() {
    insta::assert_snapshot!(
        sexp("a - b - c;"),
        @"(source_file (expression_statement (binary_expression left: (binary_expression left: (identifier) right: (identifier)) right: (identifier))))"
    );
}

#[test]
fn assignment_is_right_associative() {
    insta::assert_snapshot!(
        sexp("a = b = c;"),
        @"(source_file (expression_statement (assignment_expression left: (identifier) right: (assignment_expression left: (identifier) right: (identifier)))))"
    );
}

#[test]
fn assignment_takes_a_full_expression_on_the_right() {
    insta::assert_snapshot!(
        sexp("a = b + c;"),
        @"(source_file (expression_statement (assignment_expression left: (identifier) right: (binary_expression left: (identifier) right: (identifier)))))"
    );
}

#[test]
fn parentheses_override_precedence() {
    insta::assert_snapshot!(
        sexp("a * (b + c);"),
        @"(source_file (expression_statement (binary_expression left: (identifier) right: (parenthesized_expression (binary_expression left: (identifier) right: (identifier))))))"
    );
}

#[test]
fn prefix_operator_binds_tighter_than_products() {
    insta::assert_snapshot!(
        sexp("- a * b;"),
        @"(source_file (expression_statement (binary_expression left: (unary_expression operand: (identifier)) right: (identifier))))"
    );
}

#[test]
fn non_associative_chain_is_diagnosed_but_parses() {
    let outcome = parse_lang("a == b == c;");
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics.has_errors());
    insta::assert_snapshot!(
        outcome.tree.to_sexp(),
        @"(source_file (expression_statement (binary_expression left: (binary_expression left: (identifier) right: (identifier)) right: (identifier))))"
    );
}

#[test]
fn keyword_needs_a_word_boundary() {
    insta::assert_snapshot!(
        sexp("intx = 5;"),
        @"(source_file (expression_statement (assignment_expression left: (identifier) right: (number))))"
    );
    insta::assert_snapshot!(
        sexp("int x = 5;"),
        @"(source_file (declaration (primitive_type) name: (identifier) value: (number)))"
    );
}

//! The full pipeline over a grammar loaded from JSON rather than built in
//! code, the way the CLI drives it.

use indoc::indoc;
use sylva_core::Grammar;

use crate::engine::parse;
use crate::table::GrammarTable;

fn assignments_table() -> GrammarTable {
    let json = serde_json::json!({
        "name": "assignments",
        "rules": {
            "source_file": {
                "type": "REPEAT",
                "content": { "type": "SYMBOL", "name": "pair" }
            },
            "pair": {
                "type": "SEQ",
                "members": [
                    {
                        "type": "FIELD",
                        "name": "key",
                        "content": { "type": "SYMBOL", "name": "identifier" }
                    },
                    { "type": "STRING", "value": "=" },
                    {
                        "type": "FIELD",
                        "name": "value",
                        "content": { "type": "SYMBOL", "name": "number" }
                    }
                ]
            },
            "identifier": { "type": "PATTERN", "value": "[a-zA-Z_]+" },
            "number": { "type": "PATTERN", "value": "[0-9]+" },
            "comment": {
                "type": "TOKEN",
                "content": {
                    "type": "SEQ",
                    "members": [
                        { "type": "STRING", "value": "#" },
                        { "type": "PATTERN", "value": "[^\\n]*" }
                    ]
                }
            }
        },
        "extras": [
            { "type": "PATTERN", "value": "\\s+" },
            { "type": "SYMBOL", "name": "comment" }
        ]
    });

    let grammar = Grammar::from_json(&json.to_string()).unwrap();
    GrammarTable::compile(&grammar).unwrap()
}

#[test]
fn json_grammar_parses_end_to_end() {
    let table = assignments_table();
    let source = indoc! {"
        x = 1
        # a comment between pairs
        y = 2
    "};

    let outcome = parse(source, &table).unwrap();
    assert!(!outcome.diagnostics.has_errors());
    insta::assert_snapshot!(
        outcome.tree.to_sexp(),
        @"(source_file (pair key: (identifier) value: (number)) (pair key: (identifier) value: (number)))"
    );
    assert_eq!(outcome.tree.reconstruct(source), source);
}

#[test]
fn comments_survive_as_trivia_leaves() {
    let table = assignments_table();
    let source = "x = 1 # trailing";

    let outcome = parse(source, &table).unwrap();
    let comment = outcome
        .tree
        .root()
        .descendants()
        .filter_map(|el| el.as_token())
        .find(|t| t.kind() == "comment")
        .unwrap();
    assert!(comment.is_trivia());
    assert_eq!(comment.text(source), "# trailing");
}

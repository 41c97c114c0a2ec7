use super::types::Grammar;
use crate::grammar::build::*;

fn sample() -> Grammar {
    Grammar {
        name: "sample".into(),
        rules: vec![
            (
                "source_file".into(),
                repeat(choice([sym("word"), sym("number")])),
            ),
            ("word".into(), pattern("[a-z]+")),
            ("number".into(), token(repeat1(pattern("[0-9]")))),
        ],
        extras: vec![pattern("\\s")],
        precedences: vec![],
        conflicts: vec![vec!["word".into(), "number".into()]],
        externals: vec![sym("comment")],
        inline: vec!["word".into()],
        word: Some("word".into()),
    }
}

#[test]
fn binary_round_trip() {
    let grammar = sample();
    let bytes = grammar.to_binary();
    let decoded = Grammar::from_binary(&bytes).unwrap();

    assert_eq!(decoded.name, grammar.name);
    assert_eq!(decoded.rules, grammar.rules);
    assert_eq!(decoded.extras, grammar.extras);
    assert_eq!(decoded.conflicts, grammar.conflicts);
    assert_eq!(decoded.externals, grammar.externals);
    assert_eq!(decoded.inline, grammar.inline);
    assert_eq!(decoded.word, grammar.word);
}

#[test]
fn binary_is_smaller_than_json() {
    let grammar = sample();
    let json = serde_json::to_string(&grammar).unwrap();
    assert!(grammar.to_binary().len() < json.len());
}

#[test]
fn truncated_binary_is_an_error() {
    let bytes = sample().to_binary();
    assert!(Grammar::from_binary(&bytes[..bytes.len() / 2]).is_err());
}

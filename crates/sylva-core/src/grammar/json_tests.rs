use indoc::indoc;

use super::types::{Grammar, Precedence, PrecedenceEntry, Rule};

#[test]
fn minimal_grammar() {
    let json = indoc! {r#"
    {
        "name": "mini",
        "rules": {
            "source_file": { "type": "REPEAT", "content": { "type": "SYMBOL", "name": "word" } },
            "word": { "type": "PATTERN", "value": "[a-z]+" }
        }
    }
    "#};

    let grammar = Grammar::from_json(json).unwrap();
    assert_eq!(grammar.name, "mini");
    assert_eq!(grammar.entry_rule(), Some("source_file"));
    assert_eq!(grammar.rules.len(), 2);
    assert!(grammar.extras.is_empty());
    assert!(grammar.word.is_none());
}

#[test]
fn rule_definition_order_preserved() {
    let json = indoc! {r#"
    {
        "name": "ordered",
        "rules": {
            "zebra": { "type": "BLANK" },
            "apple": { "type": "BLANK" },
            "mango": { "type": "BLANK" }
        }
    }
    "#};

    let grammar = Grammar::from_json(json).unwrap();
    let names: Vec<_> = grammar.rules.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["zebra", "apple", "mango"]);
    assert_eq!(grammar.entry_rule(), Some("zebra"));
}

#[test]
fn nested_combinators() {
    let json = indoc! {r#"
    {
        "name": "expr",
        "rules": {
            "call": {
                "type": "SEQ",
                "members": [
                    { "type": "FIELD", "name": "function", "content": { "type": "SYMBOL", "name": "id" } },
                    { "type": "STRING", "value": "(" },
                    { "type": "CHOICE", "members": [
                        { "type": "SYMBOL", "name": "id" },
                        { "type": "BLANK" }
                    ] },
                    { "type": "STRING", "value": ")" }
                ]
            },
            "id": { "type": "PATTERN", "value": "[a-z]+" }
        }
    }
    "#};

    let grammar = Grammar::from_json(json).unwrap();
    let Rule::Seq(members) = grammar.rule("call").unwrap() else {
        panic!("expected seq");
    };
    assert_eq!(members.len(), 4);
    assert!(matches!(&members[0], Rule::Field { name, .. } if name == "function"));
    assert!(matches!(&members[2], Rule::Choice(alts) if alts.len() == 2));
}

#[test]
fn precedence_variants() {
    let json = indoc! {r#"
    {
        "name": "prec",
        "rules": {
            "e": {
                "type": "CHOICE",
                "members": [
                    { "type": "PREC_LEFT", "value": 1, "content": { "type": "STRING", "value": "a" } },
                    { "type": "PREC_RIGHT", "value": "assign", "content": { "type": "STRING", "value": "b" } }
                ]
            }
        },
        "precedences": [[
            { "type": "STRING", "value": "assign" },
            { "type": "SYMBOL", "name": "e" }
        ]]
    }
    "#};

    let grammar = Grammar::from_json(json).unwrap();
    let Rule::Choice(alts) = grammar.rule("e").unwrap() else {
        panic!("expected choice");
    };
    assert!(
        matches!(&alts[0], Rule::PrecLeft { value: Precedence::Integer(1), .. })
    );
    assert!(
        matches!(&alts[1], Rule::PrecRight { value: Precedence::Name(n), .. } if n == "assign")
    );
    assert_eq!(
        grammar.precedences[0][0],
        PrecedenceEntry::Name("assign".to_string())
    );
    assert_eq!(
        grammar.precedences[0][1],
        PrecedenceEntry::Symbol("e".to_string())
    );
}

#[test]
fn full_sections() {
    let json = indoc! {r#"
    {
        "name": "sections",
        "word": "identifier",
        "rules": {
            "source_file": { "type": "SYMBOL", "name": "identifier" },
            "identifier": { "type": "PATTERN", "value": "[a-z]+" }
        },
        "extras": [
            { "type": "PATTERN", "value": "\\s" },
            { "type": "SYMBOL", "name": "comment" }
        ],
        "externals": [
            { "type": "SYMBOL", "name": "comment" },
            { "type": "SYMBOL", "name": "string_literal" }
        ],
        "conflicts": [["source_file", "identifier"]],
        "inline": ["identifier"]
    }
    "#};

    let grammar = Grammar::from_json(json).unwrap();
    assert_eq!(grammar.word.as_deref(), Some("identifier"));
    assert_eq!(grammar.extras.len(), 2);
    assert_eq!(grammar.externals.len(), 2);
    assert_eq!(grammar.conflicts, vec![vec!["source_file", "identifier"]]);
    assert_eq!(grammar.inline, vec!["identifier"]);
}

#[test]
fn unknown_rule_type_is_an_error() {
    let json = indoc! {r#"
    {
        "name": "bad",
        "rules": {
            "r": { "type": "PREC_DYNAMIC", "value": 1, "content": { "type": "BLANK" } }
        }
    }
    "#};

    let err = Grammar::from_json(json).unwrap_err();
    assert!(err.to_string().contains("unsupported rule construct"));
}

#[test]
fn malformed_json_is_an_error() {
    let err = Grammar::from_json("{ not json").unwrap_err();
    assert!(err.to_string().contains("JSON parse error"));
}

#[test]
fn rule_walk_visits_preorder() {
    let rule = Rule::Seq(vec![
        Rule::String("a".into()),
        Rule::Repeat(Box::new(Rule::Symbol("b".into()))),
    ]);

    let mut kinds = Vec::new();
    rule.walk(&mut |r| {
        kinds.push(match r {
            Rule::Seq(_) => "seq",
            Rule::String(_) => "string",
            Rule::Repeat(_) => "repeat",
            Rule::Symbol(_) => "symbol",
            _ => "other",
        })
    });
    assert_eq!(kinds, ["seq", "string", "repeat", "symbol"]);
}

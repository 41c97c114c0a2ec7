use std::path::PathBuf;

use sylva_lib::parse;
use sylva_lib::tree::ElementRef;

use crate::util::{load_table, read_input};

pub struct TokensArgs {
    pub grammar: PathBuf,
    pub input: PathBuf,
    pub no_trivia: bool,
    pub color: bool,
}

/// Prints one line per token leaf: byte range, kind, and text. The stream
/// comes out of a full parse, so it reflects the context-sensitive lexing
/// the engine actually performed.
pub fn run(args: TokensArgs) {
    let table = load_table(&args.grammar);
    let source = read_input(&args.input);

    let outcome = parse(&source, &table).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });

    for element in outcome.tree.root().descendants() {
        let ElementRef::Token(token) = element else {
            continue;
        };
        if args.no_trivia && token.is_trivia() {
            continue;
        }
        let range = token.range();
        println!(
            "{}..{} {} {:?}",
            u32::from(range.start()),
            u32::from(range.end()),
            token.kind(),
            token.text(&source)
        );
    }

    if !outcome.diagnostics.is_empty() {
        let path = args.input.display().to_string();
        eprintln!(
            "{}",
            outcome
                .diagnostics
                .printer()
                .source(&source)
                .path(&path)
                .colored(args.color)
                .render()
        );
    }
    if outcome.diagnostics.has_errors() {
        std::process::exit(1);
    }
}

use std::path::PathBuf;

use sylva_lib::parse;

use crate::util::{load_table, read_input};

pub struct TreeArgs {
    pub grammar: PathBuf,
    pub input: PathBuf,
    pub sexp: bool,
    pub color: bool,
}

pub fn run(args: TreeArgs) {
    let table = load_table(&args.grammar);
    let source = read_input(&args.input);

    let outcome = parse(&source, &table).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });

    if args.sexp {
        println!("{}", outcome.tree.to_sexp());
    } else {
        print!("{}", outcome.tree.dump(&source));
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

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use sylva_core::Grammar;
use sylva_lib::GrammarTable;

/// Reads a file argument, with `-` standing for stdin.
pub fn read_input(path: &Path) -> String {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).unwrap_or_else(|e| {
            eprintln!("error: failed to read stdin: {e}");
            std::process::exit(1);
        });
        return buf;
    }
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        std::process::exit(1);
    })
}

/// Loads and compiles a grammar file, exiting with a message on failure.
pub fn load_table(path: &Path) -> GrammarTable {
    let text = read_input(path);
    let grammar = Grammar::from_json(&text).unwrap_or_else(|e| {
        eprintln!("error: {}: {e}", path.display());
        std::process::exit(1);
    });
    GrammarTable::compile(&grammar).unwrap_or_else(|e| {
        eprintln!("error: {}: {e}", path.display());
        std::process::exit(1);
    })
}

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn should_colorize(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

#[derive(Parser)]
#[command(name = "sylva", bin_name = "sylva")]
#[command(about = "Grammar-driven parser producing lossless syntax trees")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a grammar file
    #[command(after_help = r#"EXAMPLES:
  sylva check grammar.json"#)]
    Check {
        /// Path to grammar.json (use "-" for stdin)
        grammar: PathBuf,
    },

    /// Parse input with a grammar and print the syntax tree
    #[command(after_help = r#"EXAMPLES:
  sylva tree grammar.json main.d
  sylva tree grammar.json - --sexp < main.d"#)]
    Tree {
        /// Path to grammar.json
        grammar: PathBuf,

        /// Source file to parse (use "-" for stdin)
        input: PathBuf,

        /// Print a compact S-expression instead of the indented tree
        #[arg(long)]
        sexp: bool,

        /// Colorize diagnostics (auto-detected by default)
        #[arg(long, default_value = "auto", value_name = "WHEN")]
        color: ColorChoice,
    },

    /// Parse input and print its token stream
    #[command(after_help = r#"EXAMPLES:
  sylva tokens grammar.json main.d
  sylva tokens grammar.json main.d --no-trivia"#)]
    Tokens {
        /// Path to grammar.json
        grammar: PathBuf,

        /// Source file to lex (use "-" for stdin)
        input: PathBuf,

        /// Skip whitespace and other trivia tokens
        #[arg(long)]
        no_trivia: bool,

        /// Colorize diagnostics (auto-detected by default)
        #[arg(long, default_value = "auto", value_name = "WHEN")]
        color: ColorChoice,
    },
}

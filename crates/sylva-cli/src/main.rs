mod cli;
mod commands;
mod util;

use clap::Parser;

use cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Check { grammar } => commands::check::run(commands::check::CheckArgs { grammar }),
        Command::Tree {
            grammar,
            input,
            sexp,
            color,
        } => commands::tree::run(commands::tree::TreeArgs {
            grammar,
            input,
            sexp,
            color: color.should_colorize(),
        }),
        Command::Tokens {
            grammar,
            input,
            no_trivia,
            color,
        } => commands::tokens::run(commands::tokens::TokensArgs {
            grammar,
            input,
            no_trivia,
            color: color.should_colorize(),
        }),
    }
}

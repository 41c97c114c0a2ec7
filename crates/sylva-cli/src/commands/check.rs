use std::path::PathBuf;

use crate::util::load_table;

pub struct CheckArgs {
    pub grammar: PathBuf,
}

/// Compiles the grammar and exits. Silent on success, like `cargo check`;
/// load and compile failures are reported by [`load_table`].
pub fn run(args: CheckArgs) {
    let _ = load_table(&args.grammar);
}

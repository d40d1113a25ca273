use std::path::PathBuf;
use std::process::exit;

use clap::Parser;

use cstack_db::console;
use cstack_db::repl;
use cstack_db::table::Table;

/// A single-table, single-process key-value store backed by a disk-resident B+tree.
#[derive(Parser)]
#[command(name = "cstack_db", version)]
struct Cli {
    /// Path to the database file
    db_filename: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.db_filename.as_os_str().is_empty() {
        console::red("Must supply a database filename.");
        exit(1);
    }

    let table = Table::open(&cli.db_filename);
    repl::run(table);
}

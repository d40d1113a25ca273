//! The interactive read-eval-print loop: prompt, read a line, dispatch to
//! meta-commands or the statement pipeline, report the result.

use std::io::{self, BufRead};

use crate::console;
use crate::execution::{execute_statement, ExecuteResult};
use crate::meta::{do_meta_command, MetaCommandResult};
use crate::statement::{prepare_statement, PrepareError};
use crate::table::Table;

const PROMPT: &str = "db > ";

pub fn run(mut table: Table) {
    console::green("Use .commands for help");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        console::prompt(PROMPT);

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(_)) | None => {
                table.close();
                return;
            }
        };

        if line.is_empty() {
            continue;
        }

        if line.starts_with('.') {
            match do_meta_command(&line, &mut table) {
                MetaCommandResult::Success => continue,
                MetaCommandResult::Exit => {
                    table.close();
                    return;
                }
                MetaCommandResult::Unrecognized => {
                    console::red(&format!("Unrecognized command '{}'", line));
                    continue;
                }
            }
        }

        let statement = match prepare_statement(&line) {
            Ok(stmt) => stmt,
            Err(PrepareError::NegativeId) => {
                console::red("ID must be positive.");
                continue;
            }
            Err(PrepareError::StringTooLong) => {
                console::red("String is too long.");
                continue;
            }
            Err(PrepareError::SyntaxError) => {
                console::red("Syntax Error. Could not parse statement.");
                continue;
            }
            Err(PrepareError::UnrecognizedStatement) => {
                console::red(&format!("Unrecognized keyword at start of '{}'.", line));
                continue;
            }
        };

        match execute_statement(&statement, &mut table) {
            ExecuteResult::Success => console::yellow("Executed."),
            ExecuteResult::DuplicateKey => console::red("Error: Duplicate key."),
            ExecuteResult::SilentError => {}
        }
    }
}

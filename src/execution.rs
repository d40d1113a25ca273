//! Executes a prepared `Statement` against an open `Table`, matching the
//! reference's exact wording for success/failure feedback and the
//! line-oriented CSV format used by import/export.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};

use tracing::{info, warn};

use crate::console;
use crate::errors::Result;
use crate::row::{UserRow, EMAIL_MAX_LENGTH, USERNAME_MAX_LENGTH};
use crate::statement::Statement;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteResult {
    Success,
    DuplicateKey,
    SilentError,
}

pub fn execute_statement(statement: &Statement, table: &mut Table) -> ExecuteResult {
    match statement {
        Statement::Insert(row) => execute_insert(row, table),
        Statement::Select => execute_select_all(table),
        Statement::SpecificSelect(id) => execute_select_one(*id, table),
        Statement::Drop(id) => execute_drop(*id, table),
        Statement::Update(payload) => execute_update(payload, table),
        Statement::Import(filename) => execute_import(filename, table),
        Statement::Export(filename) => execute_export(filename, table),
    }
}

fn execute_insert(row: &UserRow, table: &mut Table) -> ExecuteResult {
    if table.insert(row) {
        info!(id = row.id, "insert");
        ExecuteResult::Success
    } else {
        info!(id = row.id, "insert rejected: duplicate key");
        ExecuteResult::DuplicateKey
    }
}

fn execute_select_all(table: &mut Table) -> ExecuteResult {
    let mut cursor = table.start();
    let mut row_count = 0u32;
    while !cursor.end_of_table {
        let row = table.row_at(cursor);
        println!("{}", row.print());
        table.advance(&mut cursor);
        row_count += 1;
    }
    info!(row_count, "select all");
    console::yellow(&format!("(Fetched {} rows)", row_count));
    ExecuteResult::Success
}

fn execute_select_one(id: u32, table: &mut Table) -> ExecuteResult {
    let cursor = table.find(id);
    if table.cursor_hit(cursor, id) {
        let row = table.row_at(cursor);
        println!("{}", row.print());
        console::yellow("(Fetched 1 row)");
        info!(id, "select");
    } else {
        console::red(&format!("Error: Record with ID {} not found.", id));
        info!(id, "select found no match");
    }
    ExecuteResult::Success
}

fn execute_drop(id: u32, table: &mut Table) -> ExecuteResult {
    if !table.delete(id) {
        console::red(&format!("Error: Record with ID {} not found.", id));
        info!(id, "drop found no match");
    } else {
        info!(id, "drop");
    }
    ExecuteResult::Success
}

fn execute_update(payload: &crate::row::UpdatePayload, table: &mut Table) -> ExecuteResult {
    if table.update(payload) {
        info!(id = payload.id, "update");
        ExecuteResult::Success
    } else {
        console::red(&format!("Error: Record with ID {} not found.", payload.id));
        info!(id = payload.id, "update found no match");
        ExecuteResult::SilentError
    }
}

/// Parses one `id,username,email` CSV line, matching the reference's
/// `"%d,%32[^,],%255s"` rule: username stops at the first comma, email
/// stops at the first whitespace.
fn parse_csv_line(line: &str) -> Option<(i64, String, String)> {
    let mut parts = line.splitn(2, ',');
    let id_str = parts.next()?;
    let rest = parts.next()?;
    let id: i64 = id_str.trim().parse().ok()?;

    let mut rest_parts = rest.splitn(2, ',');
    let username = rest_parts.next()?;
    let email_field = rest_parts.next()?;
    let email = email_field.split_whitespace().next()?;

    if username.is_empty() || email.is_empty() {
        return None;
    }
    Some((id, username.to_string(), email.to_string()))
}

/// Opens `filename` for reading, routing the failure through the crate-wide
/// I/O error type rather than matching `io::Error` directly.
fn open_import_file(filename: &str) -> Result<File> {
    Ok(File::open(filename)?)
}

/// Creates `filename` for writing, routing the failure through the
/// crate-wide I/O error type rather than matching `io::Error` directly.
fn create_export_file(filename: &str) -> Result<File> {
    Ok(File::create(filename)?)
}

fn execute_import(filename: &str, table: &mut Table) -> ExecuteResult {
    let file = match open_import_file(filename) {
        Ok(f) => f,
        Err(e) => {
            console::red(&format!("Error opening file: {}", e));
            return ExecuteResult::SilentError;
        }
    };

    println!("Importing data from '{}'...", filename);

    let reader = BufReader::new(file);
    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for (line_num, line) in reader.lines().enumerate() {
        let line_num = line_num + 1;
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(line_num, error = %e, "failed to read line");
                fail_count += 1;
                continue;
            }
        };
        let line = line.trim_end_matches(['\r', '\n']);

        let (id, username, email) = match parse_csv_line(line) {
            Some(parsed) => parsed,
            None => {
                println!("Line malformed. Skipping...");
                fail_count += 1;
                continue;
            }
        };

        if id < 0 || username.len() > USERNAME_MAX_LENGTH || email.len() > EMAIL_MAX_LENGTH {
            eprintln!("Error on line {}: Invalid data.", line_num);
            fail_count += 1;
            continue;
        }

        let row = UserRow::new(id as u32, username, email);
        if table.insert(&row) {
            success_count += 1;
        } else {
            eprintln!(
                "Skipping line {}: Could not insert row with ID {} (likely a duplicate key).",
                line_num, id
            );
            fail_count += 1;
        }
    }

    info!(filename, success_count, fail_count, "import");
    console::green("Import complete.");
    console::yellow(&format!("Successfully inserted: {} rows.", success_count));
    console::yellow(&format!("Failed or skipped: {} rows.", fail_count));
    ExecuteResult::Success
}

fn execute_export(filename: &str, table: &mut Table) -> ExecuteResult {
    let mut file = match create_export_file(filename) {
        Ok(f) => f,
        Err(e) => {
            console::red(&format!("Error opening file for writing: {}", e));
            return ExecuteResult::Success;
        }
    };

    let mut cursor = table.start();
    let mut row_count = 0u32;
    while !cursor.end_of_table {
        let row = table.row_at(cursor);
        if let Err(e) = writeln!(file, "{},{},{}", row.id, row.username, row.email) {
            console::red(&format!("Error writing to file: {}", e));
            return ExecuteResult::SilentError;
        }
        table.advance(&mut cursor);
        row_count += 1;
    }

    info!(filename, row_count, "export");
    console::yellow(&format!("Exported {} rows to '{}'.", row_count, filename));
    ExecuteResult::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::prepare_statement;

    fn fresh_table() -> (tempfile::TempDir, Table) {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::open(dir.path().join("t.db"));
        (dir, table)
    }

    #[test]
    fn insert_then_select_round_trips() {
        let (_dir, mut table) = fresh_table();
        let stmt = prepare_statement("insert 1 alice a@x.com").unwrap();
        assert_eq!(execute_statement(&stmt, &mut table), ExecuteResult::Success);

        let select = prepare_statement("select 1").unwrap();
        assert_eq!(execute_statement(&select, &mut table), ExecuteResult::Success);
    }

    #[test]
    fn duplicate_insert_is_reported() {
        let (_dir, mut table) = fresh_table();
        let stmt = prepare_statement("insert 1 alice a@x.com").unwrap();
        execute_statement(&stmt, &mut table);
        assert_eq!(execute_statement(&stmt, &mut table), ExecuteResult::DuplicateKey);
    }

    #[test]
    fn export_then_import_round_trips() {
        let (dir, mut table) = fresh_table();
        for i in 1..=3 {
            let stmt = prepare_statement(&format!("insert {} u{} u{}@x.com", i, i, i)).unwrap();
            execute_statement(&stmt, &mut table);
        }
        let csv_path = dir.path().join("out.csv");
        let export_stmt = Statement::Export(csv_path.to_str().unwrap().to_string());
        assert_eq!(execute_statement(&export_stmt, &mut table), ExecuteResult::Success);

        let mut fresh = Table::open(dir.path().join("t2.db"));
        let import_stmt = Statement::Import(csv_path.to_str().unwrap().to_string());
        assert_eq!(execute_statement(&import_stmt, &mut fresh), ExecuteResult::Success);

        let cursor = fresh.find(2);
        assert!(fresh.cursor_hit(cursor, 2));
        assert_eq!(fresh.row_at(cursor).username, "u2");
    }

    #[test]
    fn parse_csv_line_handles_basic_row() {
        assert_eq!(
            parse_csv_line("1,alice,alice@x.com"),
            Some((1, "alice".to_string(), "alice@x.com".to_string()))
        );
        assert_eq!(parse_csv_line("not,a,valid,line"), None);
    }
}

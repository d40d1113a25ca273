//! Parses a single input line into a `Statement`, matching the fixed
//! six-statement grammar. Each `prepare_*` mirrors the corresponding
//! `sscanf`-based validation rule for that statement, including the exact
//! point at which trailing garbage or an out-of-range id is rejected.

use crate::row::{UpdateField, UpdatePayload, UserRow, EMAIL_MAX_LENGTH, FILENAME_MAX_LENGTH, USERNAME_MAX_LENGTH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareError {
    NegativeId,
    StringTooLong,
    SyntaxError,
    UnrecognizedStatement,
}

pub type PrepareResult = Result<Statement, PrepareError>;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Insert(UserRow),
    Select,
    SpecificSelect(u32),
    Drop(u32),
    Update(UpdatePayload),
    Import(String),
    Export(String),
}

pub fn prepare_statement(line: &str) -> PrepareResult {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.starts_with("insert") {
        return prepare_insert(line);
    }
    if line.starts_with("select") {
        return prepare_select(line);
    }
    if line.starts_with("drop") {
        return prepare_drop(line);
    }
    if line.starts_with("update") {
        return prepare_update(line);
    }
    if line.starts_with("import") {
        return prepare_import(line);
    }
    if line.starts_with("export") {
        return prepare_export(line);
    }
    Err(PrepareError::UnrecognizedStatement)
}

fn prepare_select(line: &str) -> PrepareResult {
    let rest = line["select".len()..].trim_start();
    if rest.is_empty() {
        return Ok(Statement::Select);
    }

    let mut tokens = rest.split_whitespace();
    match tokens.next() {
        Some(tok) => {
            if tokens.next().is_some() {
                // `select <id> <garbage>` or `select <garbage>` with extra tokens.
                return Err(PrepareError::SyntaxError);
            }
            match tok.parse::<i64>() {
                Ok(id) if id < 0 => Err(PrepareError::NegativeId),
                Ok(id) => Ok(Statement::SpecificSelect(id as u32)),
                Err(_) => Err(PrepareError::SyntaxError),
            }
        }
        None => Ok(Statement::Select),
    }
}

fn prepare_insert(line: &str) -> PrepareResult {
    let rest = line["insert".len()..].trim_start();
    let mut tokens = rest.split_whitespace();
    let id_str = tokens.next().unwrap_or("");
    let username = tokens.next().unwrap_or("");
    let email = tokens.next().unwrap_or("");
    // Trailing tokens beyond id/username/email are ignored, matching the
    // reference's `%n`-terminated sscanf which doesn't count toward
    // args_assigned.

    if id_str.is_empty() || username.is_empty() || email.is_empty() {
        return Err(PrepareError::SyntaxError);
    }
    let id: i64 = id_str.parse().map_err(|_| PrepareError::SyntaxError)?;
    if id < 0 {
        return Err(PrepareError::NegativeId);
    }
    if username.len() > USERNAME_MAX_LENGTH {
        return Err(PrepareError::StringTooLong);
    }
    if email.len() > EMAIL_MAX_LENGTH {
        return Err(PrepareError::StringTooLong);
    }

    Ok(Statement::Insert(UserRow::new(id as u32, username, email)))
}

fn prepare_drop(line: &str) -> PrepareResult {
    let rest = line["drop".len()..].trim_start();
    let id: i64 = rest
        .split_whitespace()
        .next()
        .ok_or(PrepareError::SyntaxError)?
        .parse()
        .map_err(|_| PrepareError::SyntaxError)?;
    if id < 0 {
        return Err(PrepareError::NegativeId);
    }
    Ok(Statement::Drop(id as u32))
}

fn extract_single_quoted_filename(rest: &str) -> Option<&str> {
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('\'')?;
    let end = rest.find('\'')?;
    Some(&rest[..end])
}

fn prepare_import(line: &str) -> PrepareResult {
    let rest = &line["import".len()..];
    let filename = extract_single_quoted_filename(rest).ok_or(PrepareError::SyntaxError)?;
    if filename.len() > FILENAME_MAX_LENGTH {
        return Err(PrepareError::StringTooLong);
    }
    Ok(Statement::Import(filename.to_string()))
}

fn prepare_export(line: &str) -> PrepareResult {
    let rest = &line["export".len()..];
    let filename = extract_single_quoted_filename(rest).ok_or(PrepareError::SyntaxError)?;
    if filename.len() > FILENAME_MAX_LENGTH {
        return Err(PrepareError::StringTooLong);
    }
    Ok(Statement::Export(filename.to_string()))
}

fn prepare_update(line: &str) -> PrepareResult {
    let rest = line["update".len()..].trim_start();
    let mut id_and_rest = rest.splitn(2, char::is_whitespace);
    let id_str = id_and_rest.next().unwrap_or("");
    let after_id = id_and_rest.next().unwrap_or("").trim_start();

    let after_set = after_id.strip_prefix("set").ok_or(PrepareError::SyntaxError)?;
    let after_set = after_set.trim_start();

    let eq_pos = after_set.find('=').ok_or(PrepareError::SyntaxError)?;
    let field = &after_set[..eq_pos];
    let value = after_set[eq_pos + 1..].trim_end();

    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(PrepareError::SyntaxError);
    }
    if value.is_empty() || value.contains(' ') || value.contains('\n') {
        return Err(PrepareError::SyntaxError);
    }

    let id: i64 = id_str.parse().map_err(|_| PrepareError::SyntaxError)?;
    if id < 0 {
        return Err(PrepareError::NegativeId);
    }

    let update_field = match field {
        "username" => UpdateField::Username,
        "email" => UpdateField::Email,
        _ => {
            eprintln!("Unrecognized field '{}' for update.", field);
            eprintln!("Only fields 'username' & 'email' can be updated");
            return Err(PrepareError::SyntaxError);
        }
    };

    let max_len = match update_field {
        UpdateField::Username => USERNAME_MAX_LENGTH,
        UpdateField::Email => EMAIL_MAX_LENGTH,
    };
    if value.len() > max_len {
        return Err(PrepareError::StringTooLong);
    }

    Ok(Statement::Update(UpdatePayload {
        id: id as u32,
        field: update_field,
        new_value: value.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_insert() {
        let stmt = prepare_statement("insert 1 alice alice@x.com").unwrap();
        assert_eq!(stmt, Statement::Insert(UserRow::new(1, "alice", "alice@x.com")));
    }

    #[test]
    fn rejects_negative_id() {
        assert_eq!(prepare_statement("insert -1 alice a@x").unwrap_err(), PrepareError::NegativeId);
        assert_eq!(prepare_statement("drop -1").unwrap_err(), PrepareError::NegativeId);
    }

    #[test]
    fn rejects_overlong_username() {
        let long = "a".repeat(USERNAME_MAX_LENGTH + 1);
        let line = format!("insert 1 {} x@x", long);
        assert_eq!(prepare_statement(&line).unwrap_err(), PrepareError::StringTooLong);
    }

    #[test]
    fn select_variants() {
        assert_eq!(prepare_statement("select").unwrap(), Statement::Select);
        assert_eq!(prepare_statement("select 5").unwrap(), Statement::SpecificSelect(5));
        assert_eq!(prepare_statement("select 5 junk").unwrap_err(), PrepareError::SyntaxError);
        assert_eq!(prepare_statement("select junk").unwrap_err(), PrepareError::SyntaxError);
    }

    #[test]
    fn import_export_require_single_quotes() {
        assert_eq!(
            prepare_statement("import 'data.csv'").unwrap(),
            Statement::Import("data.csv".to_string())
        );
        assert_eq!(prepare_statement("import data.csv").unwrap_err(), PrepareError::SyntaxError);
        assert_eq!(
            prepare_statement("export 'out.csv'").unwrap(),
            Statement::Export("out.csv".to_string())
        );
    }

    #[test]
    fn update_parses_field_and_value() {
        let stmt = prepare_statement("update 3 set email=new@x.com").unwrap();
        assert_eq!(
            stmt,
            Statement::Update(UpdatePayload {
                id: 3,
                field: UpdateField::Email,
                new_value: "new@x.com".to_string(),
            })
        );
    }

    #[test]
    fn update_rejects_unknown_field() {
        assert_eq!(
            prepare_statement("update 3 set age=30").unwrap_err(),
            PrepareError::SyntaxError
        );
    }

    #[test]
    fn unrecognized_statement_is_reported() {
        assert_eq!(prepare_statement("frobnicate").unwrap_err(), PrepareError::UnrecognizedStatement);
    }
}

//! Table creation for `Polls` and `PollOptions`.
//!
//! Tables are created with plain `CREATE TABLE` statements. A table that is
//! already present makes SQLite fail with "table ... already exists"; that
//! one failure is treated as success so startup can run on every boot.

use pollbox_types::{
    MAX_OPTION_LINK_LEN, MAX_OPTION_TITLE_LEN, MAX_POLL_MESSAGE_LEN, MAX_POLL_TITLE_LEN,
};
use rusqlite::Connection;

use crate::error::DbError;

/// Name of the polls table.
pub const POLLS_TABLE: &str = "Polls";

/// Name of the poll options table.
pub const POLL_OPTIONS_TABLE: &str = "PollOptions";

fn create_polls_sql() -> String {
    format!(
        "CREATE TABLE Polls (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title VARCHAR({MAX_POLL_TITLE_LEN}) NOT NULL CHECK (length(title) <= {MAX_POLL_TITLE_LEN}),
            message TEXT NOT NULL CHECK (length(message) <= {MAX_POLL_MESSAGE_LEN})
        )"
    )
}

fn create_poll_options_sql() -> String {
    format!(
        "CREATE TABLE PollOptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            optionTitle VARCHAR({MAX_OPTION_TITLE_LEN}) NOT NULL
                CHECK (length(optionTitle) <= {MAX_OPTION_TITLE_LEN}),
            optionLink VARCHAR({MAX_OPTION_LINK_LEN}) NOT NULL
                CHECK (length(optionLink) <= {MAX_OPTION_LINK_LEN}),
            pollID INTEGER NOT NULL REFERENCES Polls(id),
            votesCount INTEGER NOT NULL DEFAULT 0 CHECK (votesCount >= 0)
        )"
    )
}

/// Creates `Polls` and then `PollOptions` if they are missing.
///
/// `PollOptions` references `Polls`, so the order is fixed.
///
/// # Errors
///
/// Returns `DbError::Schema` if a table cannot be created for any reason
/// other than already existing.
pub fn ensure_schema(conn: &Connection) -> Result<(), DbError> {
    create_table(conn, POLLS_TABLE, &create_polls_sql())?;
    create_table(conn, POLL_OPTIONS_TABLE, &create_poll_options_sql())?;
    Ok(())
}

/// Returns `true` if `table` holds no rows.
///
/// # Errors
///
/// Returns `DbError::Storage` if the table cannot be queried (including when
/// it does not exist).
pub fn table_is_empty(conn: &Connection, table: &'static str) -> Result<bool, DbError> {
    let has_rows: bool = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table})"),
        [],
        |row| row.get(0),
    )?;
    Ok(!has_rows)
}

fn create_table(conn: &Connection, table: &'static str, sql: &str) -> Result<(), DbError> {
    match conn.execute_batch(sql) {
        Ok(()) => {
            tracing::info!(table, "created table");
            Ok(())
        }
        Err(e) if is_already_exists(&e) => {
            tracing::debug!(table, "table already exists, skipping");
            Ok(())
        }
        Err(source) => Err(DbError::Schema { table, source }),
    }
}

// SQLite reports the duplicate table either at prepare time (`SqlInputError`)
// or at step time (`SqliteFailure`), depending on the call path.
fn is_already_exists(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg))
        | rusqlite::Error::SqlInputError { error: e, msg, .. } => {
            e.code == rusqlite::ErrorCode::Unknown && msg.contains("already exists")
        }
        _ => false,
    }
}

//! Error taxonomy of the persistence core.

use std::path::PathBuf;

/// Errors raised by connection scopes, schema setup, seeding, and queries.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The pool could not hand out a connection (exhausted or unreachable).
    #[error("database connection unavailable: {0}")]
    ConnectionUnavailable(#[source] r2d2::Error),

    /// A connection was requested from a scope that has already ended.
    #[error("no active database connection in this scope")]
    NoActiveConnection,

    /// Creating a table failed for a reason other than it already existing.
    #[error("failed to create table '{table}': {source}")]
    Schema {
        /// Name of the table being created.
        table: &'static str,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// A seed file could not be opened or read.
    #[error("seed source '{}' unavailable: {source}", path.display())]
    SeedSourceUnavailable {
        /// Path of the seed file or directory.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A query or update failed at runtime.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

//! Per-unit-of-work connection binding.
//!
//! A [`ConnectionScope`] is created at the start of a request, handed by
//! reference to everything that needs the database, and ended when the
//! request finishes. The scope owns its pooled connection outright, so two
//! concurrent requests can never observe each other's connection.

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::error::DbError;
use crate::pool::DbPool;

/// One pooled connection bound to one unit of work.
///
/// The connection goes back to the pool on [`ConnectionScope::end`] or when
/// the scope is dropped, whichever happens first. Dropping covers early
/// returns and panics in the unit of work.
pub struct ConnectionScope {
    conn: Option<PooledConnection<SqliteConnectionManager>>,
}

impl ConnectionScope {
    /// Acquires a connection from `pool` and binds it to a new scope.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ConnectionUnavailable` if the pool cannot produce a
    /// connection within its connection timeout.
    pub fn begin(pool: &DbPool) -> Result<Self, DbError> {
        let conn = pool.get().map_err(|e| {
            tracing::warn!(error = %e, "failed to acquire database connection");
            DbError::ConnectionUnavailable(e)
        })?;
        Ok(Self { conn: Some(conn) })
    }

    /// Returns the connection bound to this scope.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NoActiveConnection` if the scope has been ended.
    pub fn current(&self) -> Result<&Connection, DbError> {
        self.conn.as_deref().ok_or(DbError::NoActiveConnection)
    }

    /// Whether the scope still holds its connection.
    pub fn is_active(&self) -> bool {
        self.conn.is_some()
    }

    /// Releases the connection back to the pool. Calling it again is a no-op.
    pub fn end(&mut self) {
        if self.conn.take().is_some() {
            tracing::trace!("released scoped database connection");
        }
    }

    /// Runs `work` inside a fresh scope and ends the scope afterwards,
    /// whether `work` succeeded or not.
    ///
    /// # Errors
    ///
    /// Propagates `DbError::ConnectionUnavailable` from [`Self::begin`] and
    /// whatever error `work` returns.
    pub fn run<T, E, F>(pool: &DbPool, work: F) -> Result<T, E>
    where
        E: From<DbError>,
        F: FnOnce(&ConnectionScope) -> Result<T, E>,
    {
        let mut scope = Self::begin(pool)?;
        let result = work(&scope);
        scope.end();
        result
    }
}

impl Drop for ConnectionScope {
    fn drop(&mut self) {
        self.end();
    }
}

impl std::fmt::Debug for ConnectionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionScope")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{create_pool, DbRuntimeSettings};

    fn small_pool(dir: &tempfile::TempDir, max_size: u32) -> DbPool {
        let path = dir.path().join("scope.db");
        create_pool(
            path.to_str().expect("utf-8 path"),
            DbRuntimeSettings {
                busy_timeout_ms: 1_000,
                pool_max_size: max_size,
                connection_timeout_ms: 200,
            },
        )
        .expect("pool creation should succeed")
    }

    #[test]
    fn current_fails_after_end() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let pool = small_pool(&dir, 1);

        let mut scope = ConnectionScope::begin(&pool).expect("should begin scope");
        let one: i64 = scope
            .current()
            .expect("scope should be active")
            .query_row("SELECT 1", [], |row| row.get(0))
            .expect("should query");
        assert_eq!(one, 1);

        scope.end();
        assert!(!scope.is_active());
        assert!(matches!(scope.current(), Err(DbError::NoActiveConnection)));

        // Second end is harmless.
        scope.end();
    }

    #[test]
    fn exhausted_pool_reports_connection_unavailable() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let pool = small_pool(&dir, 1);

        let mut held = ConnectionScope::begin(&pool).expect("should begin scope");
        let err = ConnectionScope::begin(&pool).expect_err("pool should be exhausted");
        assert!(matches!(err, DbError::ConnectionUnavailable(_)));

        held.end();
        ConnectionScope::begin(&pool).expect("released connection should be reusable");
    }

    #[test]
    fn dropping_scope_returns_connection() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let pool = small_pool(&dir, 1);

        {
            let _scope = ConnectionScope::begin(&pool).expect("should begin scope");
            assert_eq!(pool.state().idle_connections, 0);
        }
        assert_eq!(pool.state().idle_connections, 1);
    }

    #[test]
    fn run_ends_scope_on_error() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let pool = small_pool(&dir, 1);

        let result: Result<(), DbError> = ConnectionScope::run(&pool, |scope| {
            scope
                .current()?
                .execute_batch("SELECT * FROM no_such_table")?;
            Ok(())
        });
        assert!(matches!(result, Err(DbError::Storage(_))));

        // The failed unit of work must not keep the only connection.
        ConnectionScope::begin(&pool).expect("connection should have been released");
    }

    #[test]
    fn concurrent_scopes_hold_distinct_connections() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let pool = small_pool(&dir, 2);

        let first = ConnectionScope::begin(&pool).expect("should begin first scope");
        let second = ConnectionScope::begin(&pool).expect("should begin second scope");

        // Temp tables are private to a connection.
        first
            .current()
            .expect("first scope active")
            .execute_batch("CREATE TEMP TABLE scratch (x INTEGER)")
            .expect("should create temp table");

        let visible: bool = second
            .current()
            .expect("second scope active")
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_temp_master WHERE name = 'scratch')",
                [],
                |row| row.get(0),
            )
            .expect("should query temp schema");
        assert!(!visible, "second scope must not see the first scope's connection");
    }
}

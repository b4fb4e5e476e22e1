//! Persistence core for the pollbox backend.
//!
//! Provides SQLite connection pooling (via `r2d2`), per-request connection
//! scopes, idempotent schema creation, and one-time seed loading from a
//! seed directory.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: concurrent readers with a single writer.
//!   Vote increments are single `UPDATE` statements, so the busy timeout is
//!   the only coordination writers need.
//! - **Explicit connection scopes**: a [`ConnectionScope`] owns one pooled
//!   connection for one unit of work and returns it to the pool when ended
//!   or dropped. There is no ambient per-thread connection registry.
//! - **Startup initialization**: [`initialize_database`] creates missing
//!   tables and seeds empty ones. Any failure there is fatal to the caller.

mod error;
mod init;
mod pool;
mod schema;
mod scope;
pub mod seed;

pub use error::DbError;
pub use init::{initialize_database, InitReport};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
pub use schema::{ensure_schema, table_is_empty, POLLS_TABLE, POLL_OPTIONS_TABLE};
pub use scope::ConnectionScope;
pub use seed::{seed_poll_options, seed_polls, SeedSource, SeededOptions, SeededPolls};

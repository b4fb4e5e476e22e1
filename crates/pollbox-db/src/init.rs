//! Startup initialization: schema first, then seed data for empty tables.

use rusqlite::Connection;

use crate::error::DbError;
use crate::schema::{ensure_schema, table_is_empty, POLLS_TABLE, POLL_OPTIONS_TABLE};
use crate::seed::{seed_poll_options, seed_polls, SeedSource};

/// What [`initialize_database`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Number of polls inserted by this run.
    pub polls_seeded: usize,
    /// Poll seed entries whose insert failed.
    pub polls_skipped: usize,
    /// Number of options inserted by this run.
    pub options_seeded: usize,
    /// Option seed entries whose insert failed.
    pub options_skipped: usize,
}

/// Creates missing tables and seeds the empty ones.
///
/// Polls are seeded only when `Polls` is empty. Options are seeded only when
/// `PollOptions` is empty and this run produced poll IDs to attach them to;
/// an already populated `Polls` table therefore leaves `PollOptions` alone.
///
/// Everything runs in one transaction. A fatal error rolls back the tables
/// and any rows already seeded, so the next boot starts from scratch instead
/// of finding polls without options.
///
/// # Errors
///
/// Returns `DbError::Schema` or `DbError::SeedSourceUnavailable` on fatal
/// setup failures, and `DbError::Storage` if the tables cannot be inspected.
/// Callers should not serve traffic after an error.
pub fn initialize_database(conn: &Connection, seeds: &SeedSource) -> Result<InitReport, DbError> {
    let tx = conn.unchecked_transaction()?;
    ensure_schema(&tx)?;

    let mut report = InitReport::default();

    let mut poll_ids = Vec::new();
    if table_is_empty(&tx, POLLS_TABLE)? {
        let seeded = seed_polls(&tx, seeds)?;
        report.polls_seeded = seeded.ids.len();
        report.polls_skipped = seeded.skipped;
        poll_ids = seeded.ids;
    } else {
        tracing::debug!(table = POLLS_TABLE, "table already populated, not seeding");
    }

    if poll_ids.is_empty() {
        tracing::debug!(
            table = POLL_OPTIONS_TABLE,
            "no polls seeded in this run, not seeding options"
        );
    } else if table_is_empty(&tx, POLL_OPTIONS_TABLE)? {
        let seeded = seed_poll_options(&tx, seeds, &poll_ids)?;
        report.options_seeded = seeded.inserted;
        report.options_skipped = seeded.skipped;
    }

    tx.commit()?;

    tracing::info!(
        seed_dir = %seeds.root().display(),
        polls_seeded = report.polls_seeded,
        options_seeded = report.options_seeded,
        "database initialized"
    );

    Ok(report)
}

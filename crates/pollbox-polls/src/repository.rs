use pollbox_db::{ConnectionScope, DbError};
use pollbox_types::{Poll, PollOption};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Read and vote operations over polls and their options.
///
/// All methods fail with `DbError::Storage` when the underlying query fails
/// and with `DbError::NoActiveConnection` when used outside a live scope.
pub trait PollRepository {
    /// All polls, ordered by ID.
    fn list_polls(&self) -> Result<Vec<Poll>, DbError>;

    /// The poll with `poll_id`, or `None` if there is no such poll.
    fn get_poll(&self, poll_id: i64) -> Result<Option<Poll>, DbError>;

    /// The options of `poll_id`, ordered by ID. Empty when there are none.
    fn list_options(&self, poll_id: i64) -> Result<Vec<PollOption>, DbError>;

    /// Adds one vote to `option_id` if it belongs to `poll_id`.
    ///
    /// Returns `false` when no option matches both IDs.
    fn increment_vote(&self, option_id: i64, poll_id: i64) -> Result<bool, DbError>;
}

/// [`PollRepository`] backed by the connection of a [`ConnectionScope`].
#[derive(Debug, Clone, Copy)]
pub struct SqlPollRepository<'s> {
    scope: &'s ConnectionScope,
}

impl<'s> SqlPollRepository<'s> {
    /// Creates a repository reading through `scope`.
    pub fn new(scope: &'s ConnectionScope) -> Self {
        Self { scope }
    }
}

impl PollRepository for SqlPollRepository<'_> {
    fn list_polls(&self) -> Result<Vec<Poll>, DbError> {
        list_polls(self.scope.current()?)
    }

    fn get_poll(&self, poll_id: i64) -> Result<Option<Poll>, DbError> {
        get_poll(self.scope.current()?, poll_id)
    }

    fn list_options(&self, poll_id: i64) -> Result<Vec<PollOption>, DbError> {
        list_options(self.scope.current()?, poll_id)
    }

    fn increment_vote(&self, option_id: i64, poll_id: i64) -> Result<bool, DbError> {
        increment_vote(self.scope.current()?, option_id, poll_id)
    }
}

fn poll_from_row(row: &Row) -> rusqlite::Result<Poll> {
    Ok(Poll {
        id: row.get(0)?,
        title: row.get(1)?,
        message: row.get(2)?,
    })
}

fn option_from_row(row: &Row) -> rusqlite::Result<PollOption> {
    Ok(PollOption {
        id: row.get(0)?,
        option_title: row.get(1)?,
        option_link: row.get(2)?,
        poll_id: row.get(3)?,
        votes_count: row.get(4)?,
    })
}

/// Lists every poll.
pub fn list_polls(conn: &Connection) -> Result<Vec<Poll>, DbError> {
    let mut stmt = conn.prepare("SELECT id, title, message FROM Polls ORDER BY id")?;
    let polls = stmt
        .query_map([], poll_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(polls)
}

/// Fetches one poll by primary key.
pub fn get_poll(conn: &Connection, poll_id: i64) -> Result<Option<Poll>, DbError> {
    let poll = conn
        .query_row(
            "SELECT id, title, message FROM Polls WHERE id = ?1",
            params![poll_id],
            poll_from_row,
        )
        .optional()?;
    Ok(poll)
}

/// Lists the options that belong to `poll_id`.
pub fn list_options(conn: &Connection, poll_id: i64) -> Result<Vec<PollOption>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, optionTitle, optionLink, pollID, votesCount
         FROM PollOptions WHERE pollID = ?1 ORDER BY id",
    )?;
    let options = stmt
        .query_map(params![poll_id], option_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(options)
}

/// Adds one vote to the option matching both `option_id` and `poll_id`.
///
/// The increment happens inside a single `UPDATE`, so concurrent voters on
/// the same option cannot lose each other's votes. Requiring the poll ID as
/// well rejects a vote that names an existing option under the wrong poll.
pub fn increment_vote(conn: &Connection, option_id: i64, poll_id: i64) -> Result<bool, DbError> {
    let updated = conn.execute(
        "UPDATE PollOptions SET votesCount = votesCount + 1 WHERE id = ?1 AND pollID = ?2",
        params![option_id, poll_id],
    )?;

    if updated != 1 {
        tracing::debug!(option_id, poll_id, "vote matched no option");
    }
    Ok(updated == 1)
}

//! Poll queries, vote recording, and result aggregation.
//!
//! [`PollRepository`] is the query surface request handlers use. Its SQL
//! implementation reads through a [`pollbox_db::ConnectionScope`], so a
//! handler opens one scope per request and never passes raw connections
//! around. Every call hits the database; nothing is cached.
//!
//! The [`results`] module is pure: it orders options by tally and picks the
//! winner set without touching storage.

mod repository;
pub mod results;

pub use repository::{
    get_poll, increment_vote, list_options, list_polls, PollRepository, SqlPollRepository,
};
pub use results::{sort_descending, tally, winners, PollResults};

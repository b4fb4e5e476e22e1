//! Shared domain types for the pollbox backend.
//!
//! Both types are value snapshots: a repository read produces fresh
//! instances every time and nothing hands out shared mutable references.
//! Equality and hashing consider the storage-generated `id` only, so two
//! reads of the same row compare equal even if the vote tally moved in
//! between.
//!
//! The `MAX_*_LEN` constants are the column limits the database schema
//! enforces with `CHECK` constraints.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Maximum length of [`Poll::title`].
pub const MAX_POLL_TITLE_LEN: usize = 150;

/// Maximum length of [`Poll::message`].
pub const MAX_POLL_MESSAGE_LEN: usize = 2048;

/// Maximum length of [`PollOption::option_title`].
pub const MAX_OPTION_TITLE_LEN: usize = 100;

/// Maximum length of [`PollOption::option_link`].
pub const MAX_OPTION_LINK_LEN: usize = 150;

/// A question with a title and a display message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    /// Storage-generated identifier.
    pub id: i64,
    /// Short title shown in poll listings.
    pub title: String,
    /// Longer message shown above the options.
    pub message: String,
}

impl PartialEq for Poll {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Poll {}

impl Hash for Poll {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// One selectable answer of a poll, carrying its vote tally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    /// Storage-generated identifier.
    pub id: i64,
    /// Display title of the option.
    pub option_title: String,
    /// Link associated with the option (any format).
    pub option_link: String,
    /// ID of the owning poll.
    pub poll_id: i64,
    /// Number of accepted votes. Never decreases.
    pub votes_count: i64,
}

impl PartialEq for PollOption {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PollOption {}

impl Hash for PollOption {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

//! In-memory result aggregation. No I/O.

use pollbox_types::{Poll, PollOption};
use serde::Serialize;

/// A poll together with its options ordered by tally and its winners.
#[derive(Debug, Clone, Serialize)]
pub struct PollResults {
    /// The poll itself.
    pub poll: Poll,
    /// Options, most votes first.
    pub options: Vec<PollOption>,
    /// Options sharing the highest tally.
    pub winners: Vec<PollOption>,
    /// Sum of all tallies.
    pub total_votes: i64,
}

/// Sorts options by vote count, highest first.
///
/// The sort is stable: options with equal counts keep their input order.
pub fn sort_descending(mut options: Vec<PollOption>) -> Vec<PollOption> {
    options.sort_by(|a, b| b.votes_count.cmp(&a.votes_count));
    options
}

/// Returns every option whose vote count equals the highest count present.
///
/// Empty input has a maximum of zero and produces no winners.
pub fn winners(options: &[PollOption]) -> Vec<PollOption> {
    let max = options.iter().map(|o| o.votes_count).max().unwrap_or(0);
    options
        .iter()
        .filter(|o| o.votes_count == max)
        .cloned()
        .collect()
}

/// Builds the result view of `poll` from its options.
pub fn tally(poll: Poll, options: Vec<PollOption>) -> PollResults {
    let options = sort_descending(options);
    let winners = winners(&options);
    let total_votes = options.iter().map(|o| o.votes_count).sum();
    PollResults {
        poll,
        options,
        winners,
        total_votes,
    }
}

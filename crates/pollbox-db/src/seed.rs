//! One-time seed loading from a seed directory.
//!
//! Layout of a seed directory:
//!
//! ```text
//! <root>/polls.seed                  title=message, one poll per line
//! <root>/poll_options_seeds/1.seed   title<TAB>link, options of the 1st seeded poll
//! <root>/poll_options_seeds/2.seed   options of the 2nd seeded poll
//! ...
//! ```
//!
//! Entries are deduplicated by exact equality, keeping first-seen order.
//! Trailing empty fields are dropped before counting, so `title<TAB>link<TAB>`
//! is still a two-field line; any line left with a field count other than
//! two is ignored. Fields are trimmed after splitting.
//! A seed file that cannot be read aborts seeding; a row that fails to
//! insert is skipped and counted.

use rand::Rng;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::DbError;

const POLLS_FILE: &str = "polls.seed";
const POLL_OPTIONS_DIR: &str = "poll_options_seeds";
const SEED_FILE_EXTENSION: &str = "seed";
const POLLS_DELIMITER: char = '=';
const POLL_OPTIONS_DELIMITER: char = '\t';

/// Seeded vote counts are drawn uniformly from `0..VOTES_BOUND`.
pub const VOTES_BOUND: i64 = 150;

/// Location of the seed files.
#[derive(Debug, Clone)]
pub struct SeedSource {
    root: PathBuf,
}

impl SeedSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The seed directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the poll seed file.
    pub fn polls_path(&self) -> PathBuf {
        self.root.join(POLLS_FILE)
    }

    /// Directory holding one option seed file per poll.
    pub fn options_dir(&self) -> PathBuf {
        self.root.join(POLL_OPTIONS_DIR)
    }

    /// Path of the option seed file for the `index`-th seeded poll (1-based).
    pub fn options_path(&self, index: usize) -> PathBuf {
        self.options_dir()
            .join(format!("{index}.{SEED_FILE_EXTENSION}"))
    }

    /// Number of files in the option seed directory.
    ///
    /// # Errors
    ///
    /// Returns `DbError::SeedSourceUnavailable` if the directory cannot be
    /// listed.
    pub fn option_file_count(&self) -> Result<usize, DbError> {
        let dir = self.options_dir();
        let unavailable = |source| DbError::SeedSourceUnavailable {
            path: dir.clone(),
            source,
        };

        let mut count = 0;
        for entry in std::fs::read_dir(&dir).map_err(unavailable)? {
            let entry = entry.map_err(unavailable)?;
            if entry.file_type().map_err(unavailable)?.is_file() {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// A parsed `first<delimiter>second` seed line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeedEntry {
    /// Text before the delimiter, trimmed.
    pub first: String,
    /// Text after the delimiter, trimmed.
    pub second: String,
}

/// Outcome of [`seed_polls`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeededPolls {
    /// Generated poll IDs in insertion order.
    pub ids: Vec<i64>,
    /// Entries whose insert failed.
    pub skipped: usize,
}

/// Outcome of [`seed_poll_options`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeededOptions {
    /// Rows inserted.
    pub inserted: usize,
    /// Entries whose insert failed.
    pub skipped: usize,
}

/// Parses seed text into unique entries, preserving first-seen order.
pub fn parse_entries(text: &str, delimiter: char) -> Vec<SeedEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for line in text.lines() {
        let mut fields: Vec<&str> = line.split(delimiter).collect();
        while fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }
        let [first, second] = fields.as_slice() else {
            continue;
        };

        let entry = SeedEntry {
            first: first.trim().to_string(),
            second: second.trim().to_string(),
        };
        if seen.insert(entry.clone()) {
            entries.push(entry);
        }
    }

    entries
}

fn read_entries(path: &Path, delimiter: char) -> Result<Vec<SeedEntry>, DbError> {
    let text = std::fs::read_to_string(path).map_err(|source| DbError::SeedSourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_entries(&text, delimiter))
}

/// Inserts every poll from `polls.seed` and returns the generated IDs.
///
/// # Errors
///
/// Returns `DbError::SeedSourceUnavailable` if `polls.seed` cannot be read.
/// Individual insert failures are counted in [`SeededPolls::skipped`].
pub fn seed_polls(conn: &Connection, source: &SeedSource) -> Result<SeededPolls, DbError> {
    let entries = read_entries(&source.polls_path(), POLLS_DELIMITER)?;
    let mut seeded = SeededPolls::default();

    for entry in &entries {
        let inserted = conn.query_row(
            "INSERT INTO Polls (title, message) VALUES (?1, ?2) RETURNING id",
            params![entry.first, entry.second],
            |row| row.get::<_, i64>(0),
        );
        match inserted {
            Ok(id) => seeded.ids.push(id),
            Err(e) => {
                tracing::warn!(title = %entry.first, error = %e, "skipping poll seed entry");
                seeded.skipped += 1;
            }
        }
    }

    tracing::info!(
        inserted = seeded.ids.len(),
        skipped = seeded.skipped,
        "seeded polls"
    );
    Ok(seeded)
}

/// Inserts the options of each seeded poll with random starting vote counts.
///
/// File `i` of the option seed directory belongs to `poll_ids[i - 1]`.
/// Files without a matching poll ID, and poll IDs without a matching file,
/// are ignored.
///
/// # Errors
///
/// Returns `DbError::SeedSourceUnavailable` if the option directory or one
/// of the processed files cannot be read.
pub fn seed_poll_options(
    conn: &Connection,
    source: &SeedSource,
    poll_ids: &[i64],
) -> Result<SeededOptions, DbError> {
    seed_poll_options_with_rng(conn, source, poll_ids, &mut rand::thread_rng())
}

/// [`seed_poll_options`] with a caller-supplied random source.
///
/// # Errors
///
/// Same as [`seed_poll_options`].
pub fn seed_poll_options_with_rng<R: Rng>(
    conn: &Connection,
    source: &SeedSource,
    poll_ids: &[i64],
    rng: &mut R,
) -> Result<SeededOptions, DbError> {
    let files = source.option_file_count()?.min(poll_ids.len());
    let mut seeded = SeededOptions::default();

    for (index, poll_id) in (1..=files).zip(poll_ids) {
        let entries = read_entries(&source.options_path(index), POLL_OPTIONS_DELIMITER)?;

        for entry in &entries {
            let votes: i64 = rng.gen_range(0..VOTES_BOUND);
            let result = conn.execute(
                "INSERT INTO PollOptions (optionTitle, optionLink, pollID, votesCount)
                 VALUES (?1, ?2, ?3, ?4)",
                params![entry.first, entry.second, poll_id, votes],
            );
            match result {
                Ok(n) if n > 0 => seeded.inserted += 1,
                Ok(_) => seeded.skipped += 1,
                Err(e) => {
                    tracing::warn!(
                        poll_id,
                        title = %entry.first,
                        error = %e,
                        "skipping poll option seed entry"
                    );
                    seeded.skipped += 1;
                }
            }
        }
    }

    tracing::info!(
        files,
        inserted = seeded.inserted,
        skipped = seeded.skipped,
        "seeded poll options"
    );
    Ok(seeded)
}

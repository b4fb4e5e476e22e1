use pollbox_db::{create_pool, ensure_schema, ConnectionScope, DbError, DbPool, DbRuntimeSettings};
use pollbox_polls::{PollRepository, SqlPollRepository};
use rusqlite::params;
use std::sync::Arc;
use std::thread;

struct Fixture {
    pool: DbPool,
    _dir: tempfile::TempDir,
    bands: i64,
    colors: i64,
    empty: i64,
    beatles: i64,
    queen: i64,
    red: i64,
}

fn setup() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("polls.db");
    let pool = create_pool(
        path.to_str().unwrap(),
        DbRuntimeSettings {
            busy_timeout_ms: 10_000,
            pool_max_size: 8,
            connection_timeout_ms: 30_000,
        },
    )
    .unwrap();

    let conn = pool.get().unwrap();
    ensure_schema(&conn).unwrap();

    let insert_poll = |title: &str| -> i64 {
        conn.query_row(
            "INSERT INTO Polls (title, message) VALUES (?1, 'pick one') RETURNING id",
            params![title],
            |row| row.get(0),
        )
        .unwrap()
    };
    let bands = insert_poll("Bands");
    let colors = insert_poll("Colors");
    let empty = insert_poll("Nobody answered");

    let insert_option = |poll_id: i64, title: &str, votes: i64| -> i64 {
        conn.query_row(
            "INSERT INTO PollOptions (optionTitle, optionLink, pollID, votesCount)
             VALUES (?1, 'https://example.com', ?2, ?3) RETURNING id",
            params![title, poll_id, votes],
            |row| row.get(0),
        )
        .unwrap()
    };
    let beatles = insert_option(bands, "The Beatles", 10);
    let queen = insert_option(bands, "Queen", 4);
    let red = insert_option(colors, "Red", 0);
    drop(conn);

    Fixture {
        pool,
        _dir: dir,
        bands,
        colors,
        empty,
        beatles,
        queen,
        red,
    }
}

fn votes_by_option(pool: &DbPool) -> Vec<(i64, i64)> {
    let conn = pool.get().unwrap();
    let mut stmt = conn
        .prepare("SELECT id, votesCount FROM PollOptions ORDER BY id")
        .unwrap();
    stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn list_polls_returns_all_rows() {
    let fx = setup();
    let scope = ConnectionScope::begin(&fx.pool).unwrap();
    let repo = SqlPollRepository::new(&scope);

    let titles: Vec<String> = repo
        .list_polls()
        .unwrap()
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert_eq!(titles, vec!["Bands", "Colors", "Nobody answered"]);
}

#[test]
fn get_poll_missing_is_none() {
    let fx = setup();
    let scope = ConnectionScope::begin(&fx.pool).unwrap();
    let repo = SqlPollRepository::new(&scope);

    let poll = repo.get_poll(fx.colors).unwrap().expect("poll should exist");
    assert_eq!(poll.title, "Colors");
    assert!(repo.get_poll(9_999).unwrap().is_none());
}

#[test]
fn list_options_filters_by_poll() {
    let fx = setup();
    let scope = ConnectionScope::begin(&fx.pool).unwrap();
    let repo = SqlPollRepository::new(&scope);

    let options = repo.list_options(fx.bands).unwrap();
    let ids: Vec<i64> = options.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![fx.beatles, fx.queen]);
    assert!(options.iter().all(|o| o.poll_id == fx.bands));

    assert!(repo.list_options(fx.empty).unwrap().is_empty());
    assert!(repo.list_options(9_999).unwrap().is_empty());
}

#[test]
fn vote_increments_exactly_once() {
    let fx = setup();
    let scope = ConnectionScope::begin(&fx.pool).unwrap();
    let repo = SqlPollRepository::new(&scope);

    assert!(repo.increment_vote(fx.queen, fx.bands).unwrap());

    let options = repo.list_options(fx.bands).unwrap();
    let queen = options.iter().find(|o| o.id == fx.queen).unwrap();
    assert_eq!(queen.votes_count, 5);
    let beatles = options.iter().find(|o| o.id == fx.beatles).unwrap();
    assert_eq!(beatles.votes_count, 10);
}

#[test]
fn vote_for_unknown_or_mismatched_option_changes_nothing() {
    let fx = setup();
    let before = votes_by_option(&fx.pool);

    let scope = ConnectionScope::begin(&fx.pool).unwrap();
    let repo = SqlPollRepository::new(&scope);

    // Option does not exist.
    assert!(!repo.increment_vote(9_999, fx.bands).unwrap());
    // Option exists but belongs to another poll.
    assert!(!repo.increment_vote(fx.red, fx.bands).unwrap());
    assert!(!repo.increment_vote(fx.beatles, fx.colors).unwrap());
    // Poll does not exist.
    assert!(!repo.increment_vote(fx.beatles, 9_999).unwrap());
    drop(scope);

    assert_eq!(votes_by_option(&fx.pool), before);
}

#[test]
fn concurrent_votes_are_not_lost() {
    let fx = Arc::new(setup());

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let fx = Arc::clone(&fx);
            thread::spawn(move || {
                let scope = ConnectionScope::begin(&fx.pool).unwrap();
                SqlPollRepository::new(&scope)
                    .increment_vote(fx.red, fx.colors)
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap(), "every vote should be accepted");
    }

    let scope = ConnectionScope::begin(&fx.pool).unwrap();
    let red = SqlPollRepository::new(&scope)
        .list_options(fx.colors)
        .unwrap()
        .into_iter()
        .find(|o| o.id == fx.red)
        .unwrap();
    assert_eq!(red.votes_count, 100);
}

#[test]
fn reads_are_fresh_snapshots() {
    let fx = setup();
    let scope = ConnectionScope::begin(&fx.pool).unwrap();
    let repo = SqlPollRepository::new(&scope);

    let before = repo.list_options(fx.bands).unwrap();
    {
        let other = ConnectionScope::begin(&fx.pool).unwrap();
        assert!(SqlPollRepository::new(&other)
            .increment_vote(fx.beatles, fx.bands)
            .unwrap());
    }
    let after = repo.list_options(fx.bands).unwrap();

    let count = |options: &[pollbox_types::PollOption]| {
        options
            .iter()
            .find(|o| o.id == fx.beatles)
            .unwrap()
            .votes_count
    };
    assert_eq!(count(&before), 10);
    assert_eq!(count(&after), 11);
}

#[test]
fn ended_scope_rejects_queries() {
    let fx = setup();
    let mut scope = ConnectionScope::begin(&fx.pool).unwrap();
    scope.end();

    let repo = SqlPollRepository::new(&scope);
    assert!(matches!(repo.list_polls(), Err(DbError::NoActiveConnection)));
    assert!(matches!(
        repo.increment_vote(fx.beatles, fx.bands),
        Err(DbError::NoActiveConnection)
    ));
}

#[test]
fn missing_tables_surface_as_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bare.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
    let scope = ConnectionScope::begin(&pool).unwrap();

    let err = SqlPollRepository::new(&scope).list_polls().unwrap_err();
    assert!(matches!(err, DbError::Storage(_)));
}

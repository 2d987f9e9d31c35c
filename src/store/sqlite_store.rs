use std::{
    collections::BTreeMap,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::{Connection, params};
use tracing::debug;

use super::schema::{ALL_STATEMENTS, TIMESTAMP_FORMAT};
use crate::{
    error::StorageError,
    types::{Artist, ArtistSnapshot, GenreCount, RankingEntry},
};

/// SQLite-backed store for users, artists, genre tags and rankings.
///
/// A single connection is shared behind a mutex; every caller (HTTP handlers
/// and the collector) goes through it, so SQLite only ever sees one writer.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    utc_offset: FixedOffset,
}

impl SqliteStore {
    /// Opens (or creates) the database at `db_path` and ensures the schema
    /// exists. Snapshot timestamps are recorded in the civil zone given by
    /// `utc_offset`.
    pub fn new<P: AsRef<Path>>(db_path: P, utc_offset: FixedOffset) -> Result<Self, StorageError> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        debug!("Opening SQLite database at {:?}", path);
        let conn = Connection::open(path)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        for statement in ALL_STATEMENTS {
            conn.execute(statement, [])?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
            utc_offset,
        })
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    fn format_timestamp(&self, at: DateTime<FixedOffset>) -> String {
        at.with_timezone(&self.utc_offset)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }

    /// Registers a user. Does nothing if the id is already known.
    pub fn insert_user(&self, user_id: &str, username: Option<&str>) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO users (id, username) VALUES (?1, ?2)",
            params![user_id, username],
        )?;
        Ok(())
    }

    /// Records one top-artists fetch for `user_id`, stamped with the current
    /// time.
    pub fn insert_snapshot(
        &self,
        user_id: &str,
        artists: &[ArtistSnapshot],
    ) -> Result<(), StorageError> {
        let now = Utc::now().with_timezone(&self.utc_offset);
        self.insert_snapshot_at(user_id, artists, now)
    }

    /// Records one top-artists fetch in a single transaction. The rank of each
    /// artist is its 1-based position in `artists`, and every ranking row
    /// shares `recorded_at`. Nothing is written unless every row succeeds.
    pub fn insert_snapshot_at(
        &self,
        user_id: &str,
        artists: &[ArtistSnapshot],
        recorded_at: DateTime<FixedOffset>,
    ) -> Result<(), StorageError> {
        let timestamp = self.format_timestamp(recorded_at);

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut upsert_artist = tx.prepare_cached(
                "INSERT INTO artists (id, name, popularity, followers) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    popularity = excluded.popularity,
                    followers = excluded.followers",
            )?;
            let mut insert_genre =
                tx.prepare_cached("INSERT OR IGNORE INTO genres (artist_id, genre) VALUES (?1, ?2)")?;
            let mut upsert_ranking = tx.prepare_cached(
                "INSERT OR REPLACE INTO user_artists (user_id, artist_id, rank, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;

            for (index, entry) in artists.iter().enumerate() {
                let artist = &entry.artist;
                upsert_artist.execute(params![
                    artist.id,
                    artist.name,
                    artist.popularity,
                    artist.followers
                ])?;
                for genre in &entry.genres {
                    insert_genre.execute(params![artist.id, genre])?;
                }
                upsert_ranking.execute(params![user_id, artist.id, (index + 1) as i64, timestamp])?;
            }
        }
        tx.commit()?;

        debug!(
            "Stored snapshot of {} artists for user {} at {}",
            artists.len(),
            user_id,
            timestamp
        );
        Ok(())
    }

    /// Number of recorded artists per genre, over everything stored.
    pub fn fetch_genre_counts(&self) -> Result<BTreeMap<String, u64>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT genre, COUNT(genre) AS count FROM genres GROUP BY genre")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut genres = BTreeMap::new();
        for row in rows {
            let (genre, count) = row?;
            genres.insert(genre, count as u64);
        }
        Ok(genres)
    }

    pub fn fetch_all_artists(&self) -> Result<Vec<Artist>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, name, popularity, followers FROM artists")?;
        let artists = stmt
            .query_map([], |row| {
                Ok(Artist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    popularity: row.get(2)?,
                    followers: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    /// Genres of the artists ranked at or after `since`, counted once per
    /// artist, most frequent first.
    pub fn fetch_genre_summary(
        &self,
        since: DateTime<FixedOffset>,
    ) -> Result<Vec<GenreCount>, StorageError> {
        let since = self.format_timestamp(since);

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT g.genre, COUNT(DISTINCT g.artist_id) AS count
             FROM genres g
             JOIN user_artists ua ON ua.artist_id = g.artist_id
             WHERE ua.timestamp >= ?1
             GROUP BY g.genre
             ORDER BY count DESC, g.genre ASC",
        )?;
        let genres = stmt
            .query_map(params![since], |row| {
                Ok(GenreCount {
                    name: row.get(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(genres)
    }

    /// Latest ranking entries of every user, ordered by user then rank.
    pub fn fetch_rankings(&self) -> Result<Vec<RankingEntry>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT ua.user_id, ua.rank, ua.artist_id, a.name, ua.timestamp
             FROM user_artists ua
             JOIN artists a ON a.id = ua.artist_id
             ORDER BY ua.user_id, ua.rank",
        )?;
        let rankings = stmt
            .query_map([], |row| {
                Ok(RankingEntry {
                    user_id: row.get(0)?,
                    rank: row.get(1)?,
                    artist_id: row.get(2)?,
                    artist_name: row.get(3)?,
                    timestamp: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rankings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    struct TestStore {
        store: SqliteStore,
        _temp_dir: TempDir, // Keep temp dir alive
    }

    fn istanbul() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn create_test_store() -> TestStore {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("spotify_data.db");
        let store = SqliteStore::new(&db_path, istanbul()).unwrap();
        store.insert_user("user-1", Some("Listener")).unwrap();
        TestStore {
            store,
            _temp_dir: temp_dir,
        }
    }

    fn snapshot(id: &str, popularity: i64, genres: &[&str]) -> ArtistSnapshot {
        ArtistSnapshot {
            artist: Artist {
                id: id.to_string(),
                name: format!("Artist {}", id),
                popularity,
                followers: popularity * 1000,
            },
            genres: genres.iter().map(|g| g.to_string()).collect(),
        }
    }

    fn count_rows(store: &SqliteStore, table: &str) -> i64 {
        let conn = store.lock().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn test_insert_user_is_idempotent() {
        let test = create_test_store();
        let store = &test.store;

        store.insert_user("user-1", Some("Renamed")).unwrap();
        store.insert_user("user-2", None).unwrap();

        assert_eq!(count_rows(store, "users"), 2);
        let conn = store.lock().unwrap();
        let name: String = conn
            .query_row("SELECT username FROM users WHERE id = 'user-1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(name, "Listener");
    }

    #[test]
    fn test_genre_counts_after_one_snapshot() {
        let test = create_test_store();
        let store = &test.store;

        store
            .insert_snapshot(
                "user-1",
                &[snapshot("a1", 50, &["rock", "pop"]), snapshot("a2", 40, &["pop"])],
            )
            .unwrap();

        let counts = store.fetch_genre_counts().unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["rock"], 1);
        assert_eq!(counts["pop"], 2);
    }

    #[test]
    fn test_artist_upsert_updates_fields_without_duplicates() {
        let test = create_test_store();
        let store = &test.store;

        store.insert_snapshot("user-1", &[snapshot("a1", 50, &["rock"])]).unwrap();
        store.insert_snapshot("user-1", &[snapshot("a1", 75, &["rock"])]).unwrap();

        let artists = store.fetch_all_artists().unwrap();
        assert_eq!(artists.len(), 1);
        assert_eq!(artists[0].popularity, 75);
        assert_eq!(artists[0].followers, 75_000);
    }

    #[test]
    fn test_repeated_genre_pair_is_not_counted_twice() {
        let test = create_test_store();
        let store = &test.store;

        store.insert_snapshot("user-1", &[snapshot("a1", 50, &["rock", "rock"])]).unwrap();
        store.insert_snapshot("user-1", &[snapshot("a1", 50, &["rock"])]).unwrap();

        assert_eq!(store.fetch_genre_counts().unwrap()["rock"], 1);
        assert_eq!(count_rows(store, "genres"), 1);
    }

    #[test]
    fn test_second_snapshot_overwrites_rank_and_timestamp() {
        let test = create_test_store();
        let store = &test.store;
        let first = istanbul().with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let second = istanbul().with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap();

        store
            .insert_snapshot_at("user-1", &[snapshot("a1", 50, &[]), snapshot("a2", 40, &[])], first)
            .unwrap();
        store
            .insert_snapshot_at("user-1", &[snapshot("a2", 40, &[]), snapshot("a1", 50, &[])], second)
            .unwrap();

        let rankings = store.fetch_rankings().unwrap();
        assert_eq!(rankings.len(), 2);
        assert_eq!(rankings[0].artist_id, "a2");
        assert_eq!(rankings[0].rank, 1);
        assert_eq!(rankings[1].artist_id, "a1");
        assert_eq!(rankings[1].rank, 2);
        assert!(rankings.iter().all(|r| r.timestamp == "2024-03-01 11:00:00"));
    }

    #[test]
    fn test_snapshot_timestamp_uses_store_offset() {
        let test = create_test_store();
        let store = &test.store;
        let utc_noon = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        store
            .insert_snapshot_at("user-1", &[snapshot("a1", 50, &[])], utc_noon.fixed_offset())
            .unwrap();

        let rankings = store.fetch_rankings().unwrap();
        assert_eq!(rankings[0].timestamp, "2024-03-01 15:00:00");
    }

    #[test]
    fn test_failed_snapshot_writes_nothing() {
        let test = create_test_store();
        let store = &test.store;
        {
            let conn = store.lock().unwrap();
            conn.execute_batch(
                "CREATE TRIGGER fail_on_a3 BEFORE INSERT ON user_artists
                 WHEN NEW.artist_id = 'a3'
                 BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
            )
            .unwrap();
        }

        let result = store.insert_snapshot(
            "user-1",
            &[
                snapshot("a1", 50, &["rock"]),
                snapshot("a2", 40, &["pop"]),
                snapshot("a3", 30, &["jazz"]),
            ],
        );

        assert!(matches!(result, Err(StorageError::Sqlite(_))));
        assert_eq!(count_rows(store, "artists"), 0);
        assert_eq!(count_rows(store, "genres"), 0);
        assert_eq!(count_rows(store, "user_artists"), 0);
    }

    #[test]
    fn test_snapshot_for_unknown_user_is_rejected() {
        let test = create_test_store();
        let store = &test.store;

        let result = store.insert_snapshot("nobody", &[snapshot("a1", 50, &["rock"])]);

        assert!(result.is_err());
        assert_eq!(count_rows(store, "artists"), 0);
    }

    #[test]
    fn test_genre_summary_only_counts_recent_rankings() {
        let test = create_test_store();
        let store = &test.store;
        store.insert_user("user-2", None).unwrap();
        let old = istanbul().with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let recent = istanbul().with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();

        store
            .insert_snapshot_at("user-1", &[snapshot("old", 10, &["polka", "rock"])], old)
            .unwrap();
        store
            .insert_snapshot_at(
                "user-2",
                &[snapshot("a1", 50, &["rock", "pop"]), snapshot("a2", 40, &["pop"])],
                recent,
            )
            .unwrap();

        let since = istanbul().with_ymd_and_hms(2024, 2, 23, 10, 0, 0).unwrap();
        let summary = store.fetch_genre_summary(since).unwrap();
        assert_eq!(
            summary,
            vec![
                GenreCount { name: "pop".to_string(), count: 2 },
                GenreCount { name: "rock".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_reopening_existing_database_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("spotify_data.db");
        {
            let store = SqliteStore::new(&db_path, istanbul()).unwrap();
            store.insert_user("user-1", None).unwrap();
            store.insert_snapshot("user-1", &[snapshot("a1", 50, &["rock"])]).unwrap();
        }

        let store = SqliteStore::new(&db_path, istanbul()).unwrap();
        assert_eq!(store.fetch_all_artists().unwrap().len(), 1);
    }
}

//! SQLite schema for the toplisten database.
//!
//! Tables are created with `CREATE TABLE IF NOT EXISTS`; there are no
//! migrations.

pub(super) const CREATE_USERS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT
    )";

pub(super) const CREATE_ARTISTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS artists (
        id TEXT PRIMARY KEY,
        name TEXT,
        popularity INTEGER,
        followers INTEGER
    )";

pub(super) const CREATE_GENRES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS genres (
        artist_id TEXT,
        genre TEXT,
        FOREIGN KEY (artist_id) REFERENCES artists(id)
    )";

// Backs INSERT OR IGNORE on genres; without it every snapshot would duplicate
// the artist's tags.
pub(super) const CREATE_GENRES_UNIQUE_INDEX: &str = "
    CREATE UNIQUE INDEX IF NOT EXISTS idx_genres_artist_genre
        ON genres (artist_id, genre)";

pub(super) const CREATE_USER_ARTISTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS user_artists (
        user_id TEXT,
        artist_id TEXT,
        rank INTEGER,
        timestamp DATETIME,
        FOREIGN KEY (user_id) REFERENCES users(id),
        FOREIGN KEY (artist_id) REFERENCES artists(id),
        PRIMARY KEY (user_id, artist_id)
    )";

pub(super) const ALL_STATEMENTS: &[&str] = &[
    CREATE_USERS_TABLE,
    CREATE_ARTISTS_TABLE,
    CREATE_GENRES_TABLE,
    CREATE_GENRES_UNIQUE_INDEX,
    CREATE_USER_ARTISTS_TABLE,
];

/// Format of the `user_artists.timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

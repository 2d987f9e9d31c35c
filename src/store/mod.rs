mod schema;
mod sqlite_store;

pub use schema::TIMESTAMP_FORMAT;
pub use sqlite_store::SqliteStore;

use std::path::PathBuf;

use chrono::Utc;
use tabled::Table;

use super::open_store;
use crate::{
    error, info,
    utils::{format_genre_summary, sort_genre_counts, window_start},
    warning,
};

pub fn list_genres(db: Option<PathBuf>) {
    let store = open_store(db);
    let counts = match store.fetch_genre_counts() {
        Ok(counts) => counts,
        Err(e) => error!("Failed to load genres. Err: {}", e),
    };

    if counts.is_empty() {
        warning!("No genres recorded yet.");
        return;
    }

    println!("{}", Table::new(sort_genre_counts(counts)));
}

pub fn analyze(db: Option<PathBuf>, days: u32) {
    let store = open_store(db);
    let days = i64::from(days.max(1));
    let now = Utc::now().with_timezone(&store.utc_offset());

    let start = match window_start(now, days) {
        Some(start) => start,
        None => error!("A window of {} days is out of range", days),
    };

    let genres = match store.fetch_genre_summary(start) {
        Ok(genres) => genres,
        Err(e) => error!("Failed to analyze data. Err: {}", e),
    };

    let mut lines = format_genre_summary(days, &genres).into_iter();
    if let Some(title) = lines.next() {
        info!("{}", title);
    }
    for line in lines {
        println!("    {}", line);
    }
}

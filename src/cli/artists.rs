use std::path::PathBuf;

use tabled::Table;

use super::open_store;
use crate::{error, warning};

pub fn list_artists(db: Option<PathBuf>, search: Option<String>) {
    let store = open_store(db);
    let mut artists = match store.fetch_all_artists() {
        Ok(artists) => artists,
        Err(e) => error!("Failed to load artists. Err: {}", e),
    };

    if let Some(artist_search) = search {
        let search_term = artist_search.to_lowercase();
        artists.retain(|a| a.name.to_lowercase().contains(&search_term));
    }

    if artists.is_empty() {
        warning!("No artists recorded yet. Log in through the server first.");
        return;
    }

    // most popular first, then by name
    artists.sort_by(|a, b| {
        b.popularity
            .cmp(&a.popularity)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    println!("{}", Table::new(artists));
}

pub fn list_rankings(db: Option<PathBuf>) {
    let store = open_store(db);
    let rankings = match store.fetch_rankings() {
        Ok(rankings) => rankings,
        Err(e) => error!("Failed to load rankings. Err: {}", e),
    };

    if rankings.is_empty() {
        warning!("No rankings recorded yet.");
        return;
    }

    println!("{}", Table::new(rankings));
}

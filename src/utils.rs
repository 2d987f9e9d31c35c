use std::{cmp::Ordering, collections::BTreeMap, collections::HashSet};

use chrono::{DateTime, FixedOffset, TimeDelta};

use crate::types::{ArtistSnapshot, GenreCount};

/// Counts how many of `artists` carry each genre, most frequent first.
///
/// Genres with the same count keep the order in which they first appear in
/// `artists`. A genre listed twice for the same artist counts once.
pub fn rank_genres(artists: &[ArtistSnapshot]) -> Vec<GenreCount> {
    let mut ranked: Vec<GenreCount> = Vec::new();
    let mut positions: BTreeMap<&str, usize> = BTreeMap::new();

    for entry in artists {
        let mut seen = HashSet::new();
        for genre in &entry.genres {
            if !seen.insert(genre.as_str()) {
                continue;
            }
            match positions.get(genre.as_str()) {
                Some(&index) => ranked[index].count += 1,
                None => {
                    positions.insert(genre.as_str(), ranked.len());
                    ranked.push(GenreCount {
                        name: genre.clone(),
                        count: 1,
                    });
                }
            }
        }
    }

    // sort_by is stable, ties keep first-appearance order
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

/// Orders stored genre counts for display: count descending, then name.
pub fn sort_genre_counts(counts: BTreeMap<String, u64>) -> Vec<GenreCount> {
    let mut genres: Vec<GenreCount> = counts
        .into_iter()
        .map(|(name, count)| GenreCount { name, count })
        .collect();
    genres.sort_by(|a, b| match b.count.cmp(&a.count) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
    });
    genres
}

/// Start of the trailing window of `days` days ending at `now`.
///
/// `None` when the start falls outside the range chrono can represent.
pub fn window_start(now: DateTime<FixedOffset>, days: i64) -> Option<DateTime<FixedOffset>> {
    TimeDelta::try_days(days).and_then(|span| now.checked_sub_signed(span))
}

/// Human-readable lines for the trailing-window genre summary.
pub fn format_genre_summary(days: i64, genres: &[GenreCount]) -> Vec<String> {
    let mut lines = Vec::with_capacity(genres.len() + 1);
    lines.push(format!("Genres listened to in the last {} days:", days));
    if genres.is_empty() {
        lines.push("(no data)".to_string());
    }
    lines.extend(genres.iter().map(|g| format!("{}: {}", g.name, g.count)));
    lines
}

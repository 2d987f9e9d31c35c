use std::collections::BTreeMap;

use chrono::{FixedOffset, TimeZone};
use toplisten::types::{Artist, ArtistSnapshot, GenreCount};
use toplisten::utils::*;

// Helper function to create a test artist entry
fn create_test_artist(id: &str, genres: &[&str]) -> ArtistSnapshot {
    ArtistSnapshot {
        artist: Artist {
            id: id.to_string(),
            name: format!("Artist {}", id),
            popularity: 50,
            followers: 1000,
        },
        genres: genres.iter().map(|g| g.to_string()).collect(),
    }
}

fn genre(name: &str, count: u64) -> GenreCount {
    GenreCount {
        name: name.to_string(),
        count,
    }
}

#[test]
fn test_rank_genres_example() {
    let artists = vec![
        create_test_artist("a1", &["rock", "pop"]),
        create_test_artist("a2", &["pop"]),
    ];

    assert_eq!(rank_genres(&artists), vec![genre("pop", 2), genre("rock", 1)]);
}

#[test]
fn test_rank_genres_ties_keep_first_appearance() {
    let artists = vec![
        create_test_artist("a1", &["shoegaze", "ambient"]),
        create_test_artist("a2", &["techno", "ambient"]),
        create_test_artist("a3", &["techno", "dream pop", "shoegaze"]),
    ];

    let ranked = rank_genres(&artists);

    // shoegaze, ambient and techno all have 2; first seen order is shoegaze, ambient, techno
    assert_eq!(
        ranked,
        vec![
            genre("shoegaze", 2),
            genre("ambient", 2),
            genre("techno", 2),
            genre("dream pop", 1),
        ]
    );
}

#[test]
fn test_rank_genres_is_strictly_descending() {
    let artists = vec![
        create_test_artist("a1", &["a"]),
        create_test_artist("a2", &["b", "c"]),
        create_test_artist("a3", &["c", "b"]),
        create_test_artist("a4", &["c"]),
    ];

    let ranked = rank_genres(&artists);

    assert_eq!(ranked, vec![genre("c", 3), genre("b", 2), genre("a", 1)]);
    assert!(ranked.windows(2).all(|w| w[0].count >= w[1].count));
}

#[test]
fn test_rank_genres_counts_duplicate_tag_once_per_artist() {
    let artists = vec![create_test_artist("a1", &["rock", "rock"])];

    assert_eq!(rank_genres(&artists), vec![genre("rock", 1)]);
}

#[test]
fn test_rank_genres_empty() {
    assert!(rank_genres(&[]).is_empty());
    assert!(rank_genres(&[create_test_artist("a1", &[])]).is_empty());
}

#[test]
fn test_sort_genre_counts() {
    let mut counts = BTreeMap::new();
    counts.insert("rock".to_string(), 1);
    counts.insert("pop".to_string(), 2);
    counts.insert("jazz".to_string(), 1);

    assert_eq!(
        sort_genre_counts(counts),
        vec![genre("pop", 2), genre("jazz", 1), genre("rock", 1)]
    );
}

#[test]
fn test_window_start() {
    let offset = FixedOffset::east_opt(3 * 3600).unwrap();
    let now = offset.with_ymd_and_hms(2024, 3, 8, 12, 30, 0).unwrap();

    let start = window_start(now, 7);

    assert_eq!(start, Some(offset.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()));
}

#[test]
fn test_window_start_out_of_range() {
    let offset = FixedOffset::east_opt(3 * 3600).unwrap();
    let now = offset.with_ymd_and_hms(2024, 3, 8, 12, 30, 0).unwrap();

    assert_eq!(window_start(now, i64::from(u32::MAX)), None);
    assert_eq!(window_start(now, 100_000_000), None);
    assert_eq!(window_start(now, i64::MAX), None);
    assert!(window_start(now, 36_500).is_some());
}

#[test]
fn test_format_genre_summary() {
    let lines = format_genre_summary(7, &[genre("pop", 2), genre("rock", 1)]);
    assert_eq!(
        lines,
        vec![
            "Genres listened to in the last 7 days:".to_string(),
            "pop: 2".to_string(),
            "rock: 1".to_string(),
        ]
    );

    let empty = format_genre_summary(7, &[]);
    assert_eq!(empty.len(), 2);
}

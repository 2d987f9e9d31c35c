use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Token returned by the OAuth token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// `GET /me`
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
}

/// `GET /me/top/artists`
#[derive(Debug, Clone, Deserialize)]
pub struct TopArtistsResponse {
    pub items: Vec<RemoteArtist>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteArtist {
    pub id: String,
    pub name: String,
    pub popularity: i64,
    pub followers: Followers,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Followers {
    pub total: i64,
}

/// An artist row as stored in the `artists` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tabled)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub popularity: i64,
    pub followers: i64,
}

/// One entry of a fetched top-artists list: the artist and its genre tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistSnapshot {
    pub artist: Artist,
    pub genres: Vec<String>,
}

impl From<RemoteArtist> for ArtistSnapshot {
    fn from(remote: RemoteArtist) -> Self {
        ArtistSnapshot {
            artist: Artist {
                id: remote.id,
                name: remote.name,
                popularity: remote.popularity,
                followers: remote.followers.total,
            },
            genres: remote.genres,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct GenreCount {
    pub name: String,
    pub count: u64,
}

/// Body of `GET /top-artists`.
#[derive(Debug, Clone, Serialize)]
pub struct TopArtistsReport {
    pub artists: Vec<Artist>,
    pub genres: Vec<GenreCount>,
}

/// Body of `GET /fetch-data`.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedData {
    pub artists: Vec<Artist>,
    pub genres: std::collections::BTreeMap<String, u64>,
}

/// A row of `user_artists`, joined with the artist name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct RankingEntry {
    pub user_id: String,
    pub rank: i64,
    pub artist_id: String,
    pub artist_name: String,
    pub timestamp: String,
}

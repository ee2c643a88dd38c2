//! itch.io API response types
//!
//! Data structures for deserializing serverside API responses. Unknown
//! fields are ignored everywhere; the API returns far more than the
//! sideloader needs.

use serde::Deserialize;

/// Response to `POST /login`
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub key: ApiKey,
}

/// The API key object nested in a login response
#[derive(Debug, Deserialize)]
pub struct ApiKey {
    pub key: String,
}

/// Response to `GET /profile/owned-keys`
#[derive(Debug, Deserialize)]
pub struct OwnedKeysResponse {
    #[serde(default)]
    pub owned_keys: Vec<OwnedKey>,
}

/// One purchase: a download key and the game it unlocks
#[derive(Debug, Clone, Deserialize)]
pub struct OwnedKey {
    /// Download key id, passed as `download_key_id` on download calls
    pub id: u64,
    /// The game this key unlocks
    pub game_id: u64,
    pub game: GameInfo,
}

/// Game summary nested in an owned key
#[derive(Debug, Clone, Deserialize)]
pub struct GameInfo {
    pub title: String,
}

/// Response to `GET /games/{game_id}/uploads`
#[derive(Debug, Deserialize)]
pub struct UploadsResponse {
    #[serde(default)]
    pub uploads: Vec<Upload>,
}

/// One uploadable build of a game
#[derive(Debug, Clone, Deserialize)]
pub struct Upload {
    pub id: u64,
    pub filename: String,
    /// Content hash of the build; absent for some legacy uploads
    pub md5_hash: Option<String>,
}

/// Response to `POST /games/{game_id}/download-sessions`
#[derive(Debug, Deserialize)]
pub struct DownloadSessionResponse {
    pub uuid: String,
}

/// Response to the tag listing endpoint with `format=json`
#[derive(Debug, Deserialize)]
pub struct TagPageResponse {
    /// HTML fragment holding the game cells for this page
    #[serde(default)]
    pub content: String,
    /// Items on this page; zero means pagination is exhausted
    pub num_items: u32,
}

//! Core data types shared between the session layer and the catalog layer

use serde::{Deserialize, Serialize};

/// Authenticated user profile
///
/// Returned by the login endpoint and persisted alongside the bearer token.
/// `profile_pic` is a server-relative path; display requires concatenation
/// with the configured API base URL. The server sends an empty string when no
/// avatar has been uploaded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Server-assigned user id
    pub id: i64,
    /// Display name chosen at signup
    pub name: String,
    /// Login email, unique per account
    pub email: String,
    /// Server-relative avatar path (e.g. "/assets/profiles/user_1_1730.jpg")
    #[serde(default)]
    pub profile_pic: Option<String>,
}

/// One song in the full catalog
///
/// Owned by the catalog store; the session/search layer never mutates these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongCatalogEntry {
    /// Server-assigned song id
    pub id: i64,
    /// Song title
    pub title: String,
    /// Artist name ("Unknown Artist" when untagged)
    pub artist: String,
    /// Cover image URL
    pub cover: String,
}

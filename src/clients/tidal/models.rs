//! Wire models for the TIDAL v1 JSON API.
//!
//! Only identifiers are required, everything else defaults to absent so partial
//! objects returned by some endpoints still deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiArtistRef {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAlbumRef {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTrack {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    /// Seconds
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub artist: Option<ApiArtistRef>,
    #[serde(default)]
    pub artists: Vec<ApiArtistRef>,
    #[serde(default)]
    pub album: Option<ApiAlbumRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAlbum {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    /// Seconds
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub number_of_tracks: Option<u32>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub artist: Option<ApiArtistRef>,
    #[serde(default)]
    pub artists: Vec<ApiArtistRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiArtist {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCreator {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlaylist {
    pub uuid: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub number_of_tracks: Option<u32>,
    #[serde(default)]
    pub creator: Option<ApiCreator>,
}

/// Offset paginated listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total_number_of_items: Option<usize>,
}

/// Entry of a favorites listing, wraps the favorited object
#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteItem<T> {
    pub item: T,
}

/// Entry of `/playlists/{uuid}/items`, which mixes tracks and videos
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub item: ApiTrack,
}

impl PlaylistItem {
    pub fn is_track(&self) -> bool {
        self.kind.as_deref().is_none_or(|kind| kind.eq_ignore_ascii_case("track"))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub tracks: Option<Page<ApiTrack>>,
    #[serde(default)]
    pub albums: Option<Page<ApiAlbum>>,
    #[serde(default)]
    pub artists: Option<Page<ApiArtist>>,
    #[serde(default)]
    pub playlists: Option<Page<ApiPlaylist>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistBio {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub country_code: Option<String>,
}

/// Error body returned by the v1 API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub user_message: Option<String>,
    #[serde(default)]
    pub sub_status: Option<i64>,
}

/// Response of the OAuth device authorization endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub user_code: String,
    #[serde(default)]
    pub verification_uri: Option<String>,
    #[serde(default)]
    pub verification_uri_complete: Option<String>,
    /// Seconds until the device code expires
    pub expires_in: u64,
    /// Polling interval in seconds
    #[serde(default = "default_interval")]
    pub interval: u64,
}

fn default_interval() -> u64 {
    2
}

impl DeviceAuthorization {
    // The provider sometimes returns the verification link without a scheme
    pub fn login_url(&self) -> String {
        let url = self
            .verification_uri_complete
            .clone()
            .or_else(|| self.verification_uri.clone())
            .unwrap_or_else(|| format!("link.tidal.com/{}", self.user_code));
        if url.starts_with("http") {
            url
        } else {
            format!("https://{url}")
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenUser {
    #[serde(rename = "userId", default)]
    pub user_id: Option<u64>,
    #[serde(rename = "countryCode", default)]
    pub country_code: Option<String>,
}

/// Successful response of the OAuth token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub user: Option<TokenUser>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Error body of the OAuth endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

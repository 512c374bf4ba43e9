use async_trait::async_trait;

use crate::clients::errors::{Error, Result};
use crate::clients::session_store::Session;
use crate::clients::tidal::models::{
    ApiAlbum, ApiArtist, ApiPlaylist, ApiTrack, DeviceAuthorization,
};

/// Result of one poll of the device authorization token endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevicePoll {
    /// The user has not finished the browser login yet
    Pending,
    /// Polling too fast, the interval must grow
    SlowDown,
    Granted(Session),
    Denied(String),
    Expired,
}

/// Which entries of a playlist to remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSelection {
    ById(Vec<u64>),
    /// Zero based positions in the playlist
    ByIndex(Vec<usize>),
}

/// Accept a playlist id only when it is a plain UUID-like token.
///
/// Playlist ids end up in request paths, so separators, dots and percent
/// escapes must never get through.
pub fn check_playlist_id(playlist_id: &str) -> Result<&str> {
    let playlist_id = playlist_id.trim();
    if playlist_id.is_empty() {
        return Err(Error::ValidationError("playlist_id is required".into()));
    }
    if !playlist_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(Error::ValidationError(format!(
            "Invalid playlist_id format: {playlist_id:?}"
        )));
    }
    Ok(playlist_id)
}

/// Every remote operation the MCP tools need.
///
/// The server owns exactly one implementation behind an `Arc` and hands it to
/// every tool call. Remote methods fail with `Error::NotAuthenticated` while no
/// session is installed, and with `Error::NotFound` when TIDAL does not know
/// the requested object.
#[async_trait]
pub trait TidalApi: Send + Sync {
    async fn set_session(&self, session: Option<Session>);
    async fn session(&self) -> Option<Session>;
    /// Ask TIDAL whether the installed session is still accepted
    async fn check_login(&self) -> Result<bool>;

    async fn start_device_authorization(&self) -> Result<DeviceAuthorization>;
    async fn poll_device_authorization(&self, device_code: &str) -> Result<DevicePoll>;

    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<ApiTrack>>;
    async fn search_albums(&self, query: &str, limit: usize) -> Result<Vec<ApiAlbum>>;
    async fn search_artists(&self, query: &str, limit: usize) -> Result<Vec<ApiArtist>>;
    async fn search_playlists(&self, query: &str, limit: usize) -> Result<Vec<ApiPlaylist>>;

    async fn favorite_tracks(&self, limit: usize) -> Result<Vec<ApiTrack>>;
    async fn favorite_albums(&self, limit: usize) -> Result<Vec<ApiAlbum>>;
    async fn favorite_artists(&self, limit: usize) -> Result<Vec<ApiArtist>>;
    async fn add_favorite_track(&self, track_id: u64) -> Result<()>;
    async fn remove_favorite_track(&self, track_id: u64) -> Result<()>;
    async fn remove_favorite_album(&self, album_id: u64) -> Result<()>;

    async fn user_playlists(&self, limit: usize) -> Result<Vec<ApiPlaylist>>;
    async fn playlist(&self, playlist_id: &str) -> Result<ApiPlaylist>;
    async fn playlist_tracks(&self, playlist_id: &str, limit: usize) -> Result<Vec<ApiTrack>>;
    async fn create_playlist(&self, title: &str, description: &str) -> Result<ApiPlaylist>;
    /// Returns how many tracks TIDAL reports as added
    async fn add_playlist_tracks(&self, playlist_id: &str, track_ids: &[u64]) -> Result<usize>;
    /// Returns how many entries were removed
    async fn remove_playlist_tracks(
        &self,
        playlist_id: &str,
        selection: &TrackSelection,
    ) -> Result<usize>;
    async fn edit_playlist(&self, playlist_id: &str, title: &str, description: &str)
    -> Result<()>;
    async fn delete_playlist(&self, playlist_id: &str) -> Result<()>;

    async fn album(&self, album_id: u64) -> Result<ApiAlbum>;
    async fn album_tracks(&self, album_id: u64) -> Result<Vec<ApiTrack>>;
    async fn similar_albums(&self, album_id: u64) -> Result<Vec<ApiAlbum>>;

    async fn track(&self, track_id: u64) -> Result<ApiTrack>;
    async fn track_radio(&self, track_id: u64, limit: usize) -> Result<Vec<ApiTrack>>;

    async fn artist(&self, artist_id: u64) -> Result<ApiArtist>;
    async fn artist_bio(&self, artist_id: u64) -> Result<Option<String>>;
    async fn artist_albums(&self, artist_id: u64, limit: usize) -> Result<Vec<ApiAlbum>>;
    async fn artist_top_tracks(&self, artist_id: u64, limit: usize) -> Result<Vec<ApiTrack>>;
    async fn similar_artists(&self, artist_id: u64) -> Result<Vec<ApiArtist>>;
    async fn artist_radio(&self, artist_id: u64, limit: usize) -> Result<Vec<ApiTrack>>;
}

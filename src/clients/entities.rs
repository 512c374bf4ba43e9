//! Normalized records returned to MCP clients and the conversions from TIDAL wire models.
//!
//! Conversions never invent values: anything TIDAL left out stays `None` and is
//! serialized as `null`. Durations are passed through in seconds.

use serde::Serialize;

use crate::clients::tidal::models::{
    ApiAlbum, ApiArtist, ApiArtistRef, ApiPlaylist, ApiTrack,
};

const BROWSE_URL: &str = "https://tidal.com/browse";

const SUCCESS: &str = "success";

pub fn browse_url(kind: &str, id: impl std::fmt::Display) -> String {
    format!("{BROWSE_URL}/{kind}/{id}")
}

// Primary artist: the `artist` field, or the first of `artists`
fn primary_artist(artist: Option<ApiArtistRef>, artists: Vec<ApiArtistRef>) -> Option<String> {
    artist
        .and_then(|a| a.name)
        .or_else(|| artists.into_iter().find_map(|a| a.name))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_id: Option<String>,
    pub duration_seconds: Option<u32>,
    pub url: String,
}

impl From<ApiTrack> for Track {
    fn from(t: ApiTrack) -> Track {
        let (album, album_id) = match t.album {
            Some(a) => (a.title, a.id.map(|id| id.to_string())),
            None => (None, None),
        };
        Track {
            id: t.id.to_string(),
            title: t.title,
            artist: primary_artist(t.artist, t.artists),
            album,
            album_id,
            duration_seconds: t.duration,
            url: browse_url("track", t.id),
        }
    }
}

impl Track {
    /// Fill the album reference from the album the track was listed under
    #[must_use]
    pub fn with_album(mut self, album: &Album) -> Self {
        if self.album_id.is_none() {
            self.album_id = Some(album.id.clone());
        }
        if self.album.is_none() {
            self.album.clone_from(&album.title);
        }
        self
    }

    /// Fill a missing artist with the artist the track was requested for
    #[must_use]
    pub fn with_artist_fallback(mut self, artist: Option<&str>) -> Self {
        if self.artist.is_none() {
            self.artist = artist.map(str::to_string);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Album {
    pub id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub release_date: Option<String>,
    pub num_tracks: Option<u32>,
    pub duration_seconds: Option<u32>,
    pub url: String,
}

impl From<ApiAlbum> for Album {
    fn from(a: ApiAlbum) -> Album {
        Album {
            id: a.id.to_string(),
            title: a.title,
            artist: primary_artist(a.artist, a.artists),
            release_date: a.release_date.filter(|d| !d.is_empty()),
            num_tracks: a.number_of_tracks,
            duration_seconds: a.duration,
            url: browse_url("album", a.id),
        }
    }
}

impl Album {
    #[must_use]
    pub fn with_artist_fallback(mut self, artist: Option<&str>) -> Self {
        if self.artist.is_none() {
            self.artist = artist.map(str::to_string);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artist {
    pub id: String,
    pub name: Option<String>,
    pub url: String,
}

impl From<ApiArtist> for Artist {
    fn from(a: ApiArtist) -> Artist {
        Artist {
            id: a.id.to_string(),
            name: a.name,
            url: browse_url("artist", a.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playlist {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub track_count: Option<u32>,
    pub creator: Option<String>,
    pub url: String,
}

impl From<ApiPlaylist> for Playlist {
    fn from(p: ApiPlaylist) -> Playlist {
        Playlist {
            url: browse_url("playlist", &p.uuid),
            id: p.uuid,
            name: p.title,
            description: p.description,
            track_count: p.number_of_tracks,
            creator: p.creator.and_then(|c| c.name),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackList {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub count: usize,
    pub tracks: Vec<Track>,
}

impl TrackList {
    pub fn new(tracks: Vec<Track>) -> Self {
        TrackList {
            status: SUCCESS,
            query: None,
            count: tracks.len(),
            tracks,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }
}

impl FromIterator<Track> for TrackList {
    fn from_iter<I: IntoIterator<Item = Track>>(iter: I) -> Self {
        TrackList::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlbumList {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub count: usize,
    pub albums: Vec<Album>,
}

impl AlbumList {
    pub fn new(albums: Vec<Album>) -> Self {
        AlbumList {
            status: SUCCESS,
            query: None,
            count: albums.len(),
            albums,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }
}

impl FromIterator<Album> for AlbumList {
    fn from_iter<I: IntoIterator<Item = Album>>(iter: I) -> Self {
        AlbumList::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtistList {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub count: usize,
    pub artists: Vec<Artist>,
}

impl ArtistList {
    pub fn new(artists: Vec<Artist>) -> Self {
        ArtistList {
            status: SUCCESS,
            query: None,
            count: artists.len(),
            artists,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }
}

impl FromIterator<Artist> for ArtistList {
    fn from_iter<I: IntoIterator<Item = Artist>>(iter: I) -> Self {
        ArtistList::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistList {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub count: usize,
    pub playlists: Vec<Playlist>,
}

impl PlaylistList {
    pub fn new(playlists: Vec<Playlist>) -> Self {
        PlaylistList {
            status: SUCCESS,
            query: None,
            count: playlists.len(),
            playlists,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }
}

impl FromIterator<Playlist> for PlaylistList {
    fn from_iter<I: IntoIterator<Item = Playlist>>(iter: I) -> Self {
        PlaylistList::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistTracks {
    pub status: &'static str,
    pub playlist_id: String,
    pub playlist_name: Option<String>,
    pub count: usize,
    pub tracks: Vec<Track>,
}

impl PlaylistTracks {
    pub fn new(playlist: &Playlist, tracks: Vec<Track>) -> Self {
        PlaylistTracks {
            status: SUCCESS,
            playlist_id: playlist.id.clone(),
            playlist_name: playlist.name.clone(),
            count: tracks.len(),
            tracks,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlbumTracks {
    pub status: &'static str,
    pub album_id: String,
    pub album_title: Option<String>,
    pub artist: Option<String>,
    pub count: usize,
    pub tracks: Vec<Track>,
}

impl AlbumTracks {
    pub fn new(album: &Album, tracks: Vec<Track>) -> Self {
        AlbumTracks {
            status: SUCCESS,
            album_id: album.id.clone(),
            album_title: album.title.clone(),
            artist: album.artist.clone(),
            count: tracks.len(),
            tracks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedType {
    Track,
    Artist,
}

#[derive(Debug, Clone, Serialize)]
pub struct RadioTracks {
    pub status: &'static str,
    pub seed_id: String,
    pub seed_type: SeedType,
    pub seed_name: Option<String>,
    pub count: usize,
    pub tracks: Vec<Track>,
}

impl RadioTracks {
    pub fn from_track(seed: &Track, tracks: Vec<Track>) -> Self {
        let seed_name = seed.title.as_ref().map(|title| match &seed.artist {
            Some(artist) => format!("{title} by {artist}"),
            None => title.clone(),
        });
        RadioTracks {
            status: SUCCESS,
            seed_id: seed.id.clone(),
            seed_type: SeedType::Track,
            seed_name,
            count: tracks.len(),
            tracks,
        }
    }

    pub fn from_artist(seed: &Artist, tracks: Vec<Track>) -> Self {
        RadioTracks {
            status: SUCCESS,
            seed_id: seed.id.clone(),
            seed_type: SeedType::Artist,
            seed_name: seed.name.clone(),
            count: tracks.len(),
            tracks,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtistDetails {
    pub status: &'static str,
    pub artist: Artist,
    pub bio: Option<String>,
}

impl ArtistDetails {
    pub fn new(artist: Artist, bio: Option<String>) -> Self {
        ArtistDetails {
            status: SUCCESS,
            artist,
            bio,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlbumDetails {
    pub status: &'static str,
    pub album: Album,
}

impl AlbumDetails {
    pub fn new(album: Album) -> Self {
        AlbumDetails {
            status: SUCCESS,
            album,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResult {
    pub status: &'static str,
    pub message: String,
    pub authenticated: bool,
}

impl AuthResult {
    pub fn new(message: impl Into<String>) -> Self {
        AuthResult {
            status: SUCCESS,
            message: message.into(),
            authenticated: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistResult {
    pub status: &'static str,
    pub playlist: Playlist,
    pub message: String,
}

impl CreatePlaylistResult {
    pub fn new(playlist: Playlist) -> Self {
        let message = format!(
            "Created playlist '{}'",
            playlist.name.as_deref().unwrap_or(&playlist.id)
        );
        CreatePlaylistResult {
            status: SUCCESS,
            playlist,
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddTracksResult {
    pub status: &'static str,
    pub playlist_id: String,
    pub playlist_name: Option<String>,
    pub tracks_added: usize,
    pub playlist_url: String,
    pub message: String,
}

impl AddTracksResult {
    pub fn new(playlist: &Playlist, tracks_added: usize) -> Self {
        AddTracksResult {
            status: SUCCESS,
            playlist_id: playlist.id.clone(),
            playlist_name: playlist.name.clone(),
            tracks_added,
            playlist_url: playlist.url.clone(),
            message: format!(
                "Added {tracks_added} tracks to playlist '{}'",
                playlist.name.as_deref().unwrap_or(&playlist.id)
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveTracksResult {
    pub status: &'static str,
    pub playlist_id: String,
    pub playlist_name: Option<String>,
    pub tracks_removed: usize,
    pub message: String,
}

impl RemoveTracksResult {
    pub fn new(playlist: &Playlist, tracks_removed: usize) -> Self {
        RemoveTracksResult {
            status: SUCCESS,
            playlist_id: playlist.id.clone(),
            playlist_name: playlist.name.clone(),
            tracks_removed,
            message: format!(
                "Removed {tracks_removed} tracks from playlist '{}'",
                playlist.name.as_deref().unwrap_or(&playlist.id)
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatePlaylistResult {
    pub status: &'static str,
    pub playlist: Playlist,
    pub message: String,
}

impl UpdatePlaylistResult {
    pub fn new(playlist: Playlist) -> Self {
        let message = format!(
            "Updated playlist '{}'",
            playlist.name.as_deref().unwrap_or(&playlist.id)
        );
        UpdatePlaylistResult {
            status: SUCCESS,
            playlist,
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletePlaylistResult {
    pub status: &'static str,
    pub playlist_id: String,
    pub message: String,
}

impl DeletePlaylistResult {
    pub fn new(playlist: &Playlist) -> Self {
        DeletePlaylistResult {
            status: SUCCESS,
            playlist_id: playlist.id.clone(),
            message: format!(
                "Deleted playlist '{}'",
                playlist.name.as_deref().unwrap_or(&playlist.id)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Track,
    Album,
}

impl ItemType {
    fn label(self) -> &'static str {
        match self {
            ItemType::Track => "Track",
            ItemType::Album => "Album",
        }
    }
}

/// Outcome of adding an item to or removing it from the user's favorites
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteResult {
    pub status: &'static str,
    pub item_id: String,
    pub item_type: ItemType,
    /// False when a removal found the item already absent
    pub changed: bool,
    pub message: String,
}

impl FavoriteResult {
    pub fn added(item_type: ItemType, item_id: &str) -> Self {
        FavoriteResult {
            status: SUCCESS,
            item_id: item_id.to_string(),
            item_type,
            changed: true,
            message: format!("{} {item_id} added to favorites", item_type.label()),
        }
    }

    pub fn removed(item_type: ItemType, item_id: &str, changed: bool) -> Self {
        let message = if changed {
            format!("{} {item_id} removed from favorites", item_type.label())
        } else {
            format!("{} {item_id} was not in favorites", item_type.label())
        };
        FavoriteResult {
            status: SUCCESS,
            item_id: item_id.to_string(),
            item_type,
            changed,
            message,
        }
    }
}

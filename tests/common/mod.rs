#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, RawContent};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tidal_mcp::clients::api::{DevicePoll, TidalApi, TrackSelection};
use tidal_mcp::clients::auth::{Authenticator, LoginPrompt};
use tidal_mcp::clients::errors::{Error, Result};
use tidal_mcp::clients::session_store::{Session, SessionStore};
use tidal_mcp::clients::tidal::models::{
    ApiAlbum, ApiAlbumRef, ApiArtist, ApiArtistRef, ApiCreator, ApiPlaylist, ApiTrack,
    DeviceAuthorization,
};
use tidal_mcp::mcp::tools::TidalTools;

pub const VALID_TOKEN: &str = "granted-token";
/// Searching for this fails the way a TIDAL outage does
pub const OUTAGE_QUERY: &str = "outage";

pub fn session(token: &str) -> Session {
    Session {
        token_type: "Bearer".into(),
        access_token: token.into(),
        refresh_token: Some("refresh".into()),
        expires_at: None,
        user_id: Some(42),
        country_code: Some("US".into()),
    }
}

fn artist_ref(id: u64, name: &str) -> ApiArtistRef {
    ApiArtistRef {
        id: Some(id),
        name: Some(name.into()),
    }
}

pub fn track(id: u64, title: &str, artist: &str, album: u64) -> ApiTrack {
    ApiTrack {
        id,
        title: Some(title.into()),
        duration: Some(200),
        artist: Some(artist_ref(1, artist)),
        artists: vec![],
        album: Some(ApiAlbumRef {
            id: Some(album),
            title: Some(format!("Album {album}")),
        }),
    }
}

#[derive(Default)]
pub struct FakeState {
    pub session: Option<Session>,
    pub valid_tokens: HashSet<String>,
    /// Scripted answers of the token endpoint, `Pending` once exhausted
    pub polls: VecDeque<DevicePoll>,
    pub poll_count: usize,
    pub tracks: Vec<ApiTrack>,
    pub albums: Vec<ApiAlbum>,
    pub artists: Vec<ApiArtist>,
    pub favorite_tracks: Vec<u64>,
    pub favorite_albums: Vec<u64>,
    pub favorite_artists: Vec<u64>,
    pub playlists: Vec<(ApiPlaylist, Vec<u64>)>,
    pub next_playlist: u32,
}

/// In-memory TIDAL account behind the `TidalApi` seam
pub struct FakeTidal {
    state: Mutex<FakeState>,
}

impl FakeTidal {
    pub fn new() -> Arc<Self> {
        let mut state = FakeState::default();
        state.valid_tokens.insert(VALID_TOKEN.into());
        state.tracks = vec![
            track(11, "Blue Monday", "New Order", 100),
            track(12, "Blue Velvet", "Bobby Vinton", 101),
            track(13, "True Faith", "New Order", 100),
            track(14, "Kind of Blue", "Miles Davis", 102),
        ];
        state.albums = vec![
            ApiAlbum {
                id: 100,
                title: Some("Substance".into()),
                number_of_tracks: Some(2),
                artist: Some(artist_ref(1, "New Order")),
                ..ApiAlbum::default()
            },
            ApiAlbum {
                id: 101,
                title: Some("Blue on Blue".into()),
                ..ApiAlbum::default()
            },
        ];
        state.artists = vec![
            ApiArtist {
                id: 1,
                name: Some("New Order".into()),
            },
            ApiArtist {
                id: 2,
                name: Some("Joy Division".into()),
            },
        ];
        state.favorite_tracks = vec![13, 11];
        state.favorite_albums = vec![100];
        state.favorite_artists = vec![1];
        Arc::new(FakeTidal {
            state: Mutex::new(state),
        })
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn script_polls(&self, polls: impl IntoIterator<Item = DevicePoll>) {
        self.state().polls.extend(polls);
    }

    // Remote calls without a session fail like the real client does
    fn authed(&self) -> Result<MutexGuard<'_, FakeState>> {
        let state = self.state();
        if state.session.is_none() {
            return Err(Error::NotAuthenticated);
        }
        Ok(state)
    }

    fn find_track(state: &FakeState, id: u64) -> Result<ApiTrack> {
        state
            .tracks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("track {id}")))
    }

    fn find_album(state: &FakeState, id: u64) -> Result<ApiAlbum> {
        state
            .albums
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("album {id}")))
    }

    fn find_artist(state: &FakeState, id: u64) -> Result<ApiArtist> {
        state
            .artists
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("artist {id}")))
    }

    fn find_playlist<'a>(
        state: &'a mut FakeState,
        id: &str,
    ) -> Result<&'a mut (ApiPlaylist, Vec<u64>)> {
        state
            .playlists
            .iter_mut()
            .find(|(p, _)| p.uuid == id)
            .ok_or_else(|| Error::NotFound(format!("playlist {id}")))
    }
}

fn matches(title: Option<&String>, query: &str) -> bool {
    title.is_some_and(|t| t.to_lowercase().contains(&query.to_lowercase()))
}

#[async_trait]
impl TidalApi for FakeTidal {
    async fn set_session(&self, session: Option<Session>) {
        self.state().session = session;
    }

    async fn session(&self) -> Option<Session> {
        self.state().session.clone()
    }

    async fn check_login(&self) -> Result<bool> {
        let state = self.state();
        Ok(state
            .session
            .as_ref()
            .is_some_and(|s| state.valid_tokens.contains(&s.access_token)))
    }

    async fn start_device_authorization(&self) -> Result<DeviceAuthorization> {
        Ok(DeviceAuthorization {
            device_code: "device-1".into(),
            user_code: "ABCDE".into(),
            verification_uri: Some("link.tidal.com".into()),
            verification_uri_complete: Some("link.tidal.com/ABCDE".into()),
            expires_in: 600,
            interval: 2,
        })
    }

    async fn poll_device_authorization(&self, device_code: &str) -> Result<DevicePoll> {
        assert_eq!(device_code, "device-1");
        let mut state = self.state();
        state.poll_count += 1;
        Ok(state.polls.pop_front().unwrap_or(DevicePoll::Pending))
    }

    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<ApiTrack>> {
        let state = self.authed()?;
        if query == OUTAGE_QUERY {
            return Err(Error::RemoteError(
                "500 Internal Server Error on /v1/search: Internal error".into(),
            ));
        }
        Ok(state
            .tracks
            .iter()
            .filter(|t| matches(t.title.as_ref(), query))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn search_albums(&self, query: &str, limit: usize) -> Result<Vec<ApiAlbum>> {
        let state = self.authed()?;
        Ok(state
            .albums
            .iter()
            .filter(|a| matches(a.title.as_ref(), query))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn search_artists(&self, query: &str, limit: usize) -> Result<Vec<ApiArtist>> {
        let state = self.authed()?;
        Ok(state
            .artists
            .iter()
            .filter(|a| matches(a.name.as_ref(), query))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn search_playlists(&self, query: &str, limit: usize) -> Result<Vec<ApiPlaylist>> {
        let state = self.authed()?;
        Ok(state
            .playlists
            .iter()
            .map(|(p, _)| p)
            .filter(|p| matches(p.title.as_ref(), query))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn favorite_tracks(&self, limit: usize) -> Result<Vec<ApiTrack>> {
        let state = self.authed()?;
        state
            .favorite_tracks
            .iter()
            .take(limit)
            .map(|id| Self::find_track(&state, *id))
            .collect()
    }

    async fn favorite_albums(&self, limit: usize) -> Result<Vec<ApiAlbum>> {
        let state = self.authed()?;
        state
            .favorite_albums
            .iter()
            .take(limit)
            .map(|id| Self::find_album(&state, *id))
            .collect()
    }

    async fn favorite_artists(&self, limit: usize) -> Result<Vec<ApiArtist>> {
        let state = self.authed()?;
        state
            .favorite_artists
            .iter()
            .take(limit)
            .map(|id| Self::find_artist(&state, *id))
            .collect()
    }

    async fn add_favorite_track(&self, track_id: u64) -> Result<()> {
        let mut state = self.authed()?;
        Self::find_track(&state, track_id)?;
        if !state.favorite_tracks.contains(&track_id) {
            state.favorite_tracks.insert(0, track_id);
        }
        Ok(())
    }

    async fn remove_favorite_track(&self, track_id: u64) -> Result<()> {
        let mut state = self.authed()?;
        let before = state.favorite_tracks.len();
        state.favorite_tracks.retain(|id| *id != track_id);
        if state.favorite_tracks.len() == before {
            return Err(Error::NotFound(format!("favorite track {track_id}")));
        }
        Ok(())
    }

    async fn remove_favorite_album(&self, album_id: u64) -> Result<()> {
        let mut state = self.authed()?;
        let before = state.favorite_albums.len();
        state.favorite_albums.retain(|id| *id != album_id);
        if state.favorite_albums.len() == before {
            return Err(Error::NotFound(format!("favorite album {album_id}")));
        }
        Ok(())
    }

    async fn user_playlists(&self, limit: usize) -> Result<Vec<ApiPlaylist>> {
        let state = self.authed()?;
        Ok(state
            .playlists
            .iter()
            .take(limit)
            .map(|(p, _)| p.clone())
            .collect())
    }

    async fn playlist(&self, playlist_id: &str) -> Result<ApiPlaylist> {
        let mut state = self.authed()?;
        Ok(Self::find_playlist(&mut state, playlist_id)?.0.clone())
    }

    async fn playlist_tracks(&self, playlist_id: &str, limit: usize) -> Result<Vec<ApiTrack>> {
        let mut state = self.authed()?;
        let ids = Self::find_playlist(&mut state, playlist_id)?.1.clone();
        ids.iter()
            .take(limit)
            .map(|id| Self::find_track(&state, *id))
            .collect()
    }

    async fn create_playlist(&self, title: &str, description: &str) -> Result<ApiPlaylist> {
        let mut state = self.authed()?;
        state.next_playlist += 1;
        let playlist = ApiPlaylist {
            uuid: format!("pl-{}", state.next_playlist),
            title: Some(title.into()),
            description: Some(description.into()),
            number_of_tracks: Some(0),
            creator: Some(ApiCreator {
                id: Some(42),
                name: None,
            }),
        };
        state.playlists.insert(0, (playlist.clone(), vec![]));
        Ok(playlist)
    }

    async fn add_playlist_tracks(&self, playlist_id: &str, track_ids: &[u64]) -> Result<usize> {
        let mut state = self.authed()?;
        let (playlist, items) = Self::find_playlist(&mut state, playlist_id)?;
        let mut added = 0;
        for id in track_ids {
            if !items.contains(id) {
                items.push(*id);
                added += 1;
            }
        }
        playlist.number_of_tracks = u32::try_from(items.len()).ok();
        Ok(added)
    }

    async fn remove_playlist_tracks(
        &self,
        playlist_id: &str,
        selection: &TrackSelection,
    ) -> Result<usize> {
        let mut state = self.authed()?;
        let (playlist, items) = Self::find_playlist(&mut state, playlist_id)?;
        let before = items.len();
        match selection {
            TrackSelection::ById(ids) => items.retain(|id| !ids.contains(id)),
            TrackSelection::ByIndex(indices) => {
                let mut position = 0;
                items.retain(|_| {
                    let keep = !indices.contains(&position);
                    position += 1;
                    keep
                });
            }
        }
        playlist.number_of_tracks = u32::try_from(items.len()).ok();
        Ok(before - items.len())
    }

    async fn edit_playlist(&self, playlist_id: &str, title: &str, description: &str) -> Result<()> {
        let mut state = self.authed()?;
        let (playlist, _) = Self::find_playlist(&mut state, playlist_id)?;
        playlist.title = Some(title.into());
        playlist.description = Some(description.into());
        Ok(())
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<()> {
        let mut state = self.authed()?;
        Self::find_playlist(&mut state, playlist_id)?;
        state.playlists.retain(|(p, _)| p.uuid != playlist_id);
        Ok(())
    }

    async fn album(&self, album_id: u64) -> Result<ApiAlbum> {
        let state = self.authed()?;
        Self::find_album(&state, album_id)
    }

    async fn album_tracks(&self, album_id: u64) -> Result<Vec<ApiTrack>> {
        let state = self.authed()?;
        Self::find_album(&state, album_id)?;
        // Album listings come without the album reference
        Ok(state
            .tracks
            .iter()
            .filter(|t| t.album.as_ref().and_then(|a| a.id) == Some(album_id))
            .map(|t| ApiTrack {
                album: None,
                ..t.clone()
            })
            .collect())
    }

    async fn similar_albums(&self, album_id: u64) -> Result<Vec<ApiAlbum>> {
        let state = self.authed()?;
        Self::find_album(&state, album_id)?;
        Ok(state
            .albums
            .iter()
            .filter(|a| a.id != album_id)
            .cloned()
            .collect())
    }

    async fn track(&self, track_id: u64) -> Result<ApiTrack> {
        let state = self.authed()?;
        Self::find_track(&state, track_id)
    }

    async fn track_radio(&self, track_id: u64, limit: usize) -> Result<Vec<ApiTrack>> {
        let state = self.authed()?;
        Self::find_track(&state, track_id)?;
        Ok(state
            .tracks
            .iter()
            .filter(|t| t.id != track_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn artist(&self, artist_id: u64) -> Result<ApiArtist> {
        let state = self.authed()?;
        Self::find_artist(&state, artist_id)
    }

    async fn artist_bio(&self, artist_id: u64) -> Result<Option<String>> {
        let state = self.authed()?;
        Self::find_artist(&state, artist_id)?;
        match artist_id {
            1 => Ok(Some("Formed in Salford in 1980.".into())),
            _ => Err(Error::RemoteError("bio service unavailable".into())),
        }
    }

    async fn artist_albums(&self, artist_id: u64, limit: usize) -> Result<Vec<ApiAlbum>> {
        let state = self.authed()?;
        Self::find_artist(&state, artist_id)?;
        // Discography entries often omit the artist
        Ok(state
            .albums
            .iter()
            .take(limit)
            .map(|a| ApiAlbum {
                artist: None,
                ..a.clone()
            })
            .collect())
    }

    async fn artist_top_tracks(&self, artist_id: u64, limit: usize) -> Result<Vec<ApiTrack>> {
        let state = self.authed()?;
        let artist = Self::find_artist(&state, artist_id)?;
        Ok(state
            .tracks
            .iter()
            .filter(|t| t.artist.as_ref().and_then(|a| a.name.as_ref()) == artist.name.as_ref())
            .take(limit)
            .map(|t| ApiTrack {
                artist: None,
                ..t.clone()
            })
            .collect())
    }

    async fn similar_artists(&self, artist_id: u64) -> Result<Vec<ApiArtist>> {
        let state = self.authed()?;
        Self::find_artist(&state, artist_id)?;
        Ok(state
            .artists
            .iter()
            .filter(|a| a.id != artist_id)
            .cloned()
            .collect())
    }

    async fn artist_radio(&self, artist_id: u64, limit: usize) -> Result<Vec<ApiTrack>> {
        let state = self.authed()?;
        Self::find_artist(&state, artist_id)?;
        Ok(state.tracks.iter().take(limit).cloned().collect())
    }
}

/// Records every login link instead of opening a browser
#[derive(Clone, Default)]
pub struct RecordingPrompt {
    pub shown: Arc<Mutex<Vec<String>>>,
}

impl LoginPrompt for RecordingPrompt {
    fn show(&self, authorization: &DeviceAuthorization) -> std::io::Result<()> {
        self.shown.lock().unwrap().push(authorization.login_url());
        Ok(())
    }
}

/// One server process: a client, the login flow and the tools
pub struct Harness {
    pub api: Arc<FakeTidal>,
    pub auth: Arc<Authenticator>,
    pub tools: TidalTools,
    pub store: SessionStore,
    pub prompt: RecordingPrompt,
}

fn params<T: DeserializeOwned>(arguments: Value) -> Parameters<T> {
    Parameters(serde_json::from_value(arguments).expect("arguments should match the tool schema"))
}

/// The JSON payload of a tool result and its error flag
pub fn payload(result: &CallToolResult) -> (Value, bool) {
    let text = match &result.content[0].raw {
        RawContent::Text(text) => text.text.as_str(),
        _ => panic!("Expected text content"),
    };
    (
        serde_json::from_str(text).unwrap(),
        result.is_error == Some(true),
    )
}

impl Harness {
    pub fn new(api: Arc<FakeTidal>, session_file: &Path) -> Self {
        Self::with_timeout(api, session_file, Duration::from_secs(300))
    }

    pub fn with_timeout(api: Arc<FakeTidal>, session_file: &Path, timeout: Duration) -> Self {
        let store = SessionStore::new(session_file);
        let prompt = RecordingPrompt::default();
        let auth = Arc::new(Authenticator::new(
            api.clone(),
            store.clone(),
            Box::new(prompt.clone()),
            timeout,
        ));
        let tools = TidalTools::new(api.clone(), auth.clone());
        Harness {
            api,
            auth,
            tools,
            store,
            prompt,
        }
    }

    /// Harness whose session file already holds an accepted session
    pub async fn logged_in(session_file: &Path) -> Self {
        let harness = Self::new(FakeTidal::new(), session_file);
        harness.store.save(&session(VALID_TOKEN)).await.unwrap();
        harness
    }

    /// Call a tool by name, returning its JSON payload and the error flag
    pub async fn call(&self, name: &str, arguments: Value) -> (Value, bool) {
        let t = &self.tools;
        let a = arguments;
        let result = match name {
            "login" => t.login().await,
            "search_tracks" => t.search_tracks(params(a)).await,
            "search_albums" => t.search_albums(params(a)).await,
            "search_artists" => t.search_artists(params(a)).await,
            "search_playlists" => t.search_playlists(params(a)).await,
            "get_favorite_tracks" => t.get_favorite_tracks(params(a)).await,
            "get_favorite_albums" => t.get_favorite_albums(params(a)).await,
            "get_favorite_artists" => t.get_favorite_artists(params(a)).await,
            "add_track_to_favorites" => t.add_track_to_favorites(params(a)).await,
            "remove_track_from_favorites" => t.remove_track_from_favorites(params(a)).await,
            "remove_album_from_favorites" => t.remove_album_from_favorites(params(a)).await,
            "get_user_playlists" => t.get_user_playlists(params(a)).await,
            "get_playlist_tracks" => t.get_playlist_tracks(params(a)).await,
            "create_playlist" => t.create_playlist(params(a)).await,
            "add_tracks_to_playlist" => t.add_tracks_to_playlist(params(a)).await,
            "remove_tracks_from_playlist" => t.remove_tracks_from_playlist(params(a)).await,
            "update_playlist" => t.update_playlist(params(a)).await,
            "delete_playlist" => t.delete_playlist(params(a)).await,
            "get_album" => t.get_album(params(a)).await,
            "get_album_tracks" => t.get_album_tracks(params(a)).await,
            "get_similar_albums" => t.get_similar_albums(params(a)).await,
            "get_artist" => t.get_artist(params(a)).await,
            "get_artist_albums" => t.get_artist_albums(params(a)).await,
            "get_artist_top_tracks" => t.get_artist_top_tracks(params(a)).await,
            "get_similar_artists" => t.get_similar_artists(params(a)).await,
            "get_track_radio" => t.get_track_radio(params(a)).await,
            "get_artist_radio" => t.get_artist_radio(params(a)).await,
            other => panic!("no tool named {other}"),
        }
        .expect("tool failures are results, not protocol errors");
        payload(&result)
    }

    /// Call a tool that must succeed
    pub async fn ok(&self, name: &str, arguments: Value) -> Value {
        let (value, is_error) = self.call(name, arguments).await;
        assert!(!is_error, "{name} failed: {value}");
        value
    }

    /// Call a tool that must fail, returning the error kind
    pub async fn err(&self, name: &str, arguments: Value) -> String {
        let (value, is_error) = self.call(name, arguments).await;
        assert!(is_error, "{name} unexpectedly succeeded: {value}");
        assert_eq!(value["status"], "error");
        value["error"].as_str().unwrap().to_string()
    }
}

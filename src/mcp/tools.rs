//! The TIDAL tools: argument types, the auth gate, one remote call per tool and
//! response shaping.

use std::future::Future;
use std::sync::Arc;

use log::{debug, warn};
use rmcp::{
    ErrorData as McpError,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Tool},
    schemars,
    schemars::JsonSchema,
    tool, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::clients::api::{TidalApi, TrackSelection, check_playlist_id};
use crate::clients::auth::{Authenticator, LoginOutcome};
use crate::clients::entities::{
    AddTracksResult, Album, AlbumDetails, AlbumList, AlbumTracks, Artist, ArtistDetails,
    ArtistList, AuthResult, CreatePlaylistResult, DeletePlaylistResult, FavoriteResult, ItemType,
    Playlist, PlaylistList, PlaylistTracks, RadioTracks, RemoveTracksResult, Track, TrackList,
    UpdatePlaylistResult,
};
use crate::clients::errors::{Error, Result};

// =============================================================================
// Arguments
// =============================================================================

/// A TIDAL track, album or artist id. Clients send these as strings or numbers.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ItemId {
    Number(u64),
    Text(String),
}

impl ItemId {
    fn parse(&self, key: &str) -> Result<u64> {
        match self {
            ItemId::Number(id) => Ok(*id),
            ItemId::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| Error::ValidationError(format!("Invalid {key} format: {text:?}"))),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "Search text: artist name, title, or both")]
    pub query: String,
    #[schemars(description = "Maximum results (1-50, default: 10)")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListParams {
    #[schemars(description = "Maximum results (1-1000, default: 50)")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TrackParams {
    #[schemars(description = "ID of the track")]
    pub track_id: ItemId,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TrackRadioParams {
    #[schemars(description = "ID of the seed track")]
    pub track_id: ItemId,
    #[schemars(description = "Maximum results (1-100, default: 20)")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AlbumParams {
    #[schemars(description = "ID of the album")]
    pub album_id: ItemId,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SimilarAlbumsParams {
    #[schemars(description = "ID of the album")]
    pub album_id: ItemId,
    #[schemars(description = "Maximum results (1-50, default: 10)")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ArtistParams {
    #[schemars(description = "ID of the artist")]
    pub artist_id: ItemId,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ArtistListParams {
    #[schemars(description = "ID of the artist")]
    pub artist_id: ItemId,
    #[schemars(description = "Maximum results (at most 50 for listings, 100 for radio)")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PlaylistParams {
    #[schemars(description = "ID (UUID) of the playlist")]
    pub playlist_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PlaylistTracksParams {
    #[schemars(description = "ID (UUID) of the playlist")]
    pub playlist_id: String,
    #[schemars(description = "Maximum results (1-10000, default: 100)")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreatePlaylistParams {
    #[schemars(description = "Name for the playlist")]
    pub name: String,
    #[schemars(description = "Optional description")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddTracksParams {
    #[schemars(description = "ID (UUID) of the playlist")]
    pub playlist_id: String,
    #[schemars(description = "IDs of the tracks to add")]
    pub track_ids: Vec<ItemId>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveTracksParams {
    #[schemars(description = "ID (UUID) of the playlist")]
    pub playlist_id: String,
    #[schemars(description = "IDs of the tracks to remove")]
    pub track_ids: Option<Vec<ItemId>>,
    #[schemars(description = "0-based positions of the entries to remove")]
    pub indices: Option<Vec<usize>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdatePlaylistParams {
    #[schemars(description = "ID (UUID) of the playlist")]
    pub playlist_id: String,
    #[schemars(description = "New name")]
    pub name: Option<String>,
    #[schemars(description = "New description")]
    pub description: Option<String>,
}

fn required(value: &str, key: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(Error::ValidationError(format!("{key} is required")));
    }
    Ok(value.to_string())
}

fn parse_ids(ids: &[ItemId], key: &str) -> Result<Vec<u64>> {
    ids.iter().map(|id| id.parse(key)).collect()
}

// Out of range limits are clamped rather than rejected
fn clamp_limit(limit: Option<i64>, default: usize, max: usize) -> usize {
    match limit {
        None => default,
        Some(limit) => usize::try_from(limit.max(1)).map_or(max, |limit| limit.min(max)),
    }
}

// Keep the first occurrence of every id
fn dedup_ids(ids: Vec<u64>) -> Vec<u64> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

// =============================================================================
// Results
// =============================================================================

/// JSON body of a failed tool call
pub fn error_payload(error: &Error) -> Value {
    json!({
        "status": "error",
        "error": error.kind(),
        "message": error.to_string(),
    })
}

// Tool failures are reported as error results, never as protocol errors
fn respond<T: Serialize>(tool: &str, result: Result<T>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(value) => {
            let text = serde_json::to_string(&value)
                .map_err(|e| McpError::internal_error(e.to_string(), None))?;
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
        Err(e) => {
            warn!("Tool {tool} failed: {e}");
            Ok(CallToolResult::error(vec![Content::text(
                error_payload(&e).to_string(),
            )]))
        }
    }
}

// =============================================================================
// Tools
// =============================================================================

/// The MCP tools, all sharing one TIDAL client and one login flow
#[derive(Clone)]
pub struct TidalTools {
    api: Arc<dyn TidalApi>,
    auth: Arc<Authenticator>,
    pub(super) tool_router: ToolRouter<Self>,
}

impl TidalTools {
    /// Every tool this server offers, as listed to clients
    pub fn definitions(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    // Every tool except login needs a live session
    async fn authenticated<T, F>(&self, tool: &str, call: F) -> Result<CallToolResult, McpError>
    where
        T: Serialize,
        F: Future<Output = Result<T>>,
    {
        debug!("Calling tool {tool}");
        let result = match self.auth.ensure_authenticated().await {
            Ok(()) => call.await,
            Err(e) => Err(e),
        };
        respond(tool, result)
    }

    async fn playlist(&self, playlist_id: &str) -> Result<Playlist> {
        let playlist_id = check_playlist_id(playlist_id)?;
        Ok(Playlist::from(self.api.playlist(playlist_id).await?))
    }

    async fn artist(&self, artist_id: &ItemId) -> Result<(u64, Artist)> {
        let artist_id = artist_id.parse("artist_id")?;
        Ok((artist_id, Artist::from(self.api.artist(artist_id).await?)))
    }

    // Removing something that is not a favorite is a successful no-op
    fn removed(result: Result<()>, item_type: ItemType, id: u64) -> Result<FavoriteResult> {
        let changed = match result {
            Ok(()) => true,
            Err(Error::NotFound(reason)) => {
                debug!("{item_type:?} {id} was not a favorite: {reason}");
                false
            }
            Err(e) => return Err(e),
        };
        Ok(FavoriteResult::removed(item_type, &id.to_string(), changed))
    }
}

#[tool_router(vis = "pub(crate)")]
impl TidalTools {
    pub fn new(api: Arc<dyn TidalApi>, auth: Arc<Authenticator>) -> Self {
        TidalTools {
            api,
            auth,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Authenticate with TIDAL using the OAuth browser flow. Opens the browser for login; the session is persisted for future use.",
        annotations(title = "Authenticate with TIDAL", open_world_hint = true)
    )]
    pub async fn login(&self) -> Result<CallToolResult, McpError> {
        debug!("Calling tool login");
        let result = self.auth.login().await.map(|outcome| {
            AuthResult::new(match outcome {
                LoginOutcome::AlreadyAuthenticated => "Already authenticated with TIDAL",
                LoginOutcome::LoggedIn => "Successfully authenticated with TIDAL",
            })
        });
        respond("login", result)
    }

    // Search

    #[tool(
        description = "Search for tracks on TIDAL by artist name, song title, or both. Returns id, title, artist, album, duration and URL for each match.",
        annotations(title = "Search tracks", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn search_tracks(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("search_tracks", async move {
            let query = required(&params.query, "query")?;
            let limit = clamp_limit(params.limit, 10, 50);
            let tracks = self.api.search_tracks(&query, limit).await?;
            Ok(tracks
                .into_iter()
                .map(Track::from)
                .collect::<TrackList>()
                .with_query(&query))
        })
        .await
    }

    #[tool(
        description = "Search for albums on TIDAL by album name, artist name, or both.",
        annotations(title = "Search albums", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn search_albums(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("search_albums", async move {
            let query = required(&params.query, "query")?;
            let limit = clamp_limit(params.limit, 10, 50);
            let albums = self.api.search_albums(&query, limit).await?;
            Ok(albums
                .into_iter()
                .map(Album::from)
                .collect::<AlbumList>()
                .with_query(&query))
        })
        .await
    }

    #[tool(
        description = "Search for artists on TIDAL by name.",
        annotations(title = "Search artists", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn search_artists(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("search_artists", async move {
            let query = required(&params.query, "query")?;
            let limit = clamp_limit(params.limit, 10, 50);
            let artists = self.api.search_artists(&query, limit).await?;
            Ok(artists
                .into_iter()
                .map(Artist::from)
                .collect::<ArtistList>()
                .with_query(&query))
        })
        .await
    }

    #[tool(
        description = "Search for public playlists on TIDAL by name or theme.",
        annotations(title = "Search playlists", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn search_playlists(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("search_playlists", async move {
            let query = required(&params.query, "query")?;
            let limit = clamp_limit(params.limit, 10, 50);
            let playlists = self.api.search_playlists(&query, limit).await?;
            Ok(playlists
                .into_iter()
                .map(Playlist::from)
                .collect::<PlaylistList>()
                .with_query(&query))
        })
        .await
    }

    // Favorites

    #[tool(
        description = "Get the user's favorite (liked) tracks, newest first.",
        annotations(title = "Favorite tracks", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn get_favorite_tracks(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("get_favorite_tracks", async move {
            let limit = clamp_limit(params.limit, 50, 1000);
            let tracks = self.api.favorite_tracks(limit).await?;
            Ok(tracks.into_iter().map(Track::from).collect::<TrackList>())
        })
        .await
    }

    #[tool(
        description = "Get the user's favorite (saved) albums.",
        annotations(title = "Favorite albums", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn get_favorite_albums(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("get_favorite_albums", async move {
            let limit = clamp_limit(params.limit, 50, 1000);
            let albums = self.api.favorite_albums(limit).await?;
            Ok(albums.into_iter().map(Album::from).collect::<AlbumList>())
        })
        .await
    }

    #[tool(
        description = "Get the user's favorite (followed) artists.",
        annotations(title = "Favorite artists", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn get_favorite_artists(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("get_favorite_artists", async move {
            let limit = clamp_limit(params.limit, 50, 1000);
            let artists = self.api.favorite_artists(limit).await?;
            Ok(artists.into_iter().map(Artist::from).collect::<ArtistList>())
        })
        .await
    }

    #[tool(
        description = "Add a track to the user's favorites (like a track).",
        annotations(
            title = "Like a track",
            idempotent_hint = true,
            open_world_hint = true
        )
    )]
    pub async fn add_track_to_favorites(
        &self,
        Parameters(params): Parameters<TrackParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("add_track_to_favorites", async move {
            let track_id = params.track_id.parse("track_id")?;
            self.api.add_favorite_track(track_id).await?;
            Ok(FavoriteResult::added(ItemType::Track, &track_id.to_string()))
        })
        .await
    }

    #[tool(
        description = "Remove a track from the user's favorites. Succeeds when the track was not a favorite.",
        annotations(
            title = "Unlike a track",
            destructive_hint = true,
            idempotent_hint = true,
            open_world_hint = true
        )
    )]
    pub async fn remove_track_from_favorites(
        &self,
        Parameters(params): Parameters<TrackParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("remove_track_from_favorites", async move {
            let track_id = params.track_id.parse("track_id")?;
            let result = self.api.remove_favorite_track(track_id).await;
            Self::removed(result, ItemType::Track, track_id)
        })
        .await
    }

    #[tool(
        description = "Remove an album from the user's favorites. Succeeds when the album was not a favorite.",
        annotations(
            title = "Remove album from favorites",
            destructive_hint = true,
            idempotent_hint = true,
            open_world_hint = true
        )
    )]
    pub async fn remove_album_from_favorites(
        &self,
        Parameters(params): Parameters<AlbumParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("remove_album_from_favorites", async move {
            let album_id = params.album_id.parse("album_id")?;
            let result = self.api.remove_favorite_album(album_id).await;
            Self::removed(result, ItemType::Album, album_id)
        })
        .await
    }

    // Playlists

    #[tool(
        description = "List the user's own playlists.",
        annotations(title = "My playlists", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn get_user_playlists(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("get_user_playlists", async move {
            let limit = clamp_limit(params.limit, 50, 1000);
            let playlists = self.api.user_playlists(limit).await?;
            Ok(playlists
                .into_iter()
                .map(Playlist::from)
                .collect::<PlaylistList>())
        })
        .await
    }

    #[tool(
        description = "Get the tracks of a playlist in playlist order.",
        annotations(title = "Playlist tracks", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn get_playlist_tracks(
        &self,
        Parameters(params): Parameters<PlaylistTracksParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("get_playlist_tracks", async move {
            let limit = clamp_limit(params.limit, 100, 10_000);
            let playlist = self.playlist(&params.playlist_id).await?;
            let tracks = self.api.playlist_tracks(&playlist.id, limit).await?;
            Ok(PlaylistTracks::new(
                &playlist,
                tracks.into_iter().map(Track::from).collect(),
            ))
        })
        .await
    }

    #[tool(
        description = "Create a new playlist in the user's account.",
        annotations(title = "Create playlist", open_world_hint = true)
    )]
    pub async fn create_playlist(
        &self,
        Parameters(params): Parameters<CreatePlaylistParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("create_playlist", async move {
            let name = required(&params.name, "name")?;
            let description = params.description.unwrap_or_default();
            let created = self.api.create_playlist(&name, &description).await?;
            Ok(CreatePlaylistResult::new(Playlist::from(created)))
        })
        .await
    }

    #[tool(
        description = "Add tracks to an existing playlist. Tracks already in the playlist are not added twice.",
        annotations(
            title = "Add tracks to playlist",
            idempotent_hint = true,
            open_world_hint = true
        )
    )]
    pub async fn add_tracks_to_playlist(
        &self,
        Parameters(params): Parameters<AddTracksParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("add_tracks_to_playlist", async move {
            let track_ids = parse_ids(&params.track_ids, "track_ids")?;
            if track_ids.is_empty() {
                return Err(Error::ValidationError("track_ids must not be empty".into()));
            }
            let playlist = self.playlist(&params.playlist_id).await?;
            let added = self
                .api
                .add_playlist_tracks(&playlist.id, &dedup_ids(track_ids))
                .await?;
            Ok(AddTracksResult::new(&playlist, added))
        })
        .await
    }

    #[tool(
        description = "Remove tracks from a playlist, either by track id or by 0-based position. Provide track_ids or indices, not both. Tracks that are not in the playlist are ignored.",
        annotations(
            title = "Remove tracks from playlist",
            destructive_hint = true,
            idempotent_hint = true,
            open_world_hint = true
        )
    )]
    pub async fn remove_tracks_from_playlist(
        &self,
        Parameters(params): Parameters<RemoveTracksParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("remove_tracks_from_playlist", async move {
            let track_ids = params
                .track_ids
                .as_deref()
                .map(|ids| parse_ids(ids, "track_ids"))
                .transpose()?
                .filter(|ids| !ids.is_empty());
            let indices = params.indices.filter(|indices| !indices.is_empty());
            let selection = match (track_ids, indices) {
                (Some(ids), None) => TrackSelection::ById(ids),
                (None, Some(indices)) => TrackSelection::ByIndex(indices),
                (None, None) => {
                    return Err(Error::ValidationError(
                        "Must provide either track_ids or indices to remove".into(),
                    ));
                }
                (Some(_), Some(_)) => {
                    return Err(Error::ValidationError(
                        "Provide either track_ids or indices, not both".into(),
                    ));
                }
            };
            let playlist = self.playlist(&params.playlist_id).await?;
            let removed = self
                .api
                .remove_playlist_tracks(&playlist.id, &selection)
                .await?;
            Ok(RemoveTracksResult::new(&playlist, removed))
        })
        .await
    }

    #[tool(
        description = "Update a playlist's name and/or description.",
        annotations(title = "Update playlist", idempotent_hint = true, open_world_hint = true)
    )]
    pub async fn update_playlist(
        &self,
        Parameters(params): Parameters<UpdatePlaylistParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("update_playlist", async move {
            let name = params.name.filter(|name| !name.trim().is_empty());
            let description = params.description;
            if name.is_none() && description.is_none() {
                return Err(Error::ValidationError(
                    "Must provide at least name or description to update".into(),
                ));
            }

            let playlist = self.playlist(&params.playlist_id).await?;
            let title = name.or_else(|| playlist.name.clone()).unwrap_or_default();
            let description = description
                .or_else(|| playlist.description.clone())
                .unwrap_or_default();
            self.api
                .edit_playlist(&playlist.id, &title, &description)
                .await?;

            let updated = self.api.playlist(&playlist.id).await?;
            Ok(UpdatePlaylistResult::new(Playlist::from(updated)))
        })
        .await
    }

    #[tool(
        description = "Delete a playlist from the user's account.",
        annotations(title = "Delete playlist", destructive_hint = true, open_world_hint = true)
    )]
    pub async fn delete_playlist(
        &self,
        Parameters(params): Parameters<PlaylistParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("delete_playlist", async move {
            let playlist = self.playlist(&params.playlist_id).await?;
            self.api.delete_playlist(&playlist.id).await?;
            Ok(DeletePlaylistResult::new(&playlist))
        })
        .await
    }

    // Albums

    #[tool(
        description = "Get details about an album.",
        annotations(title = "Album details", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn get_album(
        &self,
        Parameters(params): Parameters<AlbumParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("get_album", async move {
            let album_id = params.album_id.parse("album_id")?;
            let album = Album::from(self.api.album(album_id).await?);
            Ok(AlbumDetails::new(album))
        })
        .await
    }

    #[tool(
        description = "Get all tracks of an album.",
        annotations(title = "Album tracks", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn get_album_tracks(
        &self,
        Parameters(params): Parameters<AlbumParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("get_album_tracks", async move {
            let album_id = params.album_id.parse("album_id")?;
            let album = Album::from(self.api.album(album_id).await?);
            let tracks = self.api.album_tracks(album_id).await?;
            Ok(AlbumTracks::new(
                &album,
                tracks
                    .into_iter()
                    .map(|t| Track::from(t).with_album(&album))
                    .collect(),
            ))
        })
        .await
    }

    #[tool(
        description = "Get albums similar to an album.",
        annotations(title = "Similar albums", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn get_similar_albums(
        &self,
        Parameters(params): Parameters<SimilarAlbumsParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("get_similar_albums", async move {
            let album_id = params.album_id.parse("album_id")?;
            let limit = clamp_limit(params.limit, 10, 50);
            self.api.album(album_id).await?;
            let similar = self.api.similar_albums(album_id).await?;
            Ok(similar
                .into_iter()
                .take(limit)
                .map(Album::from)
                .collect::<AlbumList>())
        })
        .await
    }

    // Artists

    #[tool(
        description = "Get details about an artist, including the biography when available.",
        annotations(title = "Artist details", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn get_artist(
        &self,
        Parameters(params): Parameters<ArtistParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("get_artist", async move {
            let (artist_id, artist) = self.artist(&params.artist_id).await?;
            // A missing biography does not fail the lookup
            let bio = match self.api.artist_bio(artist_id).await {
                Ok(bio) => bio,
                Err(e) => {
                    debug!("No biography for artist {artist_id}: {e}");
                    None
                }
            };
            Ok(ArtistDetails::new(artist, bio))
        })
        .await
    }

    #[tool(
        description = "Get albums by an artist (discography).",
        annotations(title = "Artist albums", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn get_artist_albums(
        &self,
        Parameters(params): Parameters<ArtistListParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("get_artist_albums", async move {
            let limit = clamp_limit(params.limit, 20, 50);
            let (artist_id, artist) = self.artist(&params.artist_id).await?;
            let albums = self.api.artist_albums(artist_id, limit).await?;
            Ok(albums
                .into_iter()
                .map(|a| Album::from(a).with_artist_fallback(artist.name.as_deref()))
                .collect::<AlbumList>())
        })
        .await
    }

    #[tool(
        description = "Get an artist's most popular tracks.",
        annotations(title = "Artist top tracks", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn get_artist_top_tracks(
        &self,
        Parameters(params): Parameters<ArtistListParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("get_artist_top_tracks", async move {
            let limit = clamp_limit(params.limit, 10, 50);
            let (artist_id, artist) = self.artist(&params.artist_id).await?;
            let tracks = self.api.artist_top_tracks(artist_id, limit).await?;
            Ok(tracks
                .into_iter()
                .map(|t| Track::from(t).with_artist_fallback(artist.name.as_deref()))
                .collect::<TrackList>())
        })
        .await
    }

    #[tool(
        description = "Get artists similar to an artist.",
        annotations(title = "Similar artists", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn get_similar_artists(
        &self,
        Parameters(params): Parameters<ArtistListParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("get_similar_artists", async move {
            let limit = clamp_limit(params.limit, 10, 50);
            let (artist_id, _) = self.artist(&params.artist_id).await?;
            let similar = self.api.similar_artists(artist_id).await?;
            Ok(similar
                .into_iter()
                .take(limit)
                .map(Artist::from)
                .collect::<ArtistList>())
        })
        .await
    }

    // Recommendations

    #[tool(
        description = "Get TIDAL's recommendations of tracks similar to a seed track (track radio).",
        annotations(title = "Track radio", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn get_track_radio(
        &self,
        Parameters(params): Parameters<TrackRadioParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("get_track_radio", async move {
            let track_id = params.track_id.parse("track_id")?;
            let limit = clamp_limit(params.limit, 20, 100);
            let seed = Track::from(self.api.track(track_id).await?);
            let tracks = self.api.track_radio(track_id, limit).await?;
            Ok(RadioTracks::from_track(
                &seed,
                tracks.into_iter().map(Track::from).collect(),
            ))
        })
        .await
    }

    #[tool(
        description = "Get TIDAL's recommendations of tracks in the style of an artist (artist radio).",
        annotations(title = "Artist radio", read_only_hint = true, open_world_hint = true)
    )]
    pub async fn get_artist_radio(
        &self,
        Parameters(params): Parameters<ArtistListParams>,
    ) -> Result<CallToolResult, McpError> {
        self.authenticated("get_artist_radio", async move {
            let limit = clamp_limit(params.limit, 20, 100);
            let (artist_id, artist) = self.artist(&params.artist_id).await?;
            let tracks = self.api.artist_radio(artist_id, limit).await?;
            Ok(RadioTracks::from_artist(
                &artist,
                tracks.into_iter().map(Track::from).collect(),
            ))
        })
        .await
    }
}

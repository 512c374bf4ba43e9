/// Wire models of the TIDAL v1 API
pub mod models;

use async_trait::async_trait;
use futures::stream::{self, TryStreamExt};
use log::{debug, warn};
use reqwest::header::{AUTHORIZATION, ETAG, IF_NONE_MATCH};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::clients::api::{DevicePoll, TidalApi, TrackSelection, check_playlist_id};
use crate::clients::errors::{Error, Result};
use crate::clients::session_store::{Session, SessionStore, unix_now};
use crate::config::Config;
use models::{
    ApiAlbum, ApiArtist, ApiErrorBody, ApiPlaylist, ApiTrack, ArtistBio, DeviceAuthorization,
    FavoriteItem, OAuthErrorBody, Page, PlaylistItem, SearchResponse, SessionInfo, TokenResponse,
};

const SCOPE: &str = "r_usr w_usr w_sub";
const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const PAGE_SIZE: usize = 100;
// Upper bound used when a whole listing is needed (TIDAL caps playlists at 10k items)
const MAX_ITEMS: usize = 10_000;

#[derive(Clone, Copy)]
enum SearchType {
    Tracks,
    Albums,
    Artists,
    Playlists,
}

impl SearchType {
    fn as_str(self) -> &'static str {
        match self {
            SearchType::Tracks => "TRACKS",
            SearchType::Albums => "ALBUMS",
            SearchType::Artists => "ARTISTS",
            SearchType::Playlists => "PLAYLISTS",
        }
    }
}

/// `TidalApi` implementation backed by the TIDAL v1 REST API
pub struct TidalClient {
    http: reqwest::Client,
    config: Config,
    session: RwLock<Option<Session>>,
    // Refreshed tokens are written back here when set
    store: Option<SessionStore>,
}

impl TidalClient {
    pub fn new(config: Config) -> Self {
        TidalClient {
            http: reqwest::Client::new(),
            config,
            session: RwLock::new(None),
            store: None,
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url, path.trim_start_matches('/'))
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.auth_url, path.trim_start_matches('/'))
    }

    async fn current_session(&self) -> Result<Session> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(Error::NotAuthenticated)
    }

    fn authorized<F>(&self, build: &F, session: &Session) -> RequestBuilder
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let country = session
            .country_code
            .as_deref()
            .unwrap_or(&self.config.country_code);
        build(&self.http)
            .header(AUTHORIZATION, session.authorization_header())
            .query(&[("countryCode", country)])
    }

    // Send an authorized request, refreshing the access token once if TIDAL rejects it
    async fn execute<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder + Send + Sync,
    {
        let mut session = self.current_session().await?;
        if session.is_expired() && session.refresh_token.is_some() {
            debug!("TIDAL access token expired, refreshing ...");
            session = self.refresh(&session).await?;
        }

        let response = self.authorized(&build, &session).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED && session.refresh_token.is_some() {
            debug!("TIDAL rejected the access token, refreshing ...");
            let session = self.refresh(&session).await?;
            let response = self.authorized(&build, &session).send().await?;
            return check_status(response).await;
        }
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.api_url(path);
        debug!("GET {url} {query:?}");
        let response = self.execute(|http| http.get(&url).query(query)).await?;
        read_json(response).await
    }

    // Fetch a paginated listing page by page until `limit` items are collected
    async fn fetch_pages<P>(&self, path: &str, extra: &[(&str, String)], limit: usize) -> Result<Vec<P>>
    where
        P: DeserializeOwned + Send,
    {
        let pages = stream::try_unfold(0usize, move |offset| async move {
            if offset >= limit {
                return Ok::<_, Error>(None);
            }
            let page_size = PAGE_SIZE.min(limit - offset);
            let mut query = vec![
                ("limit", page_size.to_string()),
                ("offset", offset.to_string()),
            ];
            query.extend(extra.iter().cloned());
            let page: Page<P> = self.get_json(path, &query).await?;

            let fetched = page.items.len();
            let exhausted = fetched < page_size
                || page
                    .total_number_of_items
                    .is_some_and(|total| offset + fetched >= total);
            let next = if exhausted { limit } else { offset + fetched };
            Ok(Some((page.items, next)))
        });

        let pages: Vec<Vec<P>> = pages.try_collect().await?;
        Ok(pages.into_iter().flatten().take(limit).collect())
    }

    async fn search(&self, query: &str, kind: SearchType, limit: usize) -> Result<SearchResponse> {
        self.get_json(
            "search",
            &[
                ("query", query.to_string()),
                ("types", kind.as_str().to_string()),
                ("limit", limit.to_string()),
                ("offset", "0".to_string()),
            ],
        )
        .await
    }

    async fn user_id(&self) -> Result<u64> {
        if let Some(id) = self.current_session().await?.user_id {
            return Ok(id);
        }
        let info = self.session_info().await?;
        info.user_id.ok_or_else(|| {
            Error::RemoteError("TIDAL did not report a user id for this session".into())
        })
    }

    // Reads `/sessions` and records the user id and country on the installed session
    async fn session_info(&self) -> Result<SessionInfo> {
        let info: SessionInfo = self.get_json("sessions", &[]).await?;
        if let Some(session) = self.session.write().await.as_mut() {
            if info.user_id.is_some() {
                session.user_id = info.user_id;
            }
            if info.country_code.is_some() {
                session.country_code.clone_from(&info.country_code);
            }
        }
        Ok(info)
    }

    async fn favorites<T>(&self, kind: &str, limit: usize) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        let user_id = self.user_id().await?;
        let items: Vec<FavoriteItem<T>> = self
            .fetch_pages(
                &format!("users/{user_id}/favorites/{kind}"),
                &[
                    ("order", "DATE".to_string()),
                    ("orderDirection", "DESC".to_string()),
                ],
                limit,
            )
            .await?;
        Ok(items.into_iter().map(|f| f.item).collect())
    }

    async fn playlist_items(&self, playlist_id: &str, limit: usize) -> Result<Vec<PlaylistItem>> {
        self.fetch_pages(&format!("{}/items", playlist_path(playlist_id)?), &[], limit)
            .await
    }

    // Playlist mutations must carry the current ETag
    async fn playlist_etag(&self, playlist_id: &str) -> Result<Option<String>> {
        let url = self.api_url(&playlist_path(playlist_id)?);
        let response = self.execute(|http| http.get(&url)).await?;
        Ok(response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }

    async fn refresh(&self, session: &Session) -> Result<Session> {
        let Some(refresh_token) = session.refresh_token.as_deref() else {
            return Err(Error::NotAuthenticated);
        };
        let response = self
            .http
            .post(self.auth_url("token"))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", SCOPE),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body: OAuthErrorBody = response.json().await.unwrap_or_default();
            debug!("TIDAL token refresh failed with {status}: {body:?}");
            self.session.write().await.take();
            return Err(Error::NotAuthenticated);
        }

        let token: TokenResponse = read_json(response).await?;
        let mut refreshed = session_from_token(token);
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = Some(refresh_token.to_string());
        }
        refreshed.user_id = refreshed.user_id.or(session.user_id);
        if refreshed.country_code.is_none() {
            refreshed.country_code.clone_from(&session.country_code);
        }

        *self.session.write().await = Some(refreshed.clone());
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&refreshed).await {
                warn!("Failed to persist refreshed TIDAL session: {e}");
            }
        }
        debug!("Refreshed TIDAL access token");
        Ok(refreshed)
    }
}

fn playlist_path(playlist_id: &str) -> Result<String> {
    Ok(format!("playlists/{}", check_playlist_id(playlist_id)?))
}

fn session_from_token(token: TokenResponse) -> Session {
    let (user_id, country_code) = match token.user {
        Some(user) => (user.user_id.or(token.user_id), user.country_code),
        None => (token.user_id, None),
    };
    Session {
        token_type: token.token_type,
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at: token.expires_in.map(|secs| unix_now() + secs),
        user_id,
        country_code,
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let path = response.url().path().to_string();
    let body: ApiErrorBody = response.json().await.unwrap_or_default();
    let message = body
        .user_message
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
    debug!("TIDAL returned {status} for {path}: {message} ({:?})", body.sub_status);

    match status {
        StatusCode::NOT_FOUND => Err(Error::NotFound(format!("{path}: {message}"))),
        StatusCode::UNAUTHORIZED => Err(Error::NotAuthenticated),
        StatusCode::TOO_MANY_REQUESTS => {
            Err(Error::RemoteError(format!("rate limited by TIDAL: {message}")))
        }
        _ => Err(Error::RemoteError(format!("{status} on {path}: {message}"))),
    }
}

#[async_trait]
impl TidalApi for TidalClient {
    async fn set_session(&self, session: Option<Session>) {
        *self.session.write().await = session;
    }

    async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    async fn check_login(&self) -> Result<bool> {
        match self.session_info().await {
            Ok(_) => Ok(true),
            Err(Error::NotAuthenticated) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn start_device_authorization(&self) -> Result<DeviceAuthorization> {
        debug!("Requesting TIDAL device authorization ...");
        let response = self
            .http
            .post(self.auth_url("device_authorization"))
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("scope", SCOPE),
            ])
            .send()
            .await?;
        let response = check_status(response).await?;
        read_json(response).await
    }

    async fn poll_device_authorization(&self, device_code: &str) -> Result<DevicePoll> {
        let response = self
            .http
            .post(self.auth_url("token"))
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("device_code", device_code),
                ("grant_type", DEVICE_CODE_GRANT),
                ("scope", SCOPE),
            ])
            .send()
            .await?;

        if response.status().is_success() {
            let token: TokenResponse = read_json(response).await?;
            return Ok(DevicePoll::Granted(session_from_token(token)));
        }

        let status = response.status();
        let body: OAuthErrorBody = response.json().await.unwrap_or_default();
        let description = body
            .error_description
            .clone()
            .unwrap_or_else(|| status.to_string());
        match body.error.as_deref() {
            Some("authorization_pending") => Ok(DevicePoll::Pending),
            Some("slow_down") => Ok(DevicePoll::SlowDown),
            Some("expired_token") => Ok(DevicePoll::Expired),
            Some("access_denied") => Ok(DevicePoll::Denied(description)),
            _ => Err(Error::RemoteError(format!(
                "device authorization failed: {description}"
            ))),
        }
    }

    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<ApiTrack>> {
        let results = self.search(query, SearchType::Tracks, limit).await?;
        Ok(results.tracks.map(|p| p.items).unwrap_or_default())
    }

    async fn search_albums(&self, query: &str, limit: usize) -> Result<Vec<ApiAlbum>> {
        let results = self.search(query, SearchType::Albums, limit).await?;
        Ok(results.albums.map(|p| p.items).unwrap_or_default())
    }

    async fn search_artists(&self, query: &str, limit: usize) -> Result<Vec<ApiArtist>> {
        let results = self.search(query, SearchType::Artists, limit).await?;
        Ok(results.artists.map(|p| p.items).unwrap_or_default())
    }

    async fn search_playlists(&self, query: &str, limit: usize) -> Result<Vec<ApiPlaylist>> {
        let results = self.search(query, SearchType::Playlists, limit).await?;
        Ok(results.playlists.map(|p| p.items).unwrap_or_default())
    }

    async fn favorite_tracks(&self, limit: usize) -> Result<Vec<ApiTrack>> {
        self.favorites("tracks", limit).await
    }

    async fn favorite_albums(&self, limit: usize) -> Result<Vec<ApiAlbum>> {
        self.favorites("albums", limit).await
    }

    async fn favorite_artists(&self, limit: usize) -> Result<Vec<ApiArtist>> {
        self.favorites("artists", limit).await
    }

    async fn add_favorite_track(&self, track_id: u64) -> Result<()> {
        let user_id = self.user_id().await?;
        let url = self.api_url(&format!("users/{user_id}/favorites/tracks"));
        let track_ids = track_id.to_string();
        debug!("POST {url} trackIds={track_ids}");
        self.execute(|http| http.post(&url).form(&[("trackIds", track_ids.as_str())]))
            .await?;
        Ok(())
    }

    async fn remove_favorite_track(&self, track_id: u64) -> Result<()> {
        let user_id = self.user_id().await?;
        let url = self.api_url(&format!("users/{user_id}/favorites/tracks/{track_id}"));
        debug!("DELETE {url}");
        self.execute(|http| http.delete(&url)).await?;
        Ok(())
    }

    async fn remove_favorite_album(&self, album_id: u64) -> Result<()> {
        let user_id = self.user_id().await?;
        let url = self.api_url(&format!("users/{user_id}/favorites/albums/{album_id}"));
        debug!("DELETE {url}");
        self.execute(|http| http.delete(&url)).await?;
        Ok(())
    }

    async fn user_playlists(&self, limit: usize) -> Result<Vec<ApiPlaylist>> {
        let user_id = self.user_id().await?;
        self.fetch_pages(&format!("users/{user_id}/playlists"), &[], limit)
            .await
    }

    async fn playlist(&self, playlist_id: &str) -> Result<ApiPlaylist> {
        self.get_json(&playlist_path(playlist_id)?, &[]).await
    }

    async fn playlist_tracks(&self, playlist_id: &str, limit: usize) -> Result<Vec<ApiTrack>> {
        let items = self.playlist_items(playlist_id, limit).await?;
        Ok(items
            .into_iter()
            .filter(PlaylistItem::is_track)
            .map(|i| i.item)
            .collect())
    }

    async fn create_playlist(&self, title: &str, description: &str) -> Result<ApiPlaylist> {
        let user_id = self.user_id().await?;
        let url = self.api_url(&format!("users/{user_id}/playlists"));
        debug!("POST {url} title={title:?}");
        let response = self
            .execute(|http| {
                http.post(&url)
                    .form(&[("title", title), ("description", description)])
            })
            .await?;
        read_json(response).await
    }

    async fn add_playlist_tracks(&self, playlist_id: &str, track_ids: &[u64]) -> Result<usize> {
        let etag = self.playlist_etag(playlist_id).await?;
        let url = self.api_url(&format!("{}/items", playlist_path(playlist_id)?));
        let joined = join_ids(track_ids);
        debug!("POST {url} trackIds={joined}");
        let response = self
            .execute(|http| {
                let request = http.post(&url).form(&[
                    ("trackIds", joined.as_str()),
                    ("onDupes", "SKIP"),
                    ("onArtifactNotFound", "FAIL"),
                ]);
                match &etag {
                    Some(etag) => request.header(IF_NONE_MATCH, etag),
                    None => request,
                }
            })
            .await?;

        // Newer API versions report the ids that were actually added
        let body: serde_json::Value = read_json(response).await.unwrap_or_default();
        Ok(body
            .get("addedItemIds")
            .and_then(serde_json::Value::as_array)
            .map_or(track_ids.len(), Vec::len))
    }

    async fn remove_playlist_tracks(
        &self,
        playlist_id: &str,
        selection: &TrackSelection,
    ) -> Result<usize> {
        let mut indices = match selection {
            TrackSelection::ByIndex(indices) => indices.clone(),
            TrackSelection::ById(ids) => self
                .playlist_items(playlist_id, MAX_ITEMS)
                .await?
                .iter()
                .enumerate()
                .filter(|(_, i)| i.is_track() && ids.contains(&i.item.id))
                .map(|(index, _)| index)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        if indices.is_empty() {
            return Ok(0);
        }

        let etag = self.playlist_etag(playlist_id).await?;
        let joined = indices
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = self.api_url(&format!("{}/items/{joined}", playlist_path(playlist_id)?));
        debug!("DELETE {url}");
        self.execute(|http| {
            let request = http.delete(&url);
            match &etag {
                Some(etag) => request.header(IF_NONE_MATCH, etag),
                None => request,
            }
        })
        .await?;
        Ok(indices.len())
    }

    async fn edit_playlist(&self, playlist_id: &str, title: &str, description: &str) -> Result<()> {
        let etag = self.playlist_etag(playlist_id).await?;
        let url = self.api_url(&playlist_path(playlist_id)?);
        debug!("POST {url} title={title:?}");
        self.execute(|http| {
            let request = http
                .post(&url)
                .form(&[("title", title), ("description", description)]);
            match &etag {
                Some(etag) => request.header(IF_NONE_MATCH, etag),
                None => request,
            }
        })
        .await?;
        Ok(())
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<()> {
        let url = self.api_url(&playlist_path(playlist_id)?);
        debug!("DELETE {url}");
        self.execute(|http| http.delete(&url)).await?;
        Ok(())
    }

    async fn album(&self, album_id: u64) -> Result<ApiAlbum> {
        self.get_json(&format!("albums/{album_id}"), &[]).await
    }

    async fn album_tracks(&self, album_id: u64) -> Result<Vec<ApiTrack>> {
        self.fetch_pages(&format!("albums/{album_id}/tracks"), &[], MAX_ITEMS)
            .await
    }

    async fn similar_albums(&self, album_id: u64) -> Result<Vec<ApiAlbum>> {
        let page: Page<ApiAlbum> = self
            .get_json(&format!("albums/{album_id}/similar"), &[])
            .await?;
        Ok(page.items)
    }

    async fn track(&self, track_id: u64) -> Result<ApiTrack> {
        self.get_json(&format!("tracks/{track_id}"), &[]).await
    }

    async fn track_radio(&self, track_id: u64, limit: usize) -> Result<Vec<ApiTrack>> {
        let page: Page<ApiTrack> = self
            .get_json(
                &format!("tracks/{track_id}/radio"),
                &[("limit", limit.to_string())],
            )
            .await?;
        Ok(page.items)
    }

    async fn artist(&self, artist_id: u64) -> Result<ApiArtist> {
        self.get_json(&format!("artists/{artist_id}"), &[]).await
    }

    async fn artist_bio(&self, artist_id: u64) -> Result<Option<String>> {
        match self
            .get_json::<ArtistBio>(&format!("artists/{artist_id}/bio"), &[])
            .await
        {
            Ok(bio) => Ok(bio.text.filter(|t| !t.is_empty())),
            // Many artists have no biography
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn artist_albums(&self, artist_id: u64, limit: usize) -> Result<Vec<ApiAlbum>> {
        self.fetch_pages(&format!("artists/{artist_id}/albums"), &[], limit)
            .await
    }

    async fn artist_top_tracks(&self, artist_id: u64, limit: usize) -> Result<Vec<ApiTrack>> {
        self.fetch_pages(&format!("artists/{artist_id}/toptracks"), &[], limit)
            .await
    }

    async fn similar_artists(&self, artist_id: u64) -> Result<Vec<ApiArtist>> {
        let page: Page<ApiArtist> = self
            .get_json(&format!("artists/{artist_id}/similar"), &[])
            .await?;
        Ok(page.items)
    }

    async fn artist_radio(&self, artist_id: u64, limit: usize) -> Result<Vec<ApiTrack>> {
        let page: Page<ApiTrack> = self
            .get_json(
                &format!("artists/{artist_id}/radio"),
                &[("limit", limit.to_string())],
            )
            .await?;
        Ok(page.items)
    }
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

//! MCP (Model Context Protocol) server exposing TIDAL to AI assistants
//!
//! Built on the rmcp SDK and served over stdio. Each request runs on its own
//! task, so a login waiting for the browser does not hold up other calls.

pub mod tools;

use log::{error, info};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{ServerHandler, ServiceExt, tool_handler, transport::stdio};

use crate::clients::errors::{Error, Result};
use tools::TidalTools;

const INSTRUCTIONS: &str = "MCP server for the TIDAL music streaming service.

## Authentication
- Use the 'login' tool first to authenticate through the TIDAL browser login
- The session is persisted and reused across restarts

## Search
- search_tracks, search_albums, search_artists, search_playlists

## Favorites
- get_favorite_tracks, get_favorite_albums, get_favorite_artists
- add_track_to_favorites, remove_track_from_favorites, remove_album_from_favorites

## Playlists
- get_user_playlists, get_playlist_tracks, create_playlist, add_tracks_to_playlist
- remove_tracks_from_playlist, update_playlist, delete_playlist

## Albums and artists
- get_album, get_album_tracks, get_similar_albums
- get_artist, get_artist_albums, get_artist_top_tracks, get_similar_artists

## Recommendations
- get_track_radio, get_artist_radio
";

#[tool_handler]
impl ServerHandler for TidalTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_instructions(INSTRUCTIONS)
    }
}

/// Run the MCP server over stdin/stdout until the client disconnects. Logs go to stderr.
pub async fn run_stdio_server(tools: TidalTools) -> Result<()> {
    info!("Starting MCP server (stdio mode)");
    let service = tools.serve(stdio()).await.map_err(|e| {
        error!("MCP initialization failed: {e}");
        Error::TransportError(e.to_string())
    })?;

    let reason = service.waiting().await.map_err(|e| {
        error!("MCP server error: {e}");
        Error::TransportError(e.to_string())
    })?;
    info!("MCP client disconnected ({reason:?}), shutting down");
    Ok(())
}

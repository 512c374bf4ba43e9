//! tidal-mcp - TIDAL music streaming exposed as MCP tools
//!
//! This library provides the TIDAL API client, the device login flow with a
//! persisted session, and an MCP server that lets AI assistants search the
//! catalog and manage favorites and playlists.

/// Client modules for the TIDAL API, authentication and session storage
pub mod clients;
/// Runtime configuration read from the environment
pub mod config;
/// MCP server: the TIDAL tools served with rmcp
pub mod mcp;

pub use config::Config;

/// TIDAL client abstraction used by the tools and the login flow
pub mod api;
/// OAuth device login and session lifecycle
pub mod auth;
/// Normalized records returned to MCP clients
pub mod entities;
/// Error types and result aliases
pub mod errors;
/// Session persistence on local disk
pub mod session_store;
/// TIDAL REST API client
pub mod tidal;

pub use api::TidalApi;
pub use auth::Authenticator;
pub use session_store::SessionStore;
pub use tidal::TidalClient;

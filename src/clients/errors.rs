use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not authenticated. Please run the 'login' tool first.")]
    NotAuthenticated,

    #[error("Authentication timed out before the browser login was completed")]
    AuthTimeout,

    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("TIDAL API error: {0}")]
    RemoteError(String),

    #[error("Invalid arguments: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Failed to parse TIDAL response: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("MCP transport error: {0}")]
    TransportError(String),
}

impl Error {
    /// Stable name of the error kind, reported to MCP clients in tool error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotAuthenticated => "not_authenticated",
            Error::AuthTimeout => "auth_timeout",
            Error::AuthRejected(_) => "auth_rejected",
            Error::NotFound(_) => "not_found",
            Error::RemoteError(_) | Error::HttpError(_) | Error::DeserializationError(_) => {
                "remote_error"
            }
            Error::ValidationError(_) => "validation_error",
            Error::ConfigurationError(_) => "configuration_error",
            Error::StorageError(_) => "io_error",
            Error::TransportError(_) => "transport_error",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::clients::errors::Result;

/// OAuth credentials for one TIDAL account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token_type: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds) after which the access token is no longer accepted
    #[serde(default)]
    pub expires_at: Option<u64>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub country_code: Option<String>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= unix_now())
    }

    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

// Persists the session between runs so the user does not have to log in every time.
// NOTE: single user application, one session file per profile.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    pub fn try_default() -> Self {
        SessionStore::new(Self::default_path())
    }

    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp")) // Fallback to /tmp if cache directory can't be determined
            .join("tidal-mcp")
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Missing or corrupt files are reported as no session, only IO failures are errors
    pub async fn load(&self) -> Result<Option<Session>> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored TIDAL session found in {:?}", self.path);
                return Ok(None);
            }
            Err(e) => {
                debug!("Failed to read TIDAL session from {:?}: {e}", self.path);
                return Err(e.into());
            }
        };

        match serde_json::from_slice::<Session>(&contents) {
            Ok(session) if !session.access_token.is_empty() => {
                debug!("Loaded TIDAL session from {:?}", self.path);
                Ok(Some(session))
            }
            Ok(_) => {
                warn!("Stored TIDAL session in {:?} has no access token, ignoring it", self.path);
                Ok(None)
            }
            Err(e) => {
                warn!("Stored TIDAL session in {:?} is corrupt ({e}), ignoring it", self.path);
                Ok(None)
            }
        }
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_vec_pretty(session)?;

        // The token is only ever on disk with owner-only permissions: write a fresh
        // file created as 0600, then move it over the old one
        let staging = self.path.with_extension("json.tmp");
        match tokio::fs::remove_file(&staging).await {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&staging).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&staging, &self.path).await?;
        debug!("Stored TIDAL session in {:?}", self.path);
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Removed TIDAL session file {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

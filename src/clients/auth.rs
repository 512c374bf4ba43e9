use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::clients::api::{DevicePoll, TidalApi};
use crate::clients::errors::{Error, Result};
use crate::clients::session_store::{Session, SessionStore};
use crate::clients::tidal::models::DeviceAuthorization;

const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    NotAuthenticated,
    AwaitingBrowserCallback {
        user_code: String,
        login_url: String,
        expires_in: u64,
    },
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    AlreadyAuthenticated,
    LoggedIn,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthStatus {
    #[serde(flatten)]
    pub state: AuthState,
    pub session_file: PathBuf,
}

/// Shows the device login link to the user, typically by opening a browser
pub trait LoginPrompt: Send + Sync {
    fn show(&self, authorization: &DeviceAuthorization) -> std::io::Result<()>;
}

/// Opens the login link in the system browser
pub struct BrowserPrompt;

impl LoginPrompt for BrowserPrompt {
    fn show(&self, authorization: &DeviceAuthorization) -> std::io::Result<()> {
        webbrowser::open(&authorization.login_url())
    }
}

/// Drives the TIDAL OAuth device login and keeps the client's session in sync with
/// the session file.
pub struct Authenticator {
    api: Arc<dyn TidalApi>,
    store: SessionStore,
    prompt: Box<dyn LoginPrompt>,
    timeout: Duration,
    state: Mutex<AuthState>,
    // Held for a whole login so concurrent calls never start a second device flow
    login_lock: Mutex<()>,
}

impl Authenticator {
    pub fn new(
        api: Arc<dyn TidalApi>,
        store: SessionStore,
        prompt: Box<dyn LoginPrompt>,
        timeout: Duration,
    ) -> Self {
        Authenticator {
            api,
            store,
            prompt,
            timeout,
            state: Mutex::new(AuthState::NotAuthenticated),
            login_lock: Mutex::new(()),
        }
    }

    async fn set_state(&self, state: AuthState) {
        debug!("Auth state -> {state:?}");
        *self.state.lock().await = state;
    }

    // A login waiting for the browser keeps its state until it finishes
    async fn reset_state(&self) {
        let mut state = self.state.lock().await;
        if !matches!(*state, AuthState::AwaitingBrowserCallback { .. }) {
            *state = AuthState::NotAuthenticated;
        }
    }

    pub async fn state(&self) -> AuthState {
        self.state.lock().await.clone()
    }

    pub async fn status(&self) -> AuthStatus {
        AuthStatus {
            state: self.state().await,
            session_file: self.store.path().to_path_buf(),
        }
    }

    // Make sure the client holds a valid session, restoring it from disk when needed.
    // Storage failures degrade to `NotAuthenticated` so the caller is asked to log in again.
    pub async fn ensure_authenticated(&self) -> Result<()> {
        if self.state().await == AuthState::Authenticated && self.api.session().await.is_some() {
            return Ok(());
        }

        let session = match self.store.load().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                self.reset_state().await;
                return Err(Error::NotAuthenticated);
            }
            Err(e) => {
                warn!("Could not read the stored TIDAL session: {e}");
                self.reset_state().await;
                return Err(Error::NotAuthenticated);
            }
        };

        self.api.set_session(Some(session)).await;
        match self.api.check_login().await {
            Ok(true) => {
                info!("Restored TIDAL session from {:?}", self.store.path());
                self.set_state(AuthState::Authenticated).await;
                Ok(())
            }
            Ok(false) => {
                warn!("Stored TIDAL session was rejected, a new login is required");
                self.api.set_session(None).await;
                if let Err(e) = self.store.clear().await {
                    warn!("Failed to remove rejected TIDAL session: {e}");
                }
                self.reset_state().await;
                Err(Error::NotAuthenticated)
            }
            Err(e) => {
                self.api.set_session(None).await;
                self.reset_state().await;
                Err(e)
            }
        }
    }

    pub async fn login(&self) -> Result<LoginOutcome> {
        let _login = self.login_lock.lock().await;
        match self.ensure_authenticated().await {
            Ok(()) => return Ok(LoginOutcome::AlreadyAuthenticated),
            Err(Error::NotAuthenticated) => {}
            Err(e) => return Err(e),
        }

        let authorization = self.api.start_device_authorization().await?;
        let login_url = authorization.login_url();
        info!(
            "Waiting for TIDAL login at {login_url} (code {}, expires in {}s)",
            authorization.user_code, authorization.expires_in
        );
        self.set_state(AuthState::AwaitingBrowserCallback {
            user_code: authorization.user_code.clone(),
            login_url: login_url.clone(),
            expires_in: authorization.expires_in,
        })
        .await;

        if let Err(e) = self.prompt.show(&authorization) {
            warn!("Could not open a browser ({e}), open {login_url} manually");
        }

        let window = self
            .timeout
            .min(Duration::from_secs(authorization.expires_in));
        // Dropping the polling future on timeout cancels it
        let session = match tokio::time::timeout(window, self.wait_for_grant(&authorization)).await
        {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                self.set_state(AuthState::NotAuthenticated).await;
                return Err(e);
            }
            Err(_) => {
                warn!("TIDAL login not completed within {}s", window.as_secs());
                self.set_state(AuthState::NotAuthenticated).await;
                return Err(Error::AuthTimeout);
            }
        };

        self.api.set_session(Some(session.clone())).await;
        if let Err(e) = self.store.save(&session).await {
            warn!("Logged in, but the session could not be saved: {e}");
        }
        self.set_state(AuthState::Authenticated).await;
        info!("Authenticated with TIDAL");
        Ok(LoginOutcome::LoggedIn)
    }

    async fn wait_for_grant(&self, authorization: &DeviceAuthorization) -> Result<Session> {
        let mut interval = Duration::from_secs(authorization.interval.max(1));
        loop {
            tokio::time::sleep(interval).await;
            match self
                .api
                .poll_device_authorization(&authorization.device_code)
                .await?
            {
                DevicePoll::Pending => debug!("TIDAL login still pending"),
                DevicePoll::SlowDown => interval += SLOW_DOWN_STEP,
                DevicePoll::Granted(session) => return Ok(session),
                DevicePoll::Denied(reason) => return Err(Error::AuthRejected(reason)),
                DevicePoll::Expired => return Err(Error::AuthTimeout),
            }
        }
    }

    pub async fn logout(&self) -> Result<()> {
        self.api.set_session(None).await;
        self.set_state(AuthState::NotAuthenticated).await;
        self.store.clear().await?;
        info!("Logged out of TIDAL");
        Ok(())
    }
}

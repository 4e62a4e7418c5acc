//! OAuth credential storage and authorization.
//!
//! A saved authorized-user file is reused on every tick. When it is missing
//! or unreadable, the installed-app browser flow runs once and its refresh
//! token is written back in the same authorized-user format.

use async_trait::async_trait;
use google_gmail1::common::GetToken;
use google_gmail1::yup_oauth2::authorized_user::AuthorizedUserSecret;
use google_gmail1::yup_oauth2::storage::{TokenInfo, TokenStorage};
use google_gmail1::yup_oauth2::{
    self, ApplicationSecret, AuthorizedUserAuthenticator, InstalledFlowAuthenticator,
    InstalledFlowReturnMethod,
};
use serde::{Deserialize, Serialize};
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{ResponderError, Result};

/// Scopes requested during the browser login.
pub const SCOPES: [&str; 5] = [
    "https://mail.google.com/",
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/gmail.labels",
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.compose",
];

const AUTHORIZED_USER_TYPE: &str = "authorized_user";

/// Contents of the token file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedUser {
    #[serde(rename = "type")]
    pub kind: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl AuthorizedUser {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            kind: AUTHORIZED_USER_TYPE.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
        }
    }

    fn into_secret(self) -> AuthorizedUserSecret {
        AuthorizedUserSecret {
            client_id: self.client_id,
            client_secret: self.client_secret,
            refresh_token: self.refresh_token,
            key_type: self.kind,
        }
    }
}

/// Outcome of reading the token file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredCredential {
    Present(AuthorizedUser),
    /// No usable credential; the browser flow has to run.
    Absent,
}

/// Loads, persists and refreshes the mailbox credential.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    credentials_path: PathBuf,
    token_path: PathBuf,
}

impl CredentialStore {
    pub fn new(credentials_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            token_path: token_path.into(),
        }
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// Read the saved credential. Any read or parse problem counts as absent.
    pub async fn load_if_exists(&self) -> StoredCredential {
        let content = match tokio::fs::read(&self.token_path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("No saved credential at {:?}: {}", self.token_path, e);
                return StoredCredential::Absent;
            }
        };

        match serde_json::from_slice::<AuthorizedUser>(&content) {
            Ok(user) if user.kind == AUTHORIZED_USER_TYPE => StoredCredential::Present(user),
            Ok(user) => {
                tracing::debug!(
                    "Ignoring credential {:?} of type {}",
                    self.token_path,
                    user.kind
                );
                StoredCredential::Absent
            }
            Err(e) => {
                tracing::debug!("Unreadable credential {:?}: {}", self.token_path, e);
                StoredCredential::Absent
            }
        }
    }

    /// Write the authorized-user credential to the token file.
    pub async fn save(&self, user: &AuthorizedUser) -> Result<()> {
        let payload = serde_json::to_vec(user)?;
        tokio::fs::write(&self.token_path, payload).await?;
        tracing::debug!("Saved credential to {:?}", self.token_path);
        Ok(())
    }

    /// Read the operator's OAuth client registration (`installed` or `web`).
    pub async fn read_client_secret(&self) -> Result<ApplicationSecret> {
        yup_oauth2::read_application_secret(&self.credentials_path)
            .await
            .map_err(|e| {
                ResponderError::Auth(format!(
                    "failed to read client registration {:?}: {}",
                    self.credentials_path, e
                ))
            })
    }

    /// Return an authenticator for the mailbox, logging in through the
    /// browser first when no saved credential is usable.
    pub async fn authorize(&self) -> Result<impl GetToken + 'static> {
        let user = match self.load_if_exists().await {
            StoredCredential::Present(user) => {
                tracing::info!(
                    "Using previous OAuth session details, delete {:?} to start fresh",
                    self.token_path
                );
                user
            }
            StoredCredential::Absent => {
                let user = self.interactive_login().await?;
                self.save(&user).await?;
                repaint_console();
                tracing::info!("Logged in with OAuth credentials");
                user
            }
        };

        AuthorizedUserAuthenticator::builder(user.into_secret())
            .build()
            .await
            .map_err(|e| {
                ResponderError::Auth(format!(
                    "failed to build authenticator from refresh token: {}",
                    e
                ))
            })
    }

    async fn interactive_login(&self) -> Result<AuthorizedUser> {
        let secret = self.read_client_secret().await?;

        tracing::info!("Please login with browser!");

        let capture = RefreshTokenCapture::default();
        let auth = InstalledFlowAuthenticator::builder(
            secret.clone(),
            InstalledFlowReturnMethod::HTTPRedirect,
        )
        .with_storage(Box::new(capture.clone()))
        .build()
        .await
        .map_err(|e| ResponderError::Auth(format!("failed to start browser login: {}", e)))?;

        auth.token(&SCOPES[..])
            .await
            .map_err(|e| ResponderError::Auth(format!("browser login failed: {}", e)))?;

        let refresh_token = capture.refresh_token().ok_or_else(|| {
            ResponderError::Auth("browser login did not return a refresh token".to_string())
        })?;

        Ok(AuthorizedUser::new(
            secret.client_id,
            secret.client_secret,
            refresh_token,
        ))
    }
}

/// Token storage that keeps the login result in memory so its refresh token
/// can be written out in authorized-user form.
#[derive(Clone, Default)]
struct RefreshTokenCapture {
    token: Arc<Mutex<Option<TokenInfo>>>,
}

impl RefreshTokenCapture {
    fn refresh_token(&self) -> Option<String> {
        self.token
            .lock()
            .ok()
            .and_then(|token| token.as_ref().and_then(|t| t.refresh_token.clone()))
    }
}

#[async_trait]
impl TokenStorage for RefreshTokenCapture {
    async fn set(&self, _scopes: &[&str], token: TokenInfo) -> anyhow::Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("token capture lock poisoned"))?;
        *slot = Some(token);
        Ok(())
    }

    async fn get(&self, _scopes: &[&str]) -> Option<TokenInfo> {
        self.token.lock().ok().and_then(|token| token.clone())
    }
}

/// Clear the terminal. Does nothing when stdout is not a terminal.
pub fn repaint_console() {
    let mut stdout = std::io::stdout();
    if stdout.is_terminal() {
        let _ = write!(stdout, "\x1B[2J\x1B[1;1H");
        let _ = stdout.flush();
    }
}

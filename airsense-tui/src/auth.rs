//! Bearer token handling.
//!
//! Tokens are issued by an external identity provider. The dashboard only
//! reads them: claims are decoded for display and for the registration check,
//! never verified. Verification is the API's job.

use crate::api_client::RestClient;
use crate::events::TuiEvent;
use airsense_core::EntityId;
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Malformed token: {0}")]
    MalformedToken(&'static str),
    #[error("Token payload is not base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("Token payload is not valid JSON: {0}")]
    Claims(#[from] serde_json::Error),
    #[error("Token source is empty")]
    EmptyToken,
    #[error("Failed to read token file: {0}")]
    Io(#[from] std::io::Error),
}

/// Claims the dashboard cares about. Anything else in the payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Claims {
    /// Account id; absent until the user registered with the API.
    pub id: Option<EntityId>,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Expiry, Unix seconds.
    pub exp: Option<i64>,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Name, then email, then a placeholder.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("anonymous")
    }
}

/// Decode the payload segment of a JWT without checking its signature.
pub fn decode_claims(token: &str) -> Result<Claims, AuthError> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature)) =
        (segments.next(), segments.next(), segments.next())
    else {
        return Err(AuthError::MalformedToken("expected three dot-separated segments"));
    };
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// The current bearer token, shared by the REST client and the refresh task.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn token(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Claims of the current token; `None` when signed out or undecodable.
    pub fn claims(&self) -> Option<Claims> {
        self.token().and_then(|token| decode_claims(&token).ok())
    }

    /// Whether the current token carries an API account id.
    pub fn is_registered(&self) -> bool {
        self.claims().map(|c| c.id.is_some()).unwrap_or(false)
    }

    /// Whether the token expires within `window` of `now`. Tokens without
    /// an expiry never do.
    pub fn expires_within(&self, now: DateTime<Utc>, window: ChronoDuration) -> bool {
        self.claims()
            .and_then(|c| c.expires_at())
            .map(|at| at <= now + window)
            .unwrap_or(false)
    }
}

/// Where fresh tokens come from.
#[async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn fetch_token(&self) -> Result<String, AuthError>;
}

/// A token fixed in the configuration.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn fetch_token(&self) -> Result<String, AuthError> {
        let token = self.0.trim();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }
        Ok(token.to_string())
    }
}

/// A token file kept current by an external sign-in helper. Re-read on every
/// fetch.
#[derive(Debug, Clone)]
pub struct FileTokenSource {
    path: PathBuf,
}

impl FileTokenSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl TokenSource for FileTokenSource {
    async fn fetch_token(&self) -> Result<String, AuthError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let token = contents.trim();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }
        Ok(token.to_string())
    }
}

/// Load a token and make sure the account exists on the API side.
///
/// A token without an `id` claim belongs to a user the API has not seen yet:
/// register, then re-read the token so it carries the new id. A failed
/// registration is logged and the session continues unregistered.
pub async fn sign_in(
    source: &dyn TokenSource,
    tokens: &TokenStore,
    client: &RestClient,
    notification_token: Option<&str>,
) -> Result<Claims, AuthError> {
    let token = source.fetch_token().await?;
    let claims = decode_claims(&token)?;
    tokens.set(token.clone());
    if claims.id.is_some() {
        info!(user = claims.display_name(), "Signed in");
        return Ok(claims);
    }

    info!("Token carries no account id, registering with the API");
    if let Err(err) = client.register(notification_token.unwrap_or(&token)).await {
        warn!(error = %err, "API registration failed");
        return Ok(claims);
    }

    let token = source.fetch_token().await?;
    let claims = decode_claims(&token)?;
    tokens.set(token);
    info!(user = claims.display_name(), registered = claims.id.is_some(), "Signed in");
    Ok(claims)
}

/// Periodically replace the token from `source`.
///
/// Skipped while signed out. A failed refresh signs the user out and tells
/// the UI, which then routes to the login screen.
pub fn spawn_token_refresh(
    source: Arc<dyn TokenSource>,
    tokens: TokenStore,
    every: Duration,
    sender: mpsc::Sender<TuiEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick completes immediately; the token was just loaded.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if !tokens.is_authenticated() {
                debug!("Signed out, skipping token refresh");
                continue;
            }
            match source.fetch_token().await {
                Ok(token) => {
                    tokens.set(token);
                    info!("Token refreshed");
                    if sender.send(TuiEvent::TokenRefreshed).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Token refresh failed, signing out");
                    tokens.clear();
                    let event = TuiEvent::SignedOut(format!("Token refresh failed: {}", err));
                    if sender.send(event).await.is_err() {
                        break;
                    }
                }
            }
        }
    })
}

//! OAuth2 Authorization Code + PKCE credentials for the remote drive.
//!
//! The flow is split across a redirect:
//! 1. [`SyncCredentialManager::connect`] persists a code verifier and a state
//!    token, then hands back the provider URL to send the user to
//! 2. The provider redirects back to `redirect_uri` with `code` and `state`
//! 3. [`SyncCredentialManager::handle_callback`] checks `state`, exchanges the
//!    code for tokens and stores them
//!
//! Verifier and state live in the key-value store rather than in memory, so
//! the callback can be handled by a different process than the one that
//! started the flow.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::error::AuthError;
use super::pkce;
use super::state::{
    ConnectionState, ACCESS_TOKEN_KEY, ALL_KEYS, ENABLED_KEY, OAUTH_STATE_KEY, PKCE_VERIFIER_KEY,
    REFRESH_TOKEN_KEY, TOKEN_EXPIRY_KEY,
};
use crate::clock::{Clock, SystemClock};
use crate::store::KeyValueStore;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

/// Access limited to files the app created itself.
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Lifetime assumed when the provider omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Query parameters the provider appends to the redirect.
const CALLBACK_PARAMS: [&str; 7] = ["code", "state", "scope", "authuser", "prompt", "hd", "error"];

/// Identity provider endpoints and client registration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub auth_url: String,
    pub token_url: String,
    pub revoke_url: Option<String>,
    pub redirect_uri: String,
    pub scope: String,
}

impl OAuthConfig {
    /// Google endpoints with the `drive.file` scope.
    pub fn google(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            revoke_url: Some(GOOGLE_REVOKE_URL.to_string()),
            redirect_uri: redirect_uri.into(),
            scope: DRIVE_FILE_SCOPE.to_string(),
        }
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }
}

/// Where to send the user to grant access.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Result of a successful callback.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    /// The callback URL with the authorization parameters removed.
    pub clean_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Anything that can hand out a bearer token for the remote API.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;

    fn connection_state(&self) -> ConnectionState;
}

/// Manages the OAuth credential lifecycle. See [`ConnectionState`].
pub struct SyncCredentialManager<S> {
    store: S,
    config: OAuthConfig,
    http: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStore> SyncCredentialManager<S> {
    pub fn new(store: S, config: OAuthConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, config: OAuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            http: reqwest::Client::new(),
            clock,
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    /// Current state, derived from what is persisted.
    pub fn state(&self) -> ConnectionState {
        let access_valid = self.store.contains(ACCESS_TOKEN_KEY)
            && self
                .store
                .get::<i64>(TOKEN_EXPIRY_KEY)
                .is_some_and(|expiry| self.now_ms() < expiry);

        if access_valid {
            ConnectionState::Connected
        } else if self.store.contains(REFRESH_TOKEN_KEY) {
            ConnectionState::NeedsRefresh
        } else if self.store.contains(PKCE_VERIFIER_KEY) {
            ConnectionState::Authorizing
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Starts authorization. A previous pending authorization is replaced.
    pub fn connect(&self) -> Result<AuthorizationRequest, AuthError> {
        let verifier = pkce::generate_verifier();
        let challenge = pkce::challenge_for(&verifier);
        let state = pkce::generate_state();

        if !self.store.set(PKCE_VERIFIER_KEY, &verifier) || !self.store.set(OAUTH_STATE_KEY, &state)
        {
            return Err(AuthError::Storage);
        }

        let mut url =
            Url::parse(&self.config.auth_url).map_err(|e| AuthError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scope)
            .append_pair("state", &state)
            .append_pair("code_challenge", &challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        tracing::info!("Starting authorization with {}", self.config.auth_url);
        Ok(AuthorizationRequest {
            url: url.to_string(),
            state,
        })
    }

    /// Completes authorization from the URL the provider redirected to.
    ///
    /// The `state` parameter must match the one persisted by
    /// [`connect`](Self::connect); on mismatch nothing is sent to the provider.
    pub async fn handle_callback(&self, callback_url: &str) -> Result<CallbackOutcome, AuthError> {
        let url = Url::parse(callback_url).map_err(|e| AuthError::InvalidUrl(e.to_string()))?;
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

        if let Some(error) = params.get("error") {
            self.clear_pending();
            return Err(AuthError::Provider(error.clone()));
        }

        let code = params.get("code").ok_or(AuthError::MissingParameter("code"))?;
        let returned_state = params
            .get("state")
            .ok_or(AuthError::MissingParameter("state"))?;

        let expected_state = self
            .store
            .get::<String>(OAUTH_STATE_KEY)
            .ok_or(AuthError::InvalidState)?;
        if !pkce::constant_time_eq(returned_state, &expected_state) {
            tracing::warn!("Rejected authorization callback with mismatched state");
            return Err(AuthError::InvalidState);
        }

        let verifier = self
            .store
            .get::<String>(PKCE_VERIFIER_KEY)
            .ok_or(AuthError::MissingVerifier)?;

        let tokens = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("code_verifier", &verifier),
                ("redirect_uri", &self.config.redirect_uri),
            ])
            .await?;
        self.store_tokens(&tokens)?;
        self.clear_pending();
        self.store.set(ENABLED_KEY, &true);

        tracing::info!("Connected to remote storage");
        Ok(CallbackOutcome {
            clean_url: strip_callback_params(&url),
        })
    }

    /// Returns a valid access token, refreshing it if it has expired.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        if let (Some(token), Some(expiry)) = (
            self.store.get::<String>(ACCESS_TOKEN_KEY),
            self.store.get::<i64>(TOKEN_EXPIRY_KEY),
        ) {
            if self.now_ms() < expiry {
                return Ok(token);
            }
        }

        let refresh_token = self
            .store
            .get::<String>(REFRESH_TOKEN_KEY)
            .ok_or(AuthError::NotConnected)?;

        tracing::debug!("Access token expired, refreshing");
        let tokens = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", &refresh_token),
            ])
            .await?;
        self.store_tokens(&tokens)?;

        Ok(tokens.access_token)
    }

    /// Revokes access (best effort) and forgets all credentials and sync state.
    ///
    /// Safe to call when already disconnected.
    pub async fn disconnect(&self) {
        let token = self
            .store
            .get::<String>(REFRESH_TOKEN_KEY)
            .or_else(|| self.store.get::<String>(ACCESS_TOKEN_KEY));

        if let (Some(token), Some(revoke_url)) = (token, &self.config.revoke_url) {
            match self
                .http
                .post(revoke_url)
                .form(&[("token", token.as_str())])
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    tracing::info!("Revoked remote storage access")
                }
                Ok(response) => {
                    tracing::warn!("Token revocation returned {}", response.status())
                }
                Err(e) => tracing::warn!("Token revocation failed: {}", e),
            }
        }

        for key in ALL_KEYS {
            self.store.remove(key);
        }
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("client_id", &self.config.client_id));
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret));
        }

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(TokenErrorResponse {
                    error,
                    error_description: Some(description),
                }) => format!("{}: {}", error, description),
                Ok(TokenErrorResponse { error, .. }) => error,
                Err(_) => format!("HTTP {}", status),
            };
            return Err(AuthError::TokenRequest(message));
        }

        Ok(response.json::<TokenResponse>().await?)
    }

    fn store_tokens(&self, tokens: &TokenResponse) -> Result<(), AuthError> {
        let expires_in = tokens.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expiry = self
            .now_ms()
            .saturating_add(expires_in.saturating_mul(1000));

        let mut ok = self.store.set(ACCESS_TOKEN_KEY, &tokens.access_token);
        ok &= self.store.set(TOKEN_EXPIRY_KEY, &expiry);
        // Providers only send a refresh token on first consent or rotation
        if let Some(refresh_token) = &tokens.refresh_token {
            ok &= self.store.set(REFRESH_TOKEN_KEY, refresh_token);
        }

        if ok {
            Ok(())
        } else {
            Err(AuthError::Storage)
        }
    }

    fn clear_pending(&self) {
        self.store.remove(PKCE_VERIFIER_KEY);
        self.store.remove(OAUTH_STATE_KEY);
    }
}

#[async_trait]
impl<S: KeyValueStore + Send + Sync> AccessTokenSource for SyncCredentialManager<S> {
    async fn access_token(&self) -> Result<String, AuthError> {
        SyncCredentialManager::access_token(self).await
    }

    fn connection_state(&self) -> ConnectionState {
        self.state()
    }
}

fn strip_callback_params(url: &Url) -> String {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !CALLBACK_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut clean = url.clone();
    clean.set_query(None);
    if !kept.is_empty() {
        clean.query_pairs_mut().extend_pairs(kept);
    }
    clean.to_string()
}

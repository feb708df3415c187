// src/gateway/auth.rs

use crate::config::{Config, ZohoOauthConfig};
use crate::error::GatewayError;
use reqwest::Client;
use serde::Deserialize;
use std::path::PathBuf;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{info, warn};
use urlencoding::encode;

/// Lifetime assumed for an access token taken from the config file.
const SEEDED_TOKEN_TTL: i64 = 3599;
/// Refresh this long before the server-side expiry.
const EXPIRY_MARGIN: i64 = 60;

/// Zoho answers token errors with HTTP 200 and an `error` field, so every
/// field is optional.
#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: OffsetDateTime,
}

impl CachedToken {
    fn is_fresh(&self, now: OffsetDateTime) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN) < self.expires_at
    }
}

/// OAuth refresh-token credentials for one Zoho account.
///
/// Acquires an access token on first use, refreshes it when it expires or
/// when the API rejects it, and optionally writes the new token back into the
/// config file.
pub struct TokenProvider {
    client: Client,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    token_url: String,
    persist_to: Option<PathBuf>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(client: Client, cfg: &ZohoOauthConfig) -> Self {
        let seeded = (!cfg.tokens.access_token.is_empty()).then(|| CachedToken {
            access_token: cfg.tokens.access_token.clone(),
            expires_at: OffsetDateTime::now_utc() + Duration::seconds(SEEDED_TOKEN_TTL),
        });

        Self {
            client,
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            refresh_token: cfg.tokens.refresh_token.clone(),
            token_url: cfg.token_url.clone(),
            persist_to: None,
            cached: Mutex::new(seeded),
        }
    }

    /// Write refreshed access tokens into this TOML file.
    pub fn persist_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_to = Some(path.into());
        self
    }

    pub async fn access_token(&self) -> Result<String, GatewayError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(OffsetDateTime::now_utc()) {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.refresh().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    /// Drop the cached token, e.g. after a 401.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn refresh(&self) -> Result<CachedToken, GatewayError> {
        if self.refresh_token.is_empty() {
            return Err(GatewayError::Auth("no refresh token configured".into()));
        }

        let body = format!(
            "client_id={}&client_secret={}&refresh_token={}&grant_type=refresh_token",
            encode(&self.client_id),
            encode(&self.client_secret),
            encode(&self.refresh_token),
        );

        let resp = self
            .client
            .post(&self.token_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Auth(format!("{status}: {error_text}")));
        }

        let token_resp: TokenResponse = resp.json().await?;
        let token = token_from_response(token_resp, OffsetDateTime::now_utc())?;
        info!(expires_at = %token.expires_at, "Zoho access token refreshed");

        if let Some(path) = &self.persist_to {
            if let Err(e) = Config::update_access_token(path, &token.access_token) {
                warn!(error = %e, path = %path.display(), "Could not persist access token");
            }
        }

        Ok(token)
    }
}

fn token_from_response(
    resp: TokenResponse,
    now: OffsetDateTime,
) -> Result<CachedToken, GatewayError> {
    match (resp.access_token, resp.error) {
        (Some(access_token), None) => Ok(CachedToken {
            access_token,
            expires_at: now + Duration::seconds(resp.expires_in.unwrap_or(SEEDED_TOKEN_TTL)),
        }),
        (_, Some(error)) => Err(GatewayError::Auth(error)),
        (None, None) => Err(GatewayError::Auth("token response without access_token".into())),
    }
}

//! Bearer-token acquisition for the WebSocket transport.
//!
//! The pipe transport never authenticates; tokens are fetched only when
//! connecting to a remote agent.

use std::time::{Duration, Instant};

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

use crate::{
    config::BridgeConfig,
    error::{Error, Result},
};

/// Source of bearer tokens identifying the bridge to the downstream
/// agent's authentication layer.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<Secret<String>>;
}

#[derive(Clone)]
struct CachedAccessToken {
    token: Secret<String>,
    expires_at: Instant,
}

impl CachedAccessToken {
    fn is_valid(&self) -> bool {
        let refresh_skew = Duration::from_secs(60);
        self.expires_at > Instant::now() + refresh_skew
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// OAuth client-credentials token provider with an in-memory cache.
pub struct ClientCredentials {
    http: reqwest::Client,
    app_id: String,
    app_password: Secret<String>,
    oauth_scope: String,
    token_url: String,
    cache: tokio::sync::Mutex<Option<CachedAccessToken>>,
}

impl ClientCredentials {
    #[must_use]
    pub fn new(config: &BridgeConfig) -> Self {
        let token_url = format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            config.oauth_tenant
        );
        Self::with_token_endpoint(config, token_url)
    }

    /// Use an explicit token endpoint instead of deriving one from the
    /// configured tenant.
    #[must_use]
    pub fn with_token_endpoint(config: &BridgeConfig, token_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            app_id: config.app_id.clone(),
            app_password: config.app_password.clone(),
            oauth_scope: config.oauth_scope.clone(),
            token_url: token_url.into(),
            cache: tokio::sync::Mutex::new(None),
        }
    }
}

#[async_trait]
impl TokenProvider for ClientCredentials {
    async fn bearer_token(&self) -> Result<Secret<String>> {
        {
            let guard = self.cache.lock().await;
            if let Some(token) = guard.as_ref()
                && token.is_valid()
            {
                return Ok(token.token.clone());
            }
        }

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.app_id.as_str()),
            ("client_secret", self.app_password.expose_secret()),
            ("scope", self.oauth_scope.as_str()),
        ];
        let resp = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(Error::credential)?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::credential(format!(
                "token request failed ({status}): {body}"
            )));
        }

        let body: TokenResponse = resp.json().await.map_err(Error::credential)?;
        let ttl = body.expires_in.unwrap_or(3600).max(120);
        let cached = CachedAccessToken {
            token: Secret::new(body.access_token),
            expires_at: Instant::now() + Duration::from_secs(ttl),
        };
        let token = cached.token.clone();

        let mut guard = self.cache.lock().await;
        *guard = Some(cached);
        Ok(token)
    }
}

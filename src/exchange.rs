use std::collections::HashMap;

use reqwest::{Client, header::ACCEPT};
use serde::{Deserialize, Serialize};

use crate::registry::ProviderConfig;
use crate::store::now_ms;
use crate::{ExchangeError, OAuthError};

/// Body of a successful token endpoint response. Providers attach all kinds
/// of extra fields; anything unrecognized lands in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expires_in: Option<u64>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl TokenSet {
    /// Absolute expiry computed from `expires_in` at the time of the call.
    /// `None` when the provider reported no lifetime. Absurd lifetimes
    /// saturate instead of overflowing.
    pub fn expires_at_ms(&self) -> Option<i64> {
        self.expires_in.map(|secs| {
            let lifetime_ms = i64::try_from(secs)
                .unwrap_or(i64::MAX)
                .saturating_mul(1000);
            now_ms().saturating_add(lifetime_ms)
        })
    }
}

/// Stateless client for the two token endpoint operations. One POST in, one
/// parsed response out; failures are never retried here.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    http: Client,
}

impl TokenExchanger {
    pub fn new() -> Result<Self, OAuthError> {
        Ok(Self {
            http: Client::builder().build()?,
        })
    }

    pub fn with_http_client(http: Client) -> Self {
        Self { http }
    }

    /// Trades an authorization code for tokens. `redirect_uri` must be the
    /// value the authorization URL was built with; providers verify it.
    pub async fn exchange_code(
        &self,
        provider: &ProviderConfig,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenSet, OAuthError> {
        let (client_id, client_secret) = provider.credentials()?;

        let mut payload = HashMap::new();
        payload.insert("grant_type".to_string(), "authorization_code".to_string());
        payload.insert("code".to_string(), code.to_string());
        payload.insert("redirect_uri".to_string(), redirect_uri.to_string());
        payload.insert("client_id".to_string(), client_id.to_string());
        payload.insert("client_secret".to_string(), client_secret.to_string());

        tracing::debug!(provider = %provider.id, "exchanging authorization code");
        self.send_token_request(&provider.token_url, payload)
            .await
            .map_err(|source| {
                tracing::warn!(provider = %provider.id, error = %source, "code exchange failed");
                OAuthError::Exchange {
                    provider: provider.id.clone(),
                    source,
                }
            })
    }

    /// Trades a refresh token for a fresh access token. The response may
    /// omit `refresh_token`; callers keep the one they already hold.
    pub async fn refresh_token(
        &self,
        provider: &ProviderConfig,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthError> {
        let (client_id, client_secret) = provider.credentials()?;

        let mut payload = HashMap::new();
        payload.insert("grant_type".to_string(), "refresh_token".to_string());
        payload.insert("refresh_token".to_string(), refresh_token.to_string());
        payload.insert("client_id".to_string(), client_id.to_string());
        payload.insert("client_secret".to_string(), client_secret.to_string());

        tracing::debug!(provider = %provider.id, "refreshing access token");
        self.send_token_request(&provider.token_url, payload)
            .await
            .map_err(|source| {
                tracing::warn!(provider = %provider.id, error = %source, "token refresh failed");
                OAuthError::Exchange {
                    provider: provider.id.clone(),
                    source,
                }
            })
    }

    async fn send_token_request(
        &self,
        token_url: &str,
        payload: HashMap<String, String>,
    ) -> Result<TokenSet, ExchangeError> {
        let response = self
            .http
            .post(token_url)
            .header(ACCEPT, "application/json")
            .form(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ExchangeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|err| ExchangeError::InvalidResponse {
            message: err.to_string(),
            body,
        })
    }
}

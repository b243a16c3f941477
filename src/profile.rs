use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, header::ACCEPT};
use serde::{Deserialize, Serialize};

use crate::OAuthError;
use crate::profiles::{self, ProfileApi};

/// The provider's answer to "who does this token belong to", reduced to the
/// fields the connection store keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: String,
    pub name: String,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl AccountProfile {
    /// Placeholder identity stored when a provider's profile cannot be
    /// fetched or read. Reconnects that also degrade merge into this same
    /// account, since `"unknown"` is its external id.
    pub fn unknown() -> Self {
        Self {
            id: "unknown".to_string(),
            name: "Unknown Account".to_string(),
            username: None,
            email: None,
        }
    }
}

/// Resolves the external identity behind a freshly issued access token.
/// The connection manager takes this as an injected dependency so callers
/// can substitute their own resolution (or a canned one in tests).
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch(
        &self,
        provider_id: &str,
        access_token: &str,
    ) -> Result<AccountProfile, OAuthError>;
}

/// Default [`ProfileFetcher`]: GETs the provider's profile endpoint with the
/// access token as a bearer credential and maps the JSON through the
/// provider's registered [`ProfileApi`].
///
/// Fetching is best effort. An unregistered provider, an error status, or an
/// unreadable body all degrade to [`AccountProfile::unknown`] rather than
/// failing the connect; the token exchange has already succeeded at this
/// point and the tokens are worth keeping.
pub struct HttpProfileFetcher {
    http: Client,
    apis: HashMap<String, Box<dyn ProfileApi>>,
}

impl HttpProfileFetcher {
    pub fn new() -> Result<Self, OAuthError> {
        Ok(Self::with_http_client(Client::builder().build()?))
    }

    pub fn with_http_client(http: Client) -> Self {
        Self {
            http,
            apis: profiles::default_apis(),
        }
    }

    /// Adds or replaces the profile mapping for one provider.
    pub fn register(&mut self, provider_id: impl Into<String>, api: Box<dyn ProfileApi>) {
        self.apis.insert(provider_id.into(), api);
    }
}

#[async_trait]
impl ProfileFetcher for HttpProfileFetcher {
    async fn fetch(
        &self,
        provider_id: &str,
        access_token: &str,
    ) -> Result<AccountProfile, OAuthError> {
        let Some(api) = self.apis.get(provider_id) else {
            tracing::warn!(
                provider = %provider_id,
                "no profile endpoint known, storing placeholder identity"
            );
            return Ok(AccountProfile::unknown());
        };

        let response = match self
            .http
            .get(api.endpoint())
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    provider = %provider_id,
                    error = %err,
                    "profile request failed, storing placeholder identity"
                );
                return Ok(AccountProfile::unknown());
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                provider = %provider_id,
                status = response.status().as_u16(),
                "profile endpoint returned an error, storing placeholder identity"
            );
            return Ok(AccountProfile::unknown());
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => Ok(api.parse(&body)),
            Err(err) => {
                tracing::warn!(
                    provider = %provider_id,
                    error = %err,
                    "profile response was not json, storing placeholder identity"
                );
                Ok(AccountProfile::unknown())
            }
        }
    }
}

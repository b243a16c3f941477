use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use url::Url;

use crate::exchange::TokenExchanger;
use crate::profile::{HttpProfileFetcher, ProfileFetcher};
use crate::registry::ProviderRegistry;
use crate::state::AuthorizationState;
use crate::store::{Account, AccountData, AccountSummary, ConnectionStore};
use crate::{ExchangeError, OAuthError};

/// How long before actual expiry a token counts as stale and gets refreshed.
/// Deliberately one crate-wide constant rather than per-provider tuning.
pub const STALENESS_MARGIN_MS: i64 = 5 * 60 * 1000;

/// Orchestrates the OAuth connection lifecycle across every provider in the
/// registry: builds authorization URLs, completes the code-for-token
/// handshake on callback, hands out currently valid access tokens (refreshing
/// stale ones on demand), and disconnects accounts.
///
/// The manager owns no state of its own; connected accounts live in the
/// injected [`ConnectionStore`], which the composition root constructs and
/// may share with other consumers. Cloning the manager clones handles, not
/// data.
#[derive(Clone)]
pub struct ConnectionManager {
    registry: ProviderRegistry,
    store: ConnectionStore,
    exchanger: TokenExchanger,
    profiles: Arc<dyn ProfileFetcher>,
}

impl ConnectionManager {
    pub fn new(registry: ProviderRegistry, store: ConnectionStore) -> Result<Self, OAuthError> {
        let http = Client::builder().build()?;
        Ok(Self {
            registry,
            store,
            exchanger: TokenExchanger::with_http_client(http.clone()),
            profiles: Arc::new(HttpProfileFetcher::with_http_client(http)),
        })
    }

    /// Replaces the HTTP client behind both the token exchanger and the
    /// default profile fetcher, e.g. to set timeouts or proxies. Apply this
    /// before [`with_profile_fetcher`](Self::with_profile_fetcher), which it
    /// would otherwise overwrite.
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.exchanger = TokenExchanger::with_http_client(http.clone());
        self.profiles = Arc::new(HttpProfileFetcher::with_http_client(http));
        self
    }

    /// Substitutes how external account identities are resolved after an
    /// exchange. Tests use this to avoid the network entirely.
    pub fn with_profile_fetcher(mut self, profiles: impl ProfileFetcher + 'static) -> Self {
        self.profiles = Arc::new(profiles);
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ConnectionStore {
        &self.store
    }

    /// Provider ids available for connecting, in registration order.
    pub fn providers(&self) -> Vec<&str> {
        self.registry.ids().collect()
    }

    pub fn supports(&self, provider_id: &str) -> bool {
        self.registry.has(provider_id)
    }

    /// Builds the URL to send the end user's browser to. Mints the opaque
    /// `state` binding the user to this flow and asks for offline access so
    /// providers issue a refresh token.
    pub fn authorization_url(
        &self,
        provider_id: &str,
        user_id: &str,
        redirect_uri: &str,
    ) -> Result<String, OAuthError> {
        let provider = self.registry.get(provider_id)?;
        let (client_id, _) = provider.credentials()?;

        let state = AuthorizationState::new(user_id, provider_id).encode();

        let mut url = Url::parse(&provider.authorize_url)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("client_id", client_id);
            pairs.append_pair("redirect_uri", redirect_uri);
            pairs.append_pair("scope", &provider.scope);
            pairs.append_pair("state", &state);
            pairs.append_pair("response_type", "code");
            pairs.append_pair("access_type", "offline");
            pairs.append_pair("prompt", "consent");
        }

        Ok(url.to_string())
    }

    /// Completes the redirect handshake: recovers the initiating user from
    /// `state`, exchanges the code, resolves the external account's identity,
    /// and stores the connection. Returns the stored account, merged into an
    /// existing one when the user reconnected the same external account.
    ///
    /// `redirect_uri` must be the value the authorization URL was built with;
    /// token endpoints verify it. Nothing is stored unless the exchange
    /// succeeds, so a failed callback leaves no partial account behind.
    pub async fn complete_callback(
        &self,
        provider_id: &str,
        code: &str,
        state: &str,
        redirect_uri: &str,
    ) -> Result<Account, OAuthError> {
        let provider = self.registry.get(provider_id)?;

        let state = AuthorizationState::decode(state)?;
        if state.provider_id != provider_id {
            return Err(OAuthError::ProviderMismatch {
                expected: provider_id.to_string(),
                received: state.provider_id,
            });
        }

        let tokens = self
            .exchanger
            .exchange_code(provider, code, redirect_uri)
            .await?;
        let expires_at_ms = tokens.expires_at_ms();

        // Best effort by contract: the fetcher degrades to a placeholder
        // identity rather than failing a connect whose tokens are already
        // in hand.
        let profile = self
            .profiles
            .fetch(provider_id, &tokens.access_token)
            .await?;
        let provider_account_id = profile.id.clone();

        let bucket = self
            .store
            .add_or_update(
                &state.user_id,
                provider_id,
                AccountData {
                    provider_account_id: profile.id,
                    name: profile.name,
                    email: profile.email,
                    username: profile.username,
                    access_token: tokens.access_token,
                    refresh_token: tokens.refresh_token,
                    expires_at_ms,
                },
            )
            .await;

        let account = bucket
            .into_iter()
            .find(|account| account.provider_account_id == provider_account_id)
            .ok_or_else(|| OAuthError::NoSuchAccount {
                provider: provider_id.to_string(),
            })?;

        tracing::info!(
            provider = %provider_id,
            user = %state.user_id,
            account = %account.id,
            "account connected"
        );
        Ok(account)
    }

    /// A currently valid bearer token for the user's account at a provider,
    /// refreshing it first when it expires within [`STALENESS_MARGIN_MS`].
    /// With no explicit `account_id` the first-added account is used.
    ///
    /// A failed refresh propagates and the stale token is never returned;
    /// the stored account is left untouched, so the call can be retried.
    pub async fn valid_access_token(
        &self,
        user_id: &str,
        provider_id: &str,
        account_id: Option<&str>,
    ) -> Result<String, OAuthError> {
        let provider = self.registry.get(provider_id)?;

        let accounts = self.store.for_provider(user_id, provider_id).await;
        let account = match account_id {
            Some(id) => accounts.iter().find(|account| account.id == id),
            None => accounts.first(),
        }
        .ok_or_else(|| OAuthError::NoSuchAccount {
            provider: provider_id.to_string(),
        })?;

        if !account.is_stale(STALENESS_MARGIN_MS) {
            return Ok(account.access_token.clone());
        }

        tracing::debug!(
            provider = %provider_id,
            account = %account.id,
            expires_at_ms = account.expires_at_ms,
            "access token is stale, refreshing"
        );

        let refresh_token =
            account
                .refresh_token
                .as_deref()
                .ok_or_else(|| OAuthError::Exchange {
                    provider: provider_id.to_string(),
                    source: ExchangeError::NoRefreshToken,
                })?;

        let tokens = self.exchanger.refresh_token(provider, refresh_token).await?;

        // A concurrent disconnect may have removed the account while the
        // exchange was in flight; the freshly issued token is still valid
        // for the caller either way.
        self.store
            .apply_refresh(
                user_id,
                provider_id,
                &account.id,
                &tokens.access_token,
                tokens.refresh_token.as_deref(),
                tokens.expires_at_ms(),
            )
            .await;

        tracing::info!(provider = %provider_id, account = %account.id, "access token refreshed");
        Ok(tokens.access_token)
    }

    /// Removes one connected account. False when no account with that id
    /// exists, which is a no-op rather than an error.
    pub async fn disconnect(&self, user_id: &str, provider_id: &str, account_id: &str) -> bool {
        let removed = self.store.remove(user_id, provider_id, account_id).await;
        if removed {
            tracing::info!(provider = %provider_id, account = %account_id, "account disconnected");
        }
        removed
    }

    /// Every connected account the user has, keyed by provider.
    pub async fn connections(&self, user_id: &str) -> HashMap<String, Vec<Account>> {
        self.store.all(user_id).await
    }

    /// The user's accounts at one provider, empty when none are connected.
    pub async fn provider_connections(&self, user_id: &str, provider_id: &str) -> Vec<Account> {
        self.store.for_provider(user_id, provider_id).await
    }

    /// Token-free listing for account-management surfaces.
    pub async fn connection_summaries(
        &self,
        user_id: &str,
    ) -> HashMap<String, Vec<AccountSummary>> {
        self.store.summaries(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use url::Url;

    use super::{ConnectionManager, STALENESS_MARGIN_MS};
    use crate::profile::{AccountProfile, ProfileFetcher};
    use crate::registry::{ProviderConfig, ProviderRegistry};
    use crate::state::AuthorizationState;
    use crate::store::{AccountData, ConnectionStore, now_ms};
    use crate::{ExchangeError, OAuthError};

    struct StubProfiles;

    #[async_trait]
    impl ProfileFetcher for StubProfiles {
        async fn fetch(
            &self,
            _provider_id: &str,
            _access_token: &str,
        ) -> Result<AccountProfile, OAuthError> {
            Ok(AccountProfile {
                id: "ext-1".to_string(),
                name: "Test Account".to_string(),
                username: Some("test".to_string()),
                email: None,
            })
        }
    }

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(
            ProviderConfig::new(
                "github",
                "https://github.com/login/oauth/authorize",
                "https://github.com/login/oauth/access_token",
                "repo,user",
            )
            .with_credentials("client-id", "client-secret"),
        );
        registry.register(ProviderConfig::new(
            "gmail",
            "https://accounts.google.com/o/oauth2/v2/auth",
            "https://oauth2.googleapis.com/token",
            "https://www.googleapis.com/auth/gmail.send",
        ));
        registry
    }

    fn manager() -> ConnectionManager {
        ConnectionManager::new(registry(), ConnectionStore::new())
            .unwrap()
            .with_profile_fetcher(StubProfiles)
    }

    fn account_data(
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at_ms: Option<i64>,
    ) -> AccountData {
        AccountData {
            provider_account_id: "ext-1".to_string(),
            name: "Test Account".to_string(),
            email: None,
            username: None,
            access_token: access_token.to_string(),
            refresh_token: refresh_token.map(str::to_string),
            expires_at_ms,
        }
    }

    #[test]
    fn authorization_url_carries_the_offline_access_params() {
        let url = manager()
            .authorization_url("github", "u1", "https://x/cb")
            .unwrap();
        let url = Url::parse(&url).unwrap();
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("github.com"));
        assert_eq!(pairs.get("client_id"), Some(&"client-id".to_string()));
        assert_eq!(pairs.get("redirect_uri"), Some(&"https://x/cb".to_string()));
        assert_eq!(pairs.get("scope"), Some(&"repo,user".to_string()));
        assert_eq!(pairs.get("response_type"), Some(&"code".to_string()));
        assert_eq!(pairs.get("access_type"), Some(&"offline".to_string()));
        assert_eq!(pairs.get("prompt"), Some(&"consent".to_string()));
        assert!(pairs.contains_key("state"));
    }

    #[test]
    fn authorization_url_state_decodes_back_to_the_caller() {
        let url = manager()
            .authorization_url("github", "u1", "https://x/cb")
            .unwrap();
        let url = Url::parse(&url).unwrap();
        let (_, state) = url.query_pairs().find(|(key, _)| key == "state").unwrap();

        let state = AuthorizationState::decode(&state).unwrap();
        assert_eq!(state.user_id, "u1");
        assert_eq!(state.provider_id, "github");
    }

    #[test]
    fn authorization_url_rejects_unknown_providers() {
        let result = manager().authorization_url("not-a-real-provider", "u1", "https://x/cb");
        assert!(matches!(
            result,
            Err(OAuthError::UnknownProvider(id)) if id == "not-a-real-provider"
        ));
    }

    #[test]
    fn authorization_url_requires_credentials() {
        // gmail is registered without credentials
        let result = manager().authorization_url("gmail", "u1", "https://x/cb");
        assert!(matches!(
            result,
            Err(OAuthError::MissingCredentials(id)) if id == "gmail"
        ));
    }

    #[tokio::test]
    async fn callback_rejects_undecodable_state() {
        let result = manager()
            .complete_callback("github", "abc", "%%%not-base64%%%", "https://x/cb")
            .await;
        assert!(matches!(result, Err(OAuthError::InvalidState(_))));
    }

    #[tokio::test]
    async fn callback_rejects_state_minted_for_another_provider() {
        let state = AuthorizationState::new("u1", "gmail").encode();
        let result = manager()
            .complete_callback("github", "abc", &state, "https://x/cb")
            .await;

        match result {
            Err(OAuthError::ProviderMismatch { expected, received }) => {
                assert_eq!(expected, "github");
                assert_eq!(received, "gmail");
            }
            other => panic!("expected provider mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn token_for_an_unconnected_provider_is_no_such_account() {
        let result = manager().valid_access_token("u1", "github", None).await;
        assert!(matches!(
            result,
            Err(OAuthError::NoSuchAccount { provider }) if provider == "github"
        ));
    }

    #[tokio::test]
    async fn token_for_an_unknown_account_id_is_no_such_account() {
        let manager = manager();
        manager
            .store()
            .add_or_update("u1", "github", account_data("tok1", None, None))
            .await;

        let result = manager
            .valid_access_token("u1", "github", Some("nope"))
            .await;
        assert!(matches!(result, Err(OAuthError::NoSuchAccount { .. })));
    }

    #[tokio::test]
    async fn fresh_tokens_are_returned_without_a_refresh() {
        let manager = manager();
        manager
            .store()
            .add_or_update(
                "u1",
                "github",
                account_data("tok1", Some("refresh1"), Some(now_ms() + 2 * STALENESS_MARGIN_MS)),
            )
            .await;

        let token = manager.valid_access_token("u1", "github", None).await.unwrap();
        assert_eq!(token, "tok1");
    }

    #[tokio::test]
    async fn tokens_without_expiry_never_refresh() {
        let manager = manager();
        manager
            .store()
            .add_or_update("u1", "github", account_data("tok1", Some("refresh1"), None))
            .await;

        let token = manager.valid_access_token("u1", "github", None).await.unwrap();
        assert_eq!(token, "tok1");
    }

    #[tokio::test]
    async fn a_stale_account_without_a_refresh_token_fails_fast() {
        let manager = manager();
        manager
            .store()
            .add_or_update("u1", "github", account_data("tok1", None, Some(now_ms() + 60_000)))
            .await;

        let result = manager.valid_access_token("u1", "github", None).await;
        assert!(matches!(
            result,
            Err(OAuthError::Exchange {
                provider,
                source: ExchangeError::NoRefreshToken,
            }) if provider == "github"
        ));
    }

    #[tokio::test]
    async fn explicit_account_ids_select_between_accounts() {
        let manager = manager();
        manager
            .store()
            .add_or_update("u1", "github", account_data("tok1", None, None))
            .await;

        let mut second = account_data("tok2", None, None);
        second.provider_account_id = "ext-2".to_string();
        let bucket = manager.store().add_or_update("u1", "github", second).await;

        let default = manager.valid_access_token("u1", "github", None).await.unwrap();
        assert_eq!(default, "tok1");

        let explicit = manager
            .valid_access_token("u1", "github", Some(bucket[1].id.as_str()))
            .await
            .unwrap();
        assert_eq!(explicit, "tok2");
    }

    #[tokio::test]
    async fn listing_operations_pass_through_to_the_store() {
        let manager = manager();
        assert!(manager.connections("u1").await.is_empty());

        manager
            .store()
            .add_or_update("u1", "github", account_data("tok1", None, None))
            .await;

        assert_eq!(manager.provider_connections("u1", "github").await.len(), 1);
        assert_eq!(manager.connection_summaries("u1").await["github"].len(), 1);

        let id = manager.provider_connections("u1", "github").await[0].id.clone();
        assert!(manager.disconnect("u1", "github", &id).await);
        assert!(!manager.disconnect("u1", "github", &id).await);
        assert!(manager.provider_connections("u1", "github").await.is_empty());
    }

    #[test]
    fn the_catalog_is_reported_in_registration_order() {
        let manager = manager();
        assert_eq!(manager.providers(), vec!["github", "gmail"]);
        assert!(manager.supports("github"));
        assert!(!manager.supports("not-a-real-provider"));
    }
}

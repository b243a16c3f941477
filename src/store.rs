use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// One authorized external identity: a single user's account at a single
/// provider. `id` is generated locally and is the handle for removal and
/// explicit token requests; `provider_account_id` is the provider's own
/// identifier and the key reconnects are merged on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub provider_account_id: String,
    pub name: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at_ms: Option<i64>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Account {
    /// True when the account has an expiry and the current time is within
    /// `margin_ms` of it. Accounts without an expiry never go stale.
    pub fn is_stale(&self, margin_ms: i64) -> bool {
        match self.expires_at_ms {
            Some(expires_at_ms) => now_ms() >= expires_at_ms - margin_ms,
            None => false,
        }
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id.clone(),
            provider_account_id: self.provider_account_id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            created_at_ms: self.created_at_ms,
            updated_at_ms: self.updated_at_ms,
        }
    }
}

/// Everything the connect flow knows about an account before it is stored.
/// The store supplies the local id and timestamps.
#[derive(Debug, Clone)]
pub struct AccountData {
    pub provider_account_id: String,
    pub name: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at_ms: Option<i64>,
}

/// Listing projection of an [`Account`] with the token material stripped,
/// safe to hand to account-management surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: String,
    pub provider_account_id: String,
    pub name: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

type Buckets = HashMap<String, HashMap<String, Vec<Account>>>;

/// In-memory map of `userId -> providerId -> [Account]`, shared behind a
/// lock. Cloning the store clones the handle, not the data. Contents live
/// for the process lifetime; there is no persistence and no eviction.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStore {
    connections: Arc<RwLock<Buckets>>,
}

impl ConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates an account within the user's provider bucket,
    /// merging on `provider_account_id`: an existing account keeps its local
    /// id and `created_at_ms` and has everything else overwritten with the
    /// new data; a new account gets a fresh id and both timestamps set to
    /// now. Returns the full bucket after the change.
    pub async fn add_or_update(
        &self,
        user_id: &str,
        provider_id: &str,
        data: AccountData,
    ) -> Vec<Account> {
        let mut connections = self.connections.write().await;
        let bucket = connections
            .entry(user_id.to_string())
            .or_default()
            .entry(provider_id.to_string())
            .or_default();

        let now = now_ms();
        let existing = bucket
            .iter_mut()
            .find(|account| account.provider_account_id == data.provider_account_id);

        match existing {
            Some(account) => {
                account.name = data.name;
                account.email = data.email;
                account.username = data.username;
                account.access_token = data.access_token;
                account.refresh_token = data.refresh_token;
                account.expires_at_ms = data.expires_at_ms;
                account.updated_at_ms = now;
            }
            None => bucket.push(Account {
                id: generate_account_id(),
                provider_account_id: data.provider_account_id,
                name: data.name,
                email: data.email,
                username: data.username,
                access_token: data.access_token,
                refresh_token: data.refresh_token,
                expires_at_ms: data.expires_at_ms,
                created_at_ms: now,
                updated_at_ms: now,
            }),
        }

        bucket.clone()
    }

    /// Every provider bucket the user has.
    pub async fn all(&self, user_id: &str) -> HashMap<String, Vec<Account>> {
        let connections = self.connections.read().await;
        connections.get(user_id).cloned().unwrap_or_default()
    }

    /// One provider bucket, empty when the user or bucket is absent.
    pub async fn for_provider(&self, user_id: &str, provider_id: &str) -> Vec<Account> {
        let connections = self.connections.read().await;
        connections
            .get(user_id)
            .and_then(|buckets| buckets.get(provider_id))
            .cloned()
            .unwrap_or_default()
    }

    /// Token-free listing of every connected account, keyed by provider.
    pub async fn summaries(&self, user_id: &str) -> HashMap<String, Vec<AccountSummary>> {
        let connections = self.connections.read().await;
        connections
            .get(user_id)
            .map(|buckets| {
                buckets
                    .iter()
                    .map(|(provider_id, accounts)| {
                        (
                            provider_id.clone(),
                            accounts.iter().map(Account::summary).collect(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Removes one account by local id. False when nothing matched; removing
    /// the last account leaves the empty bucket in place.
    pub async fn remove(&self, user_id: &str, provider_id: &str, account_id: &str) -> bool {
        let mut connections = self.connections.write().await;
        let Some(bucket) = connections
            .get_mut(user_id)
            .and_then(|buckets| buckets.get_mut(provider_id))
        else {
            return false;
        };

        let before = bucket.len();
        bucket.retain(|account| account.id != account_id);
        bucket.len() < before
    }

    /// Writes the result of a successful refresh back onto the stored
    /// account: new access token, new expiry, bumped `updated_at_ms`, and
    /// the refresh token only when the provider issued a new one. False when
    /// the account was removed in the meantime.
    pub async fn apply_refresh(
        &self,
        user_id: &str,
        provider_id: &str,
        account_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at_ms: Option<i64>,
    ) -> bool {
        let mut connections = self.connections.write().await;
        let account = connections
            .get_mut(user_id)
            .and_then(|buckets| buckets.get_mut(provider_id))
            .and_then(|bucket| bucket.iter_mut().find(|account| account.id == account_id));

        let Some(account) = account else {
            return false;
        };

        account.access_token = access_token.to_string();
        if let Some(refresh_token) = refresh_token {
            account.refresh_token = Some(refresh_token.to_string());
        }
        account.expires_at_ms = expires_at_ms;
        account.updated_at_ms = now_ms();
        true
    }
}

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn generate_account_id() -> String {
    let bytes: [u8; 16] = rand::random();
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Account, AccountData, ConnectionStore, now_ms};
    use crate::manager::STALENESS_MARGIN_MS;

    fn data(provider_account_id: &str, access_token: &str) -> AccountData {
        AccountData {
            provider_account_id: provider_account_id.to_string(),
            name: "Test Account".to_string(),
            email: Some("test@example.com".to_string()),
            username: Some("test".to_string()),
            access_token: access_token.to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at_ms: Some(now_ms() + 3_600_000),
        }
    }

    fn account_expiring_at(expires_at_ms: Option<i64>) -> Account {
        Account {
            id: "local-1".to_string(),
            provider_account_id: "ext-1".to_string(),
            name: "Test Account".to_string(),
            email: None,
            username: None,
            access_token: "tok".to_string(),
            refresh_token: None,
            expires_at_ms,
            created_at_ms: 0,
            updated_at_ms: 0,
        }
    }

    #[tokio::test]
    async fn add_creates_an_account_with_local_id_and_timestamps() {
        let store = ConnectionStore::new();
        let bucket = store.add_or_update("u1", "github", data("ext-1", "tok1")).await;

        assert_eq!(bucket.len(), 1);
        let account = &bucket[0];
        assert_eq!(account.id.len(), 32);
        assert_ne!(account.id, account.provider_account_id);
        assert_eq!(account.created_at_ms, account.updated_at_ms);
    }

    #[tokio::test]
    async fn reconnecting_the_same_external_account_merges_in_place() {
        let store = ConnectionStore::new();
        let first = store.add_or_update("u1", "github", data("ext-1", "tok1")).await;

        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = store.add_or_update("u1", "github", data("ext-1", "tok2")).await;

        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, first[0].id);
        assert_eq!(second[0].access_token, "tok2");
        assert_eq!(second[0].created_at_ms, first[0].created_at_ms);
        assert!(second[0].updated_at_ms > first[0].updated_at_ms);
    }

    #[tokio::test]
    async fn distinct_external_accounts_stay_separate() {
        let store = ConnectionStore::new();
        store.add_or_update("u1", "github", data("ext-1", "tok1")).await;
        let bucket = store.add_or_update("u1", "github", data("ext-2", "tok2")).await;

        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket[0].provider_account_id, "ext-1");
        assert_eq!(bucket[1].provider_account_id, "ext-2");
    }

    #[tokio::test]
    async fn lookups_are_empty_for_unknown_users_and_providers() {
        let store = ConnectionStore::new();
        assert!(store.all("nobody").await.is_empty());
        assert!(store.for_provider("nobody", "github").await.is_empty());
        assert!(store.summaries("nobody").await.is_empty());
    }

    #[tokio::test]
    async fn removing_the_last_account_leaves_an_empty_bucket() {
        let store = ConnectionStore::new();
        let bucket = store.add_or_update("u1", "github", data("ext-1", "tok1")).await;

        assert!(store.remove("u1", "github", &bucket[0].id).await);

        let all = store.all("u1").await;
        assert_eq!(all.get("github").map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn remove_is_false_for_missing_accounts() {
        let store = ConnectionStore::new();
        assert!(!store.remove("u1", "github", "nope").await);

        store.add_or_update("u1", "github", data("ext-1", "tok1")).await;
        assert!(!store.remove("u1", "github", "nope").await);
        assert_eq!(store.for_provider("u1", "github").await.len(), 1);
    }

    #[tokio::test]
    async fn apply_refresh_keeps_the_old_refresh_token_when_none_is_issued() {
        let store = ConnectionStore::new();
        let bucket = store.add_or_update("u1", "github", data("ext-1", "tok1")).await;

        let updated = store
            .apply_refresh("u1", "github", &bucket[0].id, "tok2", None, None)
            .await;
        assert!(updated);

        let account = &store.for_provider("u1", "github").await[0];
        assert_eq!(account.access_token, "tok2");
        assert_eq!(account.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(account.expires_at_ms, None);
    }

    #[tokio::test]
    async fn apply_refresh_takes_a_newly_issued_refresh_token() {
        let store = ConnectionStore::new();
        let bucket = store.add_or_update("u1", "github", data("ext-1", "tok1")).await;

        store
            .apply_refresh(
                "u1",
                "github",
                &bucket[0].id,
                "tok2",
                Some("refresh-2"),
                Some(now_ms() + 3_600_000),
            )
            .await;

        let account = &store.for_provider("u1", "github").await[0];
        assert_eq!(account.refresh_token.as_deref(), Some("refresh-2"));
    }

    #[tokio::test]
    async fn apply_refresh_is_false_when_the_account_vanished() {
        let store = ConnectionStore::new();
        let bucket = store.add_or_update("u1", "github", data("ext-1", "tok1")).await;
        store.remove("u1", "github", &bucket[0].id).await;

        let updated = store
            .apply_refresh("u1", "github", &bucket[0].id, "tok2", None, None)
            .await;
        assert!(!updated);
    }

    #[tokio::test]
    async fn summaries_carry_no_token_material() {
        let store = ConnectionStore::new();
        store.add_or_update("u1", "github", data("ext-1", "tok1")).await;

        let summaries = store.summaries("u1").await;
        let summary = &summaries["github"][0];
        assert_eq!(summary.provider_account_id, "ext-1");
        assert_eq!(summary.name, "Test Account");

        let json = serde_json::to_string(summary).unwrap();
        assert!(!json.contains("tok1"));
        assert!(!json.contains("refresh-1"));
    }

    #[test]
    fn account_expiring_inside_the_margin_is_stale() {
        let account = account_expiring_at(Some(now_ms() + 4 * 60 * 1000));
        assert!(account.is_stale(STALENESS_MARGIN_MS));
    }

    #[test]
    fn account_expiring_beyond_the_margin_is_fresh() {
        let account = account_expiring_at(Some(now_ms() + 6 * 60 * 1000));
        assert!(!account.is_stale(STALENESS_MARGIN_MS));
    }

    #[test]
    fn account_without_expiry_never_goes_stale() {
        let account = account_expiring_at(None);
        assert!(!account.is_stale(STALENESS_MARGIN_MS));
    }
}

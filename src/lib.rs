//! Multi-account OAuth 2.0 connection broker.
//!
//! Tracks per-user, per-provider OAuth credentials for a catalog of external
//! services, round-trips an opaque `state` value through the authorization
//! redirect, and refreshes access tokens on demand shortly before they
//! expire. All connection state lives in memory for the lifetime of the
//! process; callers own the HTTP routes and any persistence.

mod error;
mod exchange;
mod manager;
mod profile;
pub mod profiles;
mod registry;
mod state;
mod store;

pub use error::{ExchangeError, OAuthError};
pub use exchange::{TokenExchanger, TokenSet};
pub use manager::{ConnectionManager, STALENESS_MARGIN_MS};
pub use profile::{AccountProfile, HttpProfileFetcher, ProfileFetcher};
pub use profiles::ProfileApi;
pub use registry::{ProviderConfig, ProviderRegistry};
pub use state::AuthorizationState;
pub use store::{Account, AccountData, AccountSummary, ConnectionStore};

use serde_json::Value;

use crate::profile::AccountProfile;

/// How to ask one provider who an access token belongs to: the endpoint to
/// GET with the bearer token, and the projection of its response body.
pub trait ProfileApi: Send + Sync {
    fn endpoint(&self) -> &str;
    fn parse(&self, body: &Value) -> AccountProfile;
}

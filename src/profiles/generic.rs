use serde_json::Value;

use super::{ProfileApi, field};
use crate::profile::AccountProfile;

/// Fallback projection for providers without a dedicated mapping, trying
/// the field names most REST APIs use.
#[derive(Debug, Clone)]
pub struct GenericApi {
    endpoint: String,
}

impl GenericApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl ProfileApi for GenericApi {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse(&self, body: &Value) -> AccountProfile {
        AccountProfile {
            id: field(body, "/id")
                .or_else(|| field(body, "/user_id"))
                .unwrap_or_else(|| "unknown".to_string()),
            name: field(body, "/name")
                .or_else(|| field(body, "/display_name"))
                .or_else(|| field(body, "/username"))
                .unwrap_or_else(|| "Unknown".to_string()),
            username: field(body, "/username").or_else(|| field(body, "/login")),
            email: field(body, "/email"),
        }
    }
}

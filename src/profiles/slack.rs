use serde_json::Value;

use super::{ProfileApi, field};
use crate::profile::AccountProfile;

pub(super) const ENDPOINT: &str = "https://slack.com/api/users.identity";

#[derive(Debug, Clone)]
pub struct SlackApi {
    endpoint: String,
}

impl SlackApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl ProfileApi for SlackApi {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse(&self, body: &Value) -> AccountProfile {
        let name = field(body, "/user/name");
        AccountProfile {
            id: field(body, "/user/id").unwrap_or_else(|| "unknown".to_string()),
            name: name.clone().unwrap_or_else(|| "Unknown".to_string()),
            username: name,
            email: field(body, "/user/email"),
        }
    }
}

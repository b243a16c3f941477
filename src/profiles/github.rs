use serde_json::Value;

use super::{ProfileApi, field};
use crate::profile::AccountProfile;

pub(super) const ENDPOINT: &str = "https://api.github.com/user";

#[derive(Debug, Clone)]
pub struct GithubApi {
    endpoint: String,
}

impl GithubApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl ProfileApi for GithubApi {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse(&self, body: &Value) -> AccountProfile {
        let login = field(body, "/login");
        AccountProfile {
            id: field(body, "/id").unwrap_or_else(|| "unknown".to_string()),
            name: field(body, "/name")
                .or_else(|| login.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            username: login,
            email: field(body, "/email"),
        }
    }
}

use serde_json::Value;

use super::{ProfileApi, field};
use crate::profile::AccountProfile;

pub(super) const INSTAGRAM_ENDPOINT: &str =
    "https://graph.instagram.com/me?fields=id,username,account_type";
pub(super) const TIKTOK_ENDPOINT: &str = "https://open.tiktokapis.com/v2/user/info/";
pub(super) const LINKEDIN_ENDPOINT: &str = "https://api.linkedin.com/v2/me";

#[derive(Debug, Clone)]
pub struct InstagramApi {
    endpoint: String,
}

impl InstagramApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl ProfileApi for InstagramApi {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse(&self, body: &Value) -> AccountProfile {
        let username = field(body, "/username");
        AccountProfile {
            id: field(body, "/id").unwrap_or_else(|| "unknown".to_string()),
            name: username.clone().unwrap_or_else(|| "Unknown".to_string()),
            username,
            email: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TiktokApi {
    endpoint: String,
}

impl TiktokApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl ProfileApi for TiktokApi {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse(&self, body: &Value) -> AccountProfile {
        let display_name = field(body, "/data/user/display_name");
        AccountProfile {
            id: field(body, "/data/user/open_id").unwrap_or_else(|| "unknown".to_string()),
            name: display_name.clone().unwrap_or_else(|| "Unknown".to_string()),
            username: display_name,
            email: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinkedinApi {
    endpoint: String,
}

impl LinkedinApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl ProfileApi for LinkedinApi {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse(&self, body: &Value) -> AccountProfile {
        let name = match (
            field(body, "/localizedFirstName"),
            field(body, "/localizedLastName"),
        ) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => "Unknown".to_string(),
        };
        AccountProfile {
            id: field(body, "/id").unwrap_or_else(|| "unknown".to_string()),
            name,
            username: field(body, "/vanityName"),
            email: None,
        }
    }
}

use serde_json::Value;

use super::{ProfileApi, field};
use crate::profile::AccountProfile;

pub(super) const GMAIL_PROFILE_ENDPOINT: &str =
    "https://www.googleapis.com/gmail/v1/users/me/profile";
pub(super) const DRIVE_ABOUT_ENDPOINT: &str =
    "https://www.googleapis.com/drive/v3/about?fields=user";
pub(super) const CALENDAR_SETTINGS_ENDPOINT: &str =
    "https://www.googleapis.com/calendar/v3/users/me/settings";

/// Shared across the Google services: Drive-style responses nest the user
/// under `user`, the Gmail profile returns the fields at the top level. The
/// email address doubles as the account id.
#[derive(Debug, Clone)]
pub struct GoogleApi {
    endpoint: String,
}

impl GoogleApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl ProfileApi for GoogleApi {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse(&self, body: &Value) -> AccountProfile {
        let email = field(body, "/user/emailAddress").or_else(|| field(body, "/emailAddress"));
        let name = field(body, "/user/displayName").or_else(|| field(body, "/displayName"));
        AccountProfile {
            id: email.clone().unwrap_or_else(|| "unknown".to_string()),
            name: name.unwrap_or_else(|| "Unknown".to_string()),
            username: email.clone(),
            email,
        }
    }
}

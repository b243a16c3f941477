mod api;
mod generic;
mod github;
mod google;
mod slack;
mod social;

pub use api::ProfileApi;
pub use generic::GenericApi;
pub use github::GithubApi;
pub use google::GoogleApi;
pub use slack::SlackApi;
pub use social::{InstagramApi, LinkedinApi, TiktokApi};

use std::collections::HashMap;

use serde_json::Value;

/// Profile endpoints for the catalog providers whose responses fit the
/// generic id/name/username/email shape.
const GENERIC_ENDPOINTS: &[(&str, &str)] = &[
    ("pinterest", "https://api.pinterest.com/v5/user_account"),
    ("snapchat", "https://adsapi.snapchat.com/v1/me"),
    ("reddit", "https://oauth.reddit.com/api/v1/me"),
    (
        "youtube",
        "https://www.googleapis.com/youtube/v3/channels?part=snippet&mine=true",
    ),
    ("twitter", "https://api.twitter.com/2/users/me"),
    ("facebook", "https://graph.facebook.com/me?fields=id,name,email"),
    ("notion", "https://api.notion.com/v1/users/me"),
    ("trello", "https://api.trello.com/1/members/me"),
    ("linear", "https://api.linear.app/graphql"),
    ("gitlab", "https://gitlab.com/api/v4/user"),
    ("vercel", "https://api.vercel.com/v2/user"),
    ("railway", "https://backboard.railway.app/graphql/v2"),
    ("datadog", "https://api.datadoghq.com/api/v1/validate"),
    ("sentry", "https://sentry.io/api/0/users/me/"),
    ("mixpanel", "https://mixpanel.com/api/2.0/engage"),
    ("amplitude", "https://amplitude.com/api/2/userprofile"),
    ("stripe", "https://api.stripe.com/v1/account"),
    ("paypal", "https://api.paypal.com/v1/identity/oauth2/userinfo"),
    ("telegram", "https://api.telegram.org/bot"),
    ("sendgrid", "https://api.sendgrid.com/v3/user/profile"),
    ("twilio", "https://api.twilio.com/2010-04-01/Accounts.json"),
];

/// Mapping table for every catalog provider with a known profile endpoint.
pub(crate) fn default_apis() -> HashMap<String, Box<dyn ProfileApi>> {
    let mut apis: HashMap<String, Box<dyn ProfileApi>> = HashMap::new();

    apis.insert(
        "github".to_string(),
        Box::new(GithubApi::new(github::ENDPOINT)),
    );
    apis.insert("slack".to_string(), Box::new(SlackApi::new(slack::ENDPOINT)));
    apis.insert(
        "instagram".to_string(),
        Box::new(InstagramApi::new(social::INSTAGRAM_ENDPOINT)),
    );
    apis.insert(
        "tiktok".to_string(),
        Box::new(TiktokApi::new(social::TIKTOK_ENDPOINT)),
    );
    apis.insert(
        "linkedin".to_string(),
        Box::new(LinkedinApi::new(social::LINKEDIN_ENDPOINT)),
    );

    apis.insert(
        "gmail".to_string(),
        Box::new(GoogleApi::new(google::GMAIL_PROFILE_ENDPOINT)),
    );
    for id in ["google-drive", "google-sheets", "google-docs"] {
        apis.insert(
            id.to_string(),
            Box::new(GoogleApi::new(google::DRIVE_ABOUT_ENDPOINT)),
        );
    }
    apis.insert(
        "google-calendar".to_string(),
        Box::new(GoogleApi::new(google::CALENDAR_SETTINGS_ENDPOINT)),
    );

    for (id, endpoint) in GENERIC_ENDPOINTS {
        apis.insert((*id).to_string(), Box::new(GenericApi::new(*endpoint)));
    }

    apis
}

/// Reads a string at `pointer`, accepting numbers as well since several
/// providers use numeric account ids.
pub(crate) fn field(body: &Value, pointer: &str) -> Option<String> {
    match body.pointer(pointer)? {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

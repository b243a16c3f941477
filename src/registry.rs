use crate::OAuthError;

/// OAuth endpoints and credentials for one provider. Built once at startup
/// and never mutated afterwards.
///
/// Scope strings are passed to the provider verbatim: most providers take a
/// comma-delimited list, Google services take space-delimited URLs, and a
/// few (snapchat, stripe) take a single token. Credentials are optional at
/// construction time; operations that need them fail with
/// [`OAuthError::MissingCredentials`] at the point of use.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub id: String,
    pub authorize_url: String,
    pub token_url: String,
    pub scope: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl ProviderConfig {
    pub fn new(
        id: impl Into<String>,
        authorize_url: impl Into<String>,
        token_url: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            authorize_url: authorize_url.into(),
            token_url: token_url.into(),
            scope: scope.into(),
            client_id: None,
            client_secret: None,
        }
    }

    pub fn with_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Both credential halves, or `MissingCredentials` when either is absent.
    pub fn credentials(&self) -> Result<(&str, &str), OAuthError> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(client_id), Some(client_secret)) => Ok((client_id, client_secret)),
            _ => Err(OAuthError::MissingCredentials(self.id.clone())),
        }
    }
}

/// Lookup table of every provider the process knows how to talk to.
/// Iteration order is registration order.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderConfig>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full built-in catalog, with credentials read from each provider's
    /// environment variables. Unset (or empty) variables leave the provider
    /// listed but unusable until credentials are supplied.
    pub fn from_env() -> Self {
        let providers = DEFAULT_CATALOG
            .iter()
            .map(|entry| ProviderConfig {
                id: entry.id.to_string(),
                authorize_url: entry.authorize_url.to_string(),
                token_url: entry.token_url.to_string(),
                scope: entry.scope.to_string(),
                client_id: env_credential(entry.client_id_env),
                client_secret: env_credential(entry.client_secret_env),
            })
            .collect();
        Self { providers }
    }

    /// Adds a provider. An entry with the same id is replaced in place,
    /// keeping its position in the iteration order.
    pub fn register(&mut self, config: ProviderConfig) {
        match self.providers.iter_mut().find(|entry| entry.id == config.id) {
            Some(entry) => *entry = config,
            None => self.providers.push(config),
        }
    }

    pub fn has(&self, provider_id: &str) -> bool {
        self.providers.iter().any(|entry| entry.id == provider_id)
    }

    pub fn get(&self, provider_id: &str) -> Result<&ProviderConfig, OAuthError> {
        self.providers
            .iter()
            .find(|entry| entry.id == provider_id)
            .ok_or_else(|| OAuthError::UnknownProvider(provider_id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|entry| entry.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

fn env_credential(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

struct CatalogEntry {
    id: &'static str,
    authorize_url: &'static str,
    token_url: &'static str,
    scope: &'static str,
    client_id_env: &'static str,
    client_secret_env: &'static str,
}

const DEFAULT_CATALOG: &[CatalogEntry] = &[
    // Social media
    CatalogEntry {
        id: "instagram",
        authorize_url: "https://api.instagram.com/oauth/authorize",
        token_url: "https://api.instagram.com/oauth/access_token",
        scope: "user_profile,user_media,instagram_basic,instagram_content_publish,instagram_manage_comments,instagram_manage_insights",
        client_id_env: "INSTAGRAM_CLIENT_ID",
        client_secret_env: "INSTAGRAM_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "tiktok",
        authorize_url: "https://www.tiktok.com/auth/authorize/",
        token_url: "https://open-api.tiktok.com/oauth/access_token/",
        scope: "user.info.basic,video.list,video.upload",
        client_id_env: "TIKTOK_CLIENT_KEY",
        client_secret_env: "TIKTOK_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "linkedin",
        authorize_url: "https://www.linkedin.com/oauth/v2/authorization",
        token_url: "https://www.linkedin.com/oauth/v2/accessToken",
        scope: "r_liteprofile,r_emailaddress,w_member_social,r_organization_social,w_organization_social",
        client_id_env: "LINKEDIN_CLIENT_ID",
        client_secret_env: "LINKEDIN_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "pinterest",
        authorize_url: "https://www.pinterest.com/oauth/",
        token_url: "https://api.pinterest.com/v5/oauth/token",
        scope: "boards:read,boards:write,pins:read,pins:write,user_accounts:read",
        client_id_env: "PINTEREST_APP_ID",
        client_secret_env: "PINTEREST_APP_SECRET",
    },
    CatalogEntry {
        id: "snapchat",
        authorize_url: "https://accounts.snapchat.com/login/oauth2/authorize",
        token_url: "https://accounts.snapchat.com/login/oauth2/access_token",
        scope: "snapchat-marketing-api",
        client_id_env: "SNAPCHAT_CLIENT_ID",
        client_secret_env: "SNAPCHAT_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "reddit",
        authorize_url: "https://www.reddit.com/api/v1/authorize",
        token_url: "https://www.reddit.com/api/v1/access_token",
        scope: "identity,edit,flair,history,modconfig,modflair,modlog,modposts,modwiki,mysubreddits,privatemessages,read,report,save,submit,subscribe,vote,wikiedit,wikiread",
        client_id_env: "REDDIT_CLIENT_ID",
        client_secret_env: "REDDIT_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "youtube",
        authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
        token_url: "https://oauth2.googleapis.com/token",
        scope: "https://www.googleapis.com/auth/youtube https://www.googleapis.com/auth/youtube.upload https://www.googleapis.com/auth/youtubepartner",
        client_id_env: "GOOGLE_CLIENT_ID",
        client_secret_env: "GOOGLE_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "twitter",
        authorize_url: "https://twitter.com/i/oauth2/authorize",
        token_url: "https://api.twitter.com/2/oauth2/token",
        scope: "tweet.read,tweet.write,users.read,follows.read,follows.write,offline.access",
        client_id_env: "TWITTER_CLIENT_ID",
        client_secret_env: "TWITTER_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "facebook",
        authorize_url: "https://www.facebook.com/v18.0/dialog/oauth",
        token_url: "https://graph.facebook.com/v18.0/oauth/access_token",
        scope: "pages_manage_posts,pages_read_engagement,pages_manage_metadata,pages_read_user_content,pages_manage_ads",
        client_id_env: "FACEBOOK_APP_ID",
        client_secret_env: "FACEBOOK_APP_SECRET",
    },
    // Google services
    CatalogEntry {
        id: "gmail",
        authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
        token_url: "https://oauth2.googleapis.com/token",
        scope: "https://www.googleapis.com/auth/gmail.modify https://www.googleapis.com/auth/gmail.compose https://www.googleapis.com/auth/gmail.send",
        client_id_env: "GOOGLE_CLIENT_ID",
        client_secret_env: "GOOGLE_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "google-drive",
        authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
        token_url: "https://oauth2.googleapis.com/token",
        scope: "https://www.googleapis.com/auth/drive",
        client_id_env: "GOOGLE_CLIENT_ID",
        client_secret_env: "GOOGLE_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "google-calendar",
        authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
        token_url: "https://oauth2.googleapis.com/token",
        scope: "https://www.googleapis.com/auth/calendar",
        client_id_env: "GOOGLE_CLIENT_ID",
        client_secret_env: "GOOGLE_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "google-sheets",
        authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
        token_url: "https://oauth2.googleapis.com/token",
        scope: "https://www.googleapis.com/auth/spreadsheets",
        client_id_env: "GOOGLE_CLIENT_ID",
        client_secret_env: "GOOGLE_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "google-docs",
        authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
        token_url: "https://oauth2.googleapis.com/token",
        scope: "https://www.googleapis.com/auth/documents",
        client_id_env: "GOOGLE_CLIENT_ID",
        client_secret_env: "GOOGLE_CLIENT_SECRET",
    },
    // Productivity
    CatalogEntry {
        id: "slack",
        authorize_url: "https://slack.com/oauth/v2/authorize",
        token_url: "https://slack.com/api/oauth.v2.access",
        scope: "channels:read,channels:write,chat:write,files:read,files:write,users:read",
        client_id_env: "SLACK_CLIENT_ID",
        client_secret_env: "SLACK_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "notion",
        authorize_url: "https://api.notion.com/v1/oauth/authorize",
        token_url: "https://api.notion.com/v1/oauth/token",
        scope: "read_content,update_content,insert_content",
        client_id_env: "NOTION_CLIENT_ID",
        client_secret_env: "NOTION_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "trello",
        authorize_url: "https://trello.com/1/authorize",
        token_url: "https://trello.com/1/OAuthGetAccessToken",
        scope: "read,write,account",
        client_id_env: "TRELLO_API_KEY",
        client_secret_env: "TRELLO_API_SECRET",
    },
    CatalogEntry {
        id: "linear",
        authorize_url: "https://linear.app/oauth/authorize",
        token_url: "https://api.linear.app/oauth/token",
        scope: "read,write",
        client_id_env: "LINEAR_CLIENT_ID",
        client_secret_env: "LINEAR_CLIENT_SECRET",
    },
    // Development
    CatalogEntry {
        id: "github",
        authorize_url: "https://github.com/login/oauth/authorize",
        token_url: "https://github.com/login/oauth/access_token",
        scope: "repo,user,admin:org,workflow",
        client_id_env: "GITHUB_CLIENT_ID",
        client_secret_env: "GITHUB_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "gitlab",
        authorize_url: "https://gitlab.com/oauth/authorize",
        token_url: "https://gitlab.com/oauth/token",
        scope: "api,read_user,write_repository",
        client_id_env: "GITLAB_CLIENT_ID",
        client_secret_env: "GITLAB_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "vercel",
        authorize_url: "https://vercel.com/oauth/authorize",
        token_url: "https://api.vercel.com/v2/oauth/access_token",
        scope: "deployments,projects",
        client_id_env: "VERCEL_CLIENT_ID",
        client_secret_env: "VERCEL_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "railway",
        authorize_url: "https://railway.app/oauth/authorize",
        token_url: "https://railway.app/oauth/token",
        scope: "read,write",
        client_id_env: "RAILWAY_CLIENT_ID",
        client_secret_env: "RAILWAY_CLIENT_SECRET",
    },
    // Monitoring
    CatalogEntry {
        id: "datadog",
        authorize_url: "https://app.datadoghq.com/oauth2/v1/authorize",
        token_url: "https://app.datadoghq.com/oauth2/v1/token",
        scope: "metrics_read,metrics_write,logs_read,logs_write",
        client_id_env: "DATADOG_CLIENT_ID",
        client_secret_env: "DATADOG_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "sentry",
        authorize_url: "https://sentry.io/oauth/authorize/",
        token_url: "https://sentry.io/oauth/token/",
        scope: "project:read,project:write,event:read",
        client_id_env: "SENTRY_CLIENT_ID",
        client_secret_env: "SENTRY_CLIENT_SECRET",
    },
    // Analytics
    CatalogEntry {
        id: "mixpanel",
        authorize_url: "https://mixpanel.com/oauth/authorize",
        token_url: "https://mixpanel.com/oauth/access_token",
        scope: "read,write",
        client_id_env: "MIXPANEL_CLIENT_ID",
        client_secret_env: "MIXPANEL_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "amplitude",
        authorize_url: "https://amplitude.com/oauth/authorize",
        token_url: "https://amplitude.com/oauth/token",
        scope: "read,write",
        client_id_env: "AMPLITUDE_CLIENT_ID",
        client_secret_env: "AMPLITUDE_CLIENT_SECRET",
    },
    // Finance
    CatalogEntry {
        id: "stripe",
        authorize_url: "https://connect.stripe.com/oauth/authorize",
        token_url: "https://connect.stripe.com/oauth/token",
        scope: "read_write",
        client_id_env: "STRIPE_CLIENT_ID",
        client_secret_env: "STRIPE_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "paypal",
        authorize_url: "https://www.paypal.com/signin/authorize",
        token_url: "https://api.paypal.com/v1/oauth2/token",
        scope: "openid,profile,email",
        client_id_env: "PAYPAL_CLIENT_ID",
        client_secret_env: "PAYPAL_CLIENT_SECRET",
    },
    // Communication
    CatalogEntry {
        id: "telegram",
        authorize_url: "https://oauth.telegram.org/auth",
        token_url: "https://oauth.telegram.org/auth/request",
        scope: "bot",
        client_id_env: "TELEGRAM_BOT_TOKEN",
        client_secret_env: "TELEGRAM_BOT_TOKEN",
    },
    CatalogEntry {
        id: "sendgrid",
        authorize_url: "https://sendgrid.com/oauth/authorize",
        token_url: "https://api.sendgrid.com/v3/oauth/token",
        scope: "mail.send,mail.batch.send",
        client_id_env: "SENDGRID_CLIENT_ID",
        client_secret_env: "SENDGRID_CLIENT_SECRET",
    },
    CatalogEntry {
        id: "twilio",
        authorize_url: "https://www.twilio.com/authorize",
        token_url: "https://api.twilio.com/oauth/token",
        scope: "sms,voice",
        client_id_env: "TWILIO_CLIENT_ID",
        client_secret_env: "TWILIO_CLIENT_SECRET",
    },
];

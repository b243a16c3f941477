use thiserror::Error;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("missing client credentials for provider {0}")]
    MissingCredentials(String),

    #[error("invalid state parameter: {0}")]
    InvalidState(String),

    #[error("provider mismatch (expected={expected}, received={received})")]
    ProviderMismatch { expected: String, received: String },

    #[error("token exchange with {provider} failed: {source}")]
    Exchange {
        provider: String,
        #[source]
        source: ExchangeError,
    },

    #[error("no connected {provider} account matches the request")]
    NoSuchAccount { provider: String },

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Why a token endpoint call failed. Carried inside [`OAuthError::Exchange`]
/// together with the provider id so callers can log both.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid token response: {message}")]
    InvalidResponse { message: String, body: String },

    #[error("stored account has no refresh token")]
    NoRefreshToken,
}

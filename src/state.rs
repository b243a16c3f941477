use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;

use crate::OAuthError;

const DELIMITER: char = ':';
const FIELDS: usize = 3;

/// Value round-tripped through the provider's authorization redirect as the
/// OAuth2 `state` parameter.
///
/// Encodes as `userId:providerId:timestampMillis`, base64 with the URL-safe
/// alphabet and no padding. The token is not signed and not tracked server
/// side: a callback presenting a value that decodes cleanly is trusted at
/// face value, and the embedded timestamp is informational only (decoding
/// does not reject old values). The provider cross-check performed by the
/// connection manager is the only forgery detection applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationState {
    pub user_id: String,
    pub provider_id: String,
    pub issued_at_ms: i64,
}

impl AuthorizationState {
    /// Binds a user and provider to the current timestamp.
    pub fn new(user_id: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            provider_id: provider_id.into(),
            issued_at_ms: Utc::now().timestamp_millis(),
        }
    }

    pub fn encode(&self) -> String {
        let raw = format!(
            "{}{DELIMITER}{}{DELIMITER}{}",
            self.user_id, self.provider_id, self.issued_at_ms
        );
        URL_SAFE_NO_PAD.encode(raw)
    }

    pub fn decode(token: &str) -> Result<Self, OAuthError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|err| OAuthError::InvalidState(err.to_string()))?;
        let raw = String::from_utf8(bytes)
            .map_err(|_| OAuthError::InvalidState("payload is not utf-8".to_string()))?;

        let fields: Vec<&str> = raw.split(DELIMITER).collect();
        if fields.len() != FIELDS {
            return Err(OAuthError::InvalidState(format!(
                "expected {FIELDS} fields, found {}",
                fields.len()
            )));
        }

        let issued_at_ms = fields[2]
            .parse()
            .map_err(|_| OAuthError::InvalidState("timestamp is not an integer".to_string()))?;

        Ok(Self {
            user_id: fields[0].to_string(),
            provider_id: fields[1].to_string(),
            issued_at_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

    use super::AuthorizationState;
    use crate::OAuthError;

    #[test]
    fn round_trip_preserves_user_and_provider() {
        let state = AuthorizationState::new("user-42", "github");
        let decoded = AuthorizationState::decode(&state.encode()).unwrap();

        assert_eq!(decoded.user_id, "user-42");
        assert_eq!(decoded.provider_id, "github");
        assert_eq!(decoded.issued_at_ms, state.issued_at_ms);
    }

    #[test]
    fn encoded_state_is_url_safe() {
        let token = AuthorizationState::new("user/+=42", "google-drive").encode();
        assert!(!token.contains('='), "state should be unpadded");
        assert!(!token.contains('+'), "state should be url safe");
        assert!(!token.contains('/'), "state should be url safe");
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        let result = AuthorizationState::decode("%%%not-base64%%%");
        assert!(matches!(result, Err(OAuthError::InvalidState(_))));
    }

    #[test]
    fn decode_rejects_wrong_field_count() {
        let two = URL_SAFE_NO_PAD.encode("user-42:github");
        assert!(matches!(
            AuthorizationState::decode(&two),
            Err(OAuthError::InvalidState(_))
        ));

        let four = URL_SAFE_NO_PAD.encode("user:42:github:1700000000000");
        assert!(matches!(
            AuthorizationState::decode(&four),
            Err(OAuthError::InvalidState(_))
        ));
    }

    #[test]
    fn decode_rejects_non_integer_timestamp() {
        let token = URL_SAFE_NO_PAD.encode("user-42:github:soon");
        assert!(matches!(
            AuthorizationState::decode(&token),
            Err(OAuthError::InvalidState(_))
        ));
    }

    #[test]
    fn decode_does_not_expire_old_state() {
        let stale = AuthorizationState {
            user_id: "user-42".to_string(),
            provider_id: "github".to_string(),
            issued_at_ms: 1,
        };
        let decoded = AuthorizationState::decode(&stale.encode()).unwrap();
        assert_eq!(decoded.issued_at_ms, 1);
    }
}

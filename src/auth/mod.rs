pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{SecurityConfig, MAX_TOKEN_EXPIRY_MINUTES};

/// Claims carried by a session token. Only the subject is trusted; the user
/// record itself is re-read on every request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, horizon: Duration) -> Result<Self, TokenError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(horizon)
            .ok_or_else(|| TokenError::Generation("token expiry out of range".to_string()))?;

        Ok(Self {
            sub: user_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    Expired,

    #[error("Token generation error: {0}")]
    Generation(String),
}

/// Issues and validates HS256 bearer tokens with a key fixed at startup.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    horizon: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("horizon_minutes", &self.horizon.num_minutes())
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, horizon: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            horizon,
        }
    }

    /// Lifetimes outside `1..=MAX_TOKEN_EXPIRY_MINUTES` are clamped; `validate`
    /// rejects them before a server starts.
    pub fn from_config(security: &SecurityConfig) -> Self {
        let minutes = security.token_expiry_minutes.clamp(1, MAX_TOKEN_EXPIRY_MINUTES);
        Self::new(&security.jwt_secret, Duration::minutes(minutes))
    }

    pub fn horizon(&self) -> Duration {
        self.horizon
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        let claims = Claims::new(user_id, self.horizon)?;
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Verifies signature and expiry and returns the embedded user id.
    pub fn validate(&self, token: &str) -> Result<Uuid, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::minutes(30))
    }

    #[test]
    fn issued_token_round_trips_user_id() {
        let tokens = service();
        let user_id = Uuid::new_v4();

        let token = tokens.issue(user_id).unwrap();
        assert_eq!(tokens.validate(&token), Ok(user_id));
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let tokens = service();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: (Utc::now() - Duration::hours(2)).timestamp(),
            exp: (Utc::now() - Duration::hours(1)).timestamp(),
        };
        let token = tokens.sign(&claims).unwrap();

        assert_eq!(tokens.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_signed_with_other_key_is_invalid() {
        let other = TokenService::new("another-secret", Duration::minutes(30));
        let token = other.issue(Uuid::new_v4()).unwrap();

        assert_eq!(service().validate(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn garbage_is_invalid() {
        let tokens = service();
        assert_eq!(tokens.validate("not-a-jwt"), Err(TokenError::InvalidToken));
        assert_eq!(tokens.validate(""), Err(TokenError::InvalidToken));
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let tokens = service();
        let token = tokens.issue(Uuid::new_v4()).unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let replacement = service().issue(Uuid::new_v4()).unwrap();
        parts[1] = replacement.split('.').nth(1).unwrap().to_string();
        let forged = parts.join(".");

        assert_eq!(tokens.validate(&forged), Err(TokenError::InvalidToken));
    }

    #[test]
    fn expiry_follows_configured_horizon() {
        let tokens = TokenService::new("test-secret", Duration::minutes(43_200));
        let claims = Claims::new(Uuid::new_v4(), tokens.horizon()).unwrap();
        assert_eq!(claims.exp - claims.iat, 43_200 * 60);
    }

    #[test]
    fn unrepresentable_expiry_fails_to_issue() {
        let tokens = TokenService::new("test-secret", Duration::MAX);
        assert!(matches!(tokens.issue(Uuid::new_v4()), Err(TokenError::Generation(_))));
    }

    #[test]
    fn configured_expiry_is_clamped() {
        let security = SecurityConfig {
            jwt_secret: "test-secret".to_string(),
            token_expiry_minutes: i64::MAX,
            cors_origins: Vec::new(),
        };
        let tokens = TokenService::from_config(&security);
        assert_eq!(tokens.horizon(), Duration::minutes(MAX_TOKEN_EXPIRY_MINUTES));
        assert!(tokens.issue(Uuid::new_v4()).is_ok());
    }
}

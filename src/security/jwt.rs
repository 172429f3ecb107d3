use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::config::AuthConfig;
use crate::directory::User;

pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
}

/// Identity snapshot at issue time. Access decisions re-read the user, so
/// `is_admin` and `role` here are informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub is_admin: bool,
    pub role: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Invalid)
    }
}

pub struct TokenService {
    issuer: String,
    audience: String,
    ttl: Duration,
    leeway_secs: u64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let secret = config.jwt_secret();
        if secret.len() < MIN_SECRET_LEN {
            return Err(anyhow!(
                "JWT secret must be at least {MIN_SECRET_LEN} characters"
            ));
        }

        Ok(Self {
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::hours(config.token_ttl_hours),
            leeway_secs: config.leeway_secs,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            role: user.role.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| anyhow!("Failed to encode access token: {e}"))
    }

    pub fn resolve(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway_secs;
        validation.validate_nbf = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {e}");
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid,
                }
            })
    }
}

pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: Some(secret.to_string()),
            ..AuthConfig::default()
        }
    }

    fn create_test_service() -> TokenService {
        TokenService::new(&config(
            "this-is-a-very-long-secret-key-for-testing-purposes-only",
        ))
        .expect("Failed to create token service")
    }

    fn sample_user() -> User {
        let mut user = User::new("Admin", "admin@helpdesk.local", Utc::now());
        user.is_admin = true;
        user.role = "admin".to_string();
        user
    }

    #[test]
    fn test_issue_and_resolve() {
        let service = create_test_service();
        let user = sample_user();

        let token = service.issue(&user).expect("Failed to issue");
        let claims = service.resolve(&token).expect("Validation failed");

        assert_eq!(claims.user_id().expect("Invalid user ID"), user.id);
        assert_eq!(claims.email, "admin@helpdesk.local");
        assert!(claims.is_admin);
        assert_eq!(claims.exp - claims.iat, 8 * 3600);
    }

    #[test]
    fn test_unique_jti() {
        let service = create_test_service();
        let user = sample_user();
        let first = service.resolve(&service.issue(&user).expect("issue")).expect("resolve");
        let second = service.resolve(&service.issue(&user).expect("issue")).expect("resolve");
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_expired_token() {
        let service = create_test_service();
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "old@example.com".into(),
            is_admin: false,
            role: "user".into(),
            iss: service.issuer.clone(),
            aud: service.audience.clone(),
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(10)).timestamp(),
            nbf: (now - Duration::hours(10)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = service.sign(&claims).expect("sign");

        assert_eq!(service.resolve(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let service = create_test_service();
        let other = TokenService::new(&config("another-secret-that-is-also-long-enough-123"))
            .expect("other service");
        let token = other.issue(&sample_user()).expect("issue");

        assert_eq!(service.resolve(&token).unwrap_err(), TokenError::Invalid);
        assert_eq!(service.resolve("garbage").unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_wrong_audience_is_invalid() {
        let service = create_test_service();
        let mut foreign = config("this-is-a-very-long-secret-key-for-testing-purposes-only");
        foreign.audience = "someone-else".into();
        let token = TokenService::new(&foreign)
            .expect("service")
            .issue(&sample_user())
            .expect("issue");

        assert_eq!(service.resolve(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(TokenService::new(&config("too-short")).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic xyz"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}

use super::config::JwtConfig;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Default token time-to-live (24 hours)
pub const TOKEN_TTL: i64 = 86400;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // Subject (user ID)
    pub username: String,
    pub is_admin: bool,
    pub exp: i64,       // Expiration time
    pub iat: i64,       // Issued at
}

/// The authenticated principal for the current request.
///
/// Inserted into request extensions by the auth middleware; handlers receive
/// it as an extractor. Anonymous routes simply do not declare it.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| {
                AppError::Unauthorized("Authentication required".to_string()).into_response()
            })
    }
}

/// Stateless HS256 JWT signer/verifier.
#[derive(Clone)]
pub struct JwtAuth {
    secret: String,
    ttl_seconds: i64,
}

impl JwtAuth {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl_seconds: TOKEN_TTL,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            ttl_seconds: config.ttl_seconds,
        }
    }

    /// Create a signed token for the given user.
    pub fn issue(&self, user_id: Uuid, username: &str, is_admin: bool) -> eyre::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            is_admin,
            exp: (now + Duration::seconds(self.ttl_seconds)).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Verify a token's signature and expiry and return its claims.
    pub fn verify(&self, token: &str) -> eyre::Result<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(data.claims)
    }

    /// Verify a token and resolve it to a principal.
    pub fn principal(&self, token: &str) -> eyre::Result<CurrentUser> {
        let claims = self.verify(token)?;
        let id = Uuid::parse_str(&claims.sub)?;

        Ok(CurrentUser {
            id,
            username: claims.username,
            is_admin: claims.is_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_round_trip() {
        let auth = JwtAuth::new("test-secret");
        let id = Uuid::now_v7();

        let token = auth.issue(id, "alice", false).unwrap();
        let claims = auth.verify(&token).unwrap();

        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.username, "alice");
        assert!(!claims.is_admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let auth = JwtAuth::new("test-secret");
        let other = JwtAuth::new("other-secret");

        let token = auth.issue(Uuid::now_v7(), "alice", false).unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_principal_carries_admin_flag() {
        let auth = JwtAuth::new("test-secret");
        let id = Uuid::now_v7();

        let token = auth.issue(id, "root", true).unwrap();
        let principal = auth.principal(&token).unwrap();

        assert_eq!(principal.id, id);
        assert!(principal.is_admin);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let auth = JwtAuth::new("test-secret");
        assert!(auth.verify("not-a-token").is_err());
    }
}

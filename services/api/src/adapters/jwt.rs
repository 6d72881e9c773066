//! services/api/src/adapters/jwt.rs
//!
//! HS256 session tokens implementing the `TokenService` port.

use std::time::Duration;

use dealership_core::domain::{Role, Subject};
use dealership_core::ports::{PortError, PortResult, TokenService};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the account id.
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token id, so two logins within one second still differ.
    pub jti: String,
}

pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &str, expiry: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry,
        }
    }
}

impl TokenService for JwtTokenService {
    fn sign(&self, subject: &Subject) -> PortResult<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: subject.id,
            email: subject.email.clone(),
            role: subject.role,
            exp: now.saturating_add(i64::try_from(self.expiry.as_secs()).unwrap_or(i64::MAX)),
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| PortError::Unexpected(format!("Failed to sign token: {e}")))
    }

    fn verify(&self, token: &str) -> PortResult<Subject> {
        // HS256, validates exp.
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| PortError::Unauthorized)?;
        Ok(Subject {
            id: data.claims.sub,
            email: data.claims.email,
            role: data.claims.role,
        })
    }
}

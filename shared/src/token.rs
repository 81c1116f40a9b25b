use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lambda_http::Request;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Fixed token lifetime.
const TOKEN_TTL_HOURS: i64 = 1;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Username — the identity subject.
    pub sub: String,
    /// User id, needed to key persisted predictions.
    pub uid: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(username: String, user_id: String) -> Self {
        let now = Utc::now();
        Self {
            sub: username,
            uid: user_id,
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        }
    }
}

/// A caller whose bearer token passed full verification.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}

/// Issues and verifies HS256 identity tokens.
///
/// Verification always checks signature and expiry — an expired or forged
/// token resolves to anonymous on the inference path, it is never treated
/// as a valid identity.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
        }
    }

    pub fn issue(&self, username: &str, user_id: &str) -> Result<String, ApiError> {
        let claims = Claims::new(username.to_string(), user_id.to_string());
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            ApiError::Service
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::Auth("invalid or expired token".to_string()))
    }

    /// Best-effort identity extraction from the Authorization header.
    /// Absent, malformed, expired, or badly signed tokens all resolve to
    /// `None` (anonymous) rather than a rejection.
    pub fn identity_from_request(&self, event: &Request) -> Option<Identity> {
        let header = event.headers().get("Authorization")?.to_str().ok()?;
        let token = header.strip_prefix("Bearer ")?;
        let claims = self.verify(token).ok()?;
        Some(Identity {
            user_id: claims.uid,
            username: claims.sub,
        })
    }
}

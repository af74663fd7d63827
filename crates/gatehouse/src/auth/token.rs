//! Token issuance and validation.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::AuthError;
use crate::store::{Role, UserRecord};

/// Default token lifetime in seconds (1 hour). Overridable via
/// `auth.token_ttl_secs`.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Identity claims embedded in issued tokens.
///
/// Tokens are self-contained; downstream authorization trusts these fields
/// and nothing is stored server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (personnel record ID).
    pub sub: String,
    /// User's email.
    pub email: String,
    /// User's role.
    pub role: Role,
    /// Organizational unit the user belongs to.
    pub org_unit_id: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Unique token id. `iat` has one-second resolution, so without it two
    /// issuances in the same second would be byte-identical.
    pub jti: String,
}

/// Issues and validates HS256 bearer tokens.
///
/// The signing secret is an explicit constructor dependency, resolved once at
/// startup; a missing secret is a startup failure, never a per-request one.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    ttl_secs: i64,
}

impl TokenIssuer {
    /// Create an issuer from the resolved signing secret.
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            ttl_secs,
        }
    }

    /// Token lifetime in seconds.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a signed token carrying the record's identity claims.
    pub fn issue(&self, record: &UserRecord) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: record.id.clone(),
            email: record.email.clone(),
            role: record.role,
            org_unit_id: record.org_unit_id.clone(),
            exp: now + self.ttl_secs,
            iat: now,
            jti: nanoid::nanoid!(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("signing token: {e}")))
    }

    /// Validate a token and return its claims.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.required_spec_claims.clear(); // no iss/aud in our tokens

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            warn!("token validation failed: {:?}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(data.claims)
    }
}

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// The authenticated user's id. The only thing a token binds.
    pub sub: Uuid,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, lifetime_days: i64) -> Self {
        Self {
            sub: user_id,
            exp: (Utc::now() + Duration::days(lifetime_days)).timestamp(),
        }
    }
}

/// Expired tokens are reported separately so the API can answer
/// "Token expired" rather than a generic invalid-token message.
#[derive(Debug, PartialEq)]
pub enum TokenError {
    Expired,
    Invalid,
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("JWT encode failed: {e}"))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}

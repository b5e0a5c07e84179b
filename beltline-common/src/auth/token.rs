//! Bearer token issuance and validation (HS256)

use crate::{Error, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Token payload; also returned verbatim to the client on login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    /// Expiration as a Unix timestamp
    pub exp: i64,
}

/// Issue a signed token for a user, expiring `ttl_secs` from now
pub fn issue_token(secret: &str, user_id: i64, ttl_secs: i64) -> Result<(Claims, String)> {
    let claims = Claims {
        user_id,
        exp: Utc::now().timestamp() + ttl_secs,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))?;
    Ok((claims, token))
}

/// Validate a token and return its claims
///
/// Every failure maps to `Unauthorized` with a caller-facing message; the
/// signature, expiration, and required claims are all checked.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims> {
    let mut validation = Validation::default();
    validation.set_required_spec_claims(&["exp"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        use jsonwebtoken::errors::ErrorKind;
        let message = match e.kind() {
            ErrorKind::ExpiredSignature => "Token has expired".to_string(),
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                "Token is malformed".to_string()
            }
            ErrorKind::MissingRequiredClaim(claim) => {
                format!("Token is missing required claim: {}", claim)
            }
            _ => "Token invalid".to_string(),
        };
        Error::Unauthorized(message)
    })
}

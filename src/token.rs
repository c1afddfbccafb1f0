//! Token service: issues and verifies signed, stateless session tokens.
//!
//! Tokens are HS256 JWTs carrying the subject id, the role **as a snapshot at
//! issuance time**, and an absolute expiry. The role is not re-validated against
//! the account's current role on later requests; a promotion or demotion takes
//! effect when the principal next logs in.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::models::Role;

/// Claims
///
/// Represents the standard payload structure expected inside a session JWT.
/// These claims are signed by the server's secret and validated upon every
/// authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): The UUID of the account the token was issued for.
    pub sub: Uuid,
    /// The account's role at issuance time, serialized UPPERCASE.
    pub role: Role,
    /// Expiration Time (exp): Timestamp after which the JWT must not be accepted.
    pub exp: usize,
    /// Issued At (iat): Timestamp when the JWT was issued.
    pub iat: usize,
}

fn unix_now() -> usize {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0)
}

/// issue
///
/// Produces a signed token with embedded subject id, role, and absolute expiry
/// `now + ttl_secs`. The token is opaque and tamper-evident: any bit flip
/// invalidates the signature.
pub fn issue(
    subject: Uuid,
    role: Role,
    ttl_secs: u64,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = unix_now();
    let claims = Claims {
        sub: subject,
        role,
        iat: now,
        exp: now + ttl_secs as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// verify
///
/// Checks signature validity and that the current time is strictly before the
/// embedded expiry. Every failure cause (expired, malformed, tampered) collapses
/// into the single `None` outcome so callers cannot probe validation internals.
pub fn verify(token: &str, secret: &str) -> Option<Claims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;
    // No clock-skew grace: a token issued with ttl=0 must already be expired.
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &decoding_key, &validation).ok()?;

    // Expiry is exclusive of "now".
    if token_data.claims.exp <= unix_now() {
        return None;
    }

    Some(token_data.claims)
}

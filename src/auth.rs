use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::{config::AppConfig, error::ApiError, models::Role, token};

/// AuthUser
///
/// The resolved identity (principal) of an authenticated request, and the core
/// output of the extractor implementation below. Handlers use this struct to
/// identify the caller and evaluate authorization predicates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthUser {
    /// The unique identifier of the account the session token was issued for.
    pub id: Uuid,
    /// The account's role **as embedded at token issuance**. A role change made
    /// after issuance is not visible here until the principal re-authenticates.
    pub role: Role,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a function
/// argument in any authenticated handler. This cleanly separates authentication
/// (extractor) from business logic (the handler).
///
/// The gate is a pure function of (request, current time, server secret):
/// 1. Token Extraction: the Authorization header must hold a two-part
///    "Bearer <token>" value.
/// 2. Token Validation: signature and expiry are checked by the token service.
///
/// There is deliberately no database lookup here; the embedded role is trusted
/// as issued.
///
/// Rejection: 401 Unauthorized with an identical response shape regardless of
/// whether the credential was missing, malformed, tampered, or expired.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    // Allows the extractor to pull the AppConfig (for the JWT secret).
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized(
                "Missing or invalid authorization header",
            ))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized(
                "Missing or invalid authorization header",
            ))?;

        // All verification failure causes collapse into one rejection.
        let claims = token::verify(token, &config.jwt_secret).ok_or(ApiError::invalid_token())?;

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

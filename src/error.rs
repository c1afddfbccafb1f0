use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// ApiError
///
/// The full error taxonomy surfaced to API clients. Every variant is terminal and
/// non-retriable; each maps to exactly one status code and a `{error, message}`
/// JSON body matching the API contract.
///
/// Login and registration deliberately collapse several distinct internal causes
/// into one external message each (account enumeration resistance), so callers
/// construct those variants with the shared canned messages below.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ApiError {
    /// 400: Input shape/range violation. Carries the full list of human-readable issues.
    #[error("validation failed")]
    Validation(Vec<String>),

    /// 401: Missing/invalid/expired credential, or a failed login.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// 403: Authenticated but insufficient privilege.
    #[error("Insufficient permissions")]
    Forbidden,

    /// 404: The resource id does not resolve. Carries the resource noun.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// 409: Uniqueness violation.
    #[error("{0}")]
    Conflict(&'static str),

    /// 500: Unanticipated internal failure (persistence outage etc.). Details are
    /// logged server-side, never surfaced.
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// The single undifferentiated login failure: unknown email and wrong password
    /// produce byte-identical responses.
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("Invalid credentials")
    }

    /// The single undifferentiated token failure: malformed, tampered and expired
    /// tokens are indistinguishable to the caller.
    pub fn invalid_token() -> Self {
        ApiError::Unauthorized("Invalid or expired token")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, label) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        };

        // ValidationError carries the issue list verbatim; everything else a single string.
        let message = match &self {
            ApiError::Validation(issues) => json!(issues),
            other => json!(other.to_string()),
        };

        let body = Json(json!({
            "error": label,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_serializes_issue_list() {
        let err = ApiError::Validation(vec!["too short".to_string(), "bad email".to_string()]);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn login_failures_are_indistinguishable() {
        // Unknown email and wrong password must render the same body.
        let a = ApiError::invalid_credentials();
        let b = ApiError::invalid_credentials();
        assert_eq!(a, b);
    }
}

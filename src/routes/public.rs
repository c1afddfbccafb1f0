use crate::{AppState, handlers};
use axum::{Json, Router, routing::{get, post}};
use serde_json::json;

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client.
/// This tier holds only the identity gateway (register/login) and the health
/// probe; every data endpoint lives behind authentication.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        // POST /auth/register
        // Creates a new account (role LEARNER, or ADMIN via the bootstrap rule).
        .route("/auth/register", post(handlers::register))
        // POST /auth/login
        // Verifies credentials and issues a signed, time-limited session token.
        .route("/auth/login", post(handlers::login))
}

use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, patch},
};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to principals with the ADMIN role:
/// role mutation, account deletion, and comment moderation.
///
/// Access Control:
/// Each handler authenticates via the `AuthUser` extractor and then explicitly
/// checks `policy::can_moderate` before touching the target resource, so an
/// authenticated non-admin receives 403 before any existence probe.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // PATCH /admin/users/{id}/role
        // Reassigns a target account's role. Only LEARNER and MENTOR are legal
        // values; ADMIN is unassignable through this endpoint.
        .route("/users/{id}/role", patch(handlers::set_role))
        // DELETE /admin/users/{id}
        // Removes an account; authored content cascades at the schema level.
        .route("/users/{id}", delete(handlers::delete_account))
        // DELETE /admin/comments/{id}
        // Moderation-only comment removal. There is no author self-delete path.
        .route("/comments/{id}", delete(handlers::delete_comment))
}

use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Defines the routes accessible to any principal who has passed the
/// authentication layer. This module carries all core forum features:
/// reading and starting discussions, editing/deleting them (subject to the
/// per-resource authorization predicates), and commenting.
///
/// Access Control Strategy:
/// Every handler here relies on the `AuthUser` extractor middleware applied on
/// the router layer above this module, and additionally receives the principal
/// as an explicit argument for ownership checks.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // Retrieves the currently authenticated account's safe projection.
        .route("/me", get(handlers::get_me))
        // GET /discussions          - list all discussions (globally readable)
        // POST /discussions         - start a new discussion
        .route(
            "/discussions",
            get(handlers::list_discussions).post(handlers::create_discussion),
        )
        // GET /discussions/{id}     - single discussion
        // PUT /discussions/{id}     - author, MENTOR or ADMIN
        // DELETE /discussions/{id}  - author or ADMIN
        .route(
            "/discussions/{id}",
            get(handlers::get_discussion)
                .put(handlers::update_discussion)
                .delete(handlers::delete_discussion),
        )
        // GET/POST /discussions/{id}/comments
        // Comment reading and creation; the parent discussion must exist.
        .route(
            "/discussions/{id}/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
}

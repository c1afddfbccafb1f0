//! Authorization policy: small pure predicates over (principal, resource) pairs.
//!
//! Rules are fixed per resource type, not a configurable rule language. Handlers
//! evaluate them only after the target resource has been loaded, so the order is
//! always authenticate -> load (404) -> authorize (403) -> mutate.

use crate::{
    auth::AuthUser,
    models::{Discussion, Role},
};

/// A discussion may be updated by its author, or by any MENTOR or ADMIN.
pub fn can_update_discussion(principal: &AuthUser, discussion: &Discussion) -> bool {
    principal.id == discussion.author_id
        || matches!(principal.role, Role::Mentor | Role::Admin)
}

/// A discussion may be deleted by its author or by an ADMIN. MENTOR may edit
/// but not delete.
pub fn can_delete_discussion(principal: &AuthUser, discussion: &Discussion) -> bool {
    principal.id == discussion.author_id || principal.role == Role::Admin
}

/// Moderation actions: comment deletion, role mutation, account deletion.
/// ADMIN only, unconditionally; there is no ownership path (a comment's own
/// author cannot delete it).
pub fn can_moderate(principal: &AuthUser) -> bool {
    principal.role == Role::Admin
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The RBAC field carried by every account and embedded into session tokens.
/// Serialized UPPERCASE everywhere (JSON bodies, JWT claims, and the
/// `account_role` Postgres enum) so the wire format matches the API contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "account_role", rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    #[default]
    Learner,
    Mentor,
    Admin,
}

/// AccountRecord
///
/// The full `accounts` row, including the password hash. This type is **internal
/// to the repository and login flow** and deliberately does not derive Serialize,
/// so the hash can never leak into a JSON response by accident.
#[derive(Debug, Clone, FromRow, Default)]
pub struct AccountRecord {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account
///
/// The safe projection of an account returned by every outward-facing endpoint.
/// Contains everything a client may see; never the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<AccountRecord> for Account {
    fn from(rec: AccountRecord) -> Self {
        Account {
            id: rec.id,
            email: rec.email,
            username: rec.username,
            role: rec.role,
            created_at: rec.created_at,
            updated_at: rec.updated_at,
        }
    }
}

/// Discussion
///
/// A top-level forum thread from the `discussions` table. Owned by its author;
/// the author reference is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Discussion {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    // FK to accounts.id (Owner).
    pub author_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Comment
///
/// A reply attached to a discussion, from the `comments` table.
/// Deletable through moderation only (ADMIN), never by its author.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    // FK to discussions.id (parent thread).
    pub discussion_id: Uuid,
    // FK to accounts.id.
    pub author_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /auth/register).
/// The password is hashed immediately and never persisted or logged in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    #[schema(example = "test@example.com")]
    pub email: String,
    #[schema(example = "testuser")]
    pub username: String,
    #[schema(example = "password123")]
    pub password: String,
}

/// LoginRequest
///
/// Input payload for POST /auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// LoginResponse
///
/// Output schema for a successful login: the signed session token plus the
/// safe projection of the account it was issued for.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: Account,
}

/// CreateDiscussionRequest
///
/// Input payload for starting a new discussion (POST /discussions).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateDiscussionRequest {
    pub title: String,
    pub content: String,
}

/// UpdateDiscussionRequest
///
/// Partial update payload for modifying an existing discussion (PUT /discussions/{id}).
///
/// Uses `Option<T>` for all fields and `#[serde(skip_serializing_if = "Option::is_none")]`
/// to efficiently handle partial updates; at least one field must be provided.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateDiscussionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// CreateCommentRequest
///
/// Input payload for posting a new comment under a discussion.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// SetRoleRequest
///
/// Input payload for the admin role-mutation endpoint (PATCH /admin/users/{id}/role).
/// Only LEARNER and MENTOR are accepted here; ADMIN is assignable exclusively
/// through the bootstrap registration rule.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SetRoleRequest {
    pub role: String,
}

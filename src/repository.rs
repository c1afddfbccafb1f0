use crate::models::{
    Account, AccountRecord, Comment, Discussion, Role, UpdateDiscussionRequest,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// NewAccount
///
/// Everything the repository needs to insert an account row. The password is
/// already hashed by the time it reaches this layer; plaintext never crosses
/// the persistence boundary.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// CreateAccountError
///
/// Insert outcome for account creation. The pre-insert duplicate check and a
/// unique-index violation at insert time (the narrow race window between check
/// and insert) both surface as `Duplicate`, which handlers map to 409 Conflict.
#[derive(Debug, PartialEq)]
pub enum CreateAccountError {
    Duplicate,
    Database,
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the handlers to interact with
/// the data layer without knowing the specific implementation (Postgres, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// safely shareable and usable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Accounts ---
    // Exact-match email lookup returning the full row (incl. hash) for login.
    async fn find_account_by_email(&self, email: &str) -> Option<AccountRecord>;
    // Duplicate pre-check: does any account hold this email OR this username?
    async fn account_conflict_exists(&self, email: &str, username: &str) -> bool;
    // Insert; a unique-index violation maps to CreateAccountError::Duplicate.
    async fn create_account(&self, new: NewAccount) -> Result<Account, CreateAccountError>;
    async fn get_account(&self, id: Uuid) -> Option<Account>;
    // Admin action: returns the updated projection, or None if the id does not resolve.
    async fn set_account_role(&self, id: Uuid, role: Role) -> Option<Account>;
    // Admin action: row cascades (discussions, comments) are a schema concern.
    async fn delete_account(&self, id: Uuid) -> bool;

    // --- Discussions ---
    async fn list_discussions(&self) -> Vec<Discussion>;
    async fn get_discussion(&self, id: Uuid) -> Option<Discussion>;
    async fn create_discussion(
        &self,
        author_id: Uuid,
        title: String,
        content: String,
    ) -> Option<Discussion>;
    // Partial update via COALESCE; authorization is resolved by the caller first.
    async fn update_discussion(
        &self,
        id: Uuid,
        req: UpdateDiscussionRequest,
    ) -> Option<Discussion>;
    async fn delete_discussion(&self, id: Uuid) -> bool;

    // --- Comments ---
    async fn list_comments(&self, discussion_id: Uuid) -> Vec<Comment>;
    async fn create_comment(
        &self,
        discussion_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Option<Comment>;
    async fn get_comment(&self, id: Uuid) -> Option<Comment>;
    async fn delete_comment(&self, id: Uuid) -> bool;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the PostgreSQL database.
/// Uses the runtime query API with explicit binds throughout, so the crate compiles
/// without a live database connection.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ACCOUNT_COLUMNS: &str = "id, email, username, role, created_at, updated_at";
const DISCUSSION_COLUMNS: &str = "id, title, content, author_id, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, content, discussion_id, author_id, created_at";

#[async_trait]
impl Repository for PostgresRepository {
    /// find_account_by_email
    ///
    /// The only query that selects the password hash; used exclusively by login.
    async fn find_account_by_email(&self, email: &str) -> Option<AccountRecord> {
        sqlx::query_as::<_, AccountRecord>(
            "SELECT id, email, username, password_hash, role, created_at, updated_at \
             FROM accounts WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_account_by_email error: {:?}", e);
            None
        })
    }

    /// account_conflict_exists
    ///
    /// Single OR-condition query covering both uniqueness invariants at once.
    async fn account_conflict_exists(&self, email: &str, username: &str) -> bool {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1 OR username = $2)",
        )
        .bind(email)
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("account_conflict_exists error: {:?}", e);
            false
        })
    }

    /// create_account
    ///
    /// The unique indexes on email and username are the last word on uniqueness;
    /// a violation here is mapped to the same Conflict outcome as the pre-check.
    async fn create_account(&self, new: NewAccount) -> Result<Account, CreateAccountError> {
        let query = format!(
            "INSERT INTO accounts (id, email, username, password_hash, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(Uuid::new_v4())
            .bind(&new.email)
            .bind(&new.username)
            .bind(&new.password_hash)
            .bind(new.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    CreateAccountError::Duplicate
                }
                _ => {
                    tracing::error!("create_account error: {:?}", e);
                    CreateAccountError::Database
                }
            })
    }

    /// get_account
    ///
    /// Safe-projection lookup; never touches the password hash.
    async fn get_account(&self, id: Uuid) -> Option<Account> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_account error: {:?}", e);
                None
            })
    }

    /// set_account_role
    ///
    /// Returns None if the target id does not resolve, which the handler maps to 404.
    async fn set_account_role(&self, id: Uuid, role: Role) -> Option<Account> {
        let query = format!(
            "UPDATE accounts SET role = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("set_account_role error: {:?}", e);
                None
            })
    }

    /// delete_account
    ///
    /// Authored discussions and comments cascade via the schema's FK constraints.
    async fn delete_account(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_account error: {:?}", e);
                false
            }
        }
    }

    // --- DISCUSSIONS ---

    /// list_discussions
    ///
    /// All discussions, newest first. No visibility filtering beyond authentication,
    /// which is enforced at the routing layer.
    async fn list_discussions(&self) -> Vec<Discussion> {
        let query =
            format!("SELECT {DISCUSSION_COLUMNS} FROM discussions ORDER BY created_at DESC");
        sqlx::query_as::<_, Discussion>(&query)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_discussions error: {:?}", e);
                vec![]
            })
    }

    async fn get_discussion(&self, id: Uuid) -> Option<Discussion> {
        let query = format!("SELECT {DISCUSSION_COLUMNS} FROM discussions WHERE id = $1");
        sqlx::query_as::<_, Discussion>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_discussion error: {:?}", e);
                None
            })
    }

    /// create_discussion
    ///
    /// The author FK guarantees the account exists at creation time; a failure
    /// (e.g. the account was deleted after the token was issued) yields None.
    async fn create_discussion(
        &self,
        author_id: Uuid,
        title: String,
        content: String,
    ) -> Option<Discussion> {
        let query = format!(
            "INSERT INTO discussions (id, title, content, author_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) \
             RETURNING {DISCUSSION_COLUMNS}"
        );
        sqlx::query_as::<_, Discussion>(&query)
            .bind(Uuid::new_v4())
            .bind(title)
            .bind(content)
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| tracing::error!("create_discussion error: {:?}", e))
            .ok()
    }

    /// update_discussion
    ///
    /// Uses the PostgreSQL `COALESCE` function to efficiently handle `Option<T>` fields,
    /// only updating a column if the corresponding field in `req` is `Some`.
    async fn update_discussion(
        &self,
        id: Uuid,
        req: UpdateDiscussionRequest,
    ) -> Option<Discussion> {
        let query = format!(
            "UPDATE discussions \
             SET title = COALESCE($2, title), \
                 content = COALESCE($3, content), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {DISCUSSION_COLUMNS}"
        );
        sqlx::query_as::<_, Discussion>(&query)
            .bind(id)
            .bind(req.title)
            .bind(req.content)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("update_discussion error: {:?}", e);
                None
            })
    }

    async fn delete_discussion(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM discussions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_discussion error: {:?}", e);
                false
            }
        }
    }

    // --- COMMENTS ---

    /// list_comments
    ///
    /// All comments under a discussion, oldest first (thread reading order).
    async fn list_comments(&self, discussion_id: Uuid) -> Vec<Comment> {
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE discussion_id = $1 \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(discussion_id)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_comments error: {:?}", e);
                vec![]
            })
    }

    /// create_comment
    ///
    /// The parent discussion's existence is checked by the handler before this
    /// call (404 path); the FK constraint backs that check up.
    async fn create_comment(
        &self,
        discussion_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Option<Comment> {
        let query = format!(
            "INSERT INTO comments (id, content, discussion_id, author_id, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) \
             RETURNING {COMMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(Uuid::new_v4())
            .bind(content)
            .bind(discussion_id)
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| tracing::error!("create_comment error: {:?}", e))
            .ok()
    }

    async fn get_comment(&self, id: Uuid) -> Option<Comment> {
        let query = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_comment error: {:?}", e);
                None
            })
    }

    async fn delete_comment(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_comment error: {:?}", e);
                false
            }
        }
    }
}

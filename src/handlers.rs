use crate::{
    AppState,
    auth::AuthUser,
    credentials,
    error::ApiError,
    models::{
        Account, Comment, CreateCommentRequest, CreateDiscussionRequest, Discussion,
        LoginRequest, LoginResponse, RegisterRequest, Role, SetRoleRequest,
        UpdateDiscussionRequest,
    },
    policy,
    repository::{CreateAccountError, NewAccount},
    token, validation,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

// --- Auth Handlers ---

/// register
///
/// [Public Route] Creates a new account.
///
/// *Flow*: validate input shape -> duplicate pre-check (email OR username) ->
/// bootstrap-admin role resolution -> bcrypt hash -> insert. A unique-index
/// violation at insert time (the check/insert race) maps to the same 409 as the
/// pre-check. The response is the safe projection; the hash never leaves the server.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Duplicate email/username")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let issues = validation::validate_register(&payload);
    if !issues.is_empty() {
        return Err(ApiError::Validation(issues));
    }

    if state
        .repo
        .account_conflict_exists(&payload.email, &payload.username)
        .await
    {
        return Err(ApiError::Conflict("Email or username already exists"));
    }

    // Bootstrap rule: a case-insensitive match against the configured admin email
    // yields ADMIN on *every* registration attempt, so the bootstrap account can
    // be re-created after deletion. Everyone else starts as LEARNER.
    let role = match &state.config.bootstrap_admin_email {
        Some(bootstrap) if payload.email.to_lowercase() == bootstrap.to_lowercase() => Role::Admin,
        _ => Role::Learner,
    };

    let password_hash =
        credentials::hash(&payload.password, state.config.bcrypt_cost).map_err(|e| {
            tracing::error!("password hashing failed: {:?}", e);
            ApiError::Internal
        })?;

    let account = state
        .repo
        .create_account(NewAccount {
            email: payload.email,
            username: payload.username,
            password_hash,
            role,
        })
        .await
        .map_err(|e| match e {
            CreateAccountError::Duplicate => ApiError::Conflict("Email or username already exists"),
            CreateAccountError::Database => ApiError::Internal,
        })?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// login
///
/// [Public Route] Verifies credentials and issues a session token.
///
/// *Information hiding*: an unknown email and a wrong password both produce the
/// identical 401 "Invalid credentials" response, preventing account enumeration.
/// The issued token embeds the account's **current** role as a snapshot.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let issues = validation::validate_login(&payload);
    if !issues.is_empty() {
        return Err(ApiError::Validation(issues));
    }

    // Exact-match email lookup.
    let record = state
        .repo
        .find_account_by_email(&payload.email)
        .await
        .ok_or_else(ApiError::invalid_credentials)?;

    if !credentials::verify(&payload.password, &record.password_hash) {
        return Err(ApiError::invalid_credentials());
    }

    let token = token::issue(
        record.id,
        record.role,
        state.config.token_ttl_secs,
        &state.config.jwt_secret,
    )
    .map_err(|e| {
        tracing::error!("token issuance failed: {:?}", e);
        ApiError::Internal
    })?;

    Ok(Json(LoginResponse {
        token,
        user: record.into(),
    }))
}

/// get_me
///
/// [Authenticated Route] Returns the caller's own account projection, fetched
/// fresh from the store. 404 if the account was deleted after the session
/// token was issued.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Profile", body = Account),
        (status = 404, description = "Account no longer exists")
    )
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Account>, ApiError> {
    let account = state
        .repo
        .get_account(id)
        .await
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(account))
}

// --- Discussion Handlers ---

/// list_discussions
///
/// [Authenticated Route] Lists every discussion, newest first. There is no
/// per-resource visibility filtering: any logged-in principal may read all
/// discussions.
#[utoipa::path(
    get,
    path = "/discussions",
    responses((status = 200, description = "All discussions", body = [Discussion]))
)]
pub async fn list_discussions(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<Discussion>> {
    Json(state.repo.list_discussions().await)
}

/// get_discussion
///
/// [Authenticated Route] Retrieves a single discussion by id.
#[utoipa::path(
    get,
    path = "/discussions/{id}",
    params(("id" = Uuid, Path, description = "Discussion ID")),
    responses(
        (status = 200, description = "Found", body = Discussion),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_discussion(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Discussion>, ApiError> {
    let discussion = state
        .repo
        .get_discussion(id)
        .await
        .ok_or(ApiError::NotFound("Discussion"))?;
    Ok(Json(discussion))
}

/// create_discussion
///
/// [Authenticated Route] Starts a new discussion. The author reference is taken
/// from the authenticated principal, never from the payload.
#[utoipa::path(
    post,
    path = "/discussions",
    request_body = CreateDiscussionRequest,
    responses(
        (status = 201, description = "Created", body = Discussion),
        (status = 400, description = "Validation error")
    )
)]
pub async fn create_discussion(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateDiscussionRequest>,
) -> Result<(StatusCode, Json<Discussion>), ApiError> {
    let issues = validation::validate_create_discussion(&payload);
    if !issues.is_empty() {
        return Err(ApiError::Validation(issues));
    }

    let discussion = state
        .repo
        .create_discussion(author_id, payload.title, payload.content)
        .await
        .ok_or(ApiError::Internal)?;

    Ok((StatusCode::CREATED, Json(discussion)))
}

/// update_discussion
///
/// [Authenticated Route] Partial update of a discussion.
///
/// *Evaluation order*: load the target first (404 if absent), then authorize
/// (403 if denied), then mutate. A non-owner probing a nonexistent id gets 404,
/// not 403.
///
/// *Authorization*: author, MENTOR, or ADMIN.
#[utoipa::path(
    put,
    path = "/discussions/{id}",
    params(("id" = Uuid, Path, description = "Discussion ID")),
    request_body = UpdateDiscussionRequest,
    responses(
        (status = 200, description = "Updated", body = Discussion),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_discussion(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDiscussionRequest>,
) -> Result<Json<Discussion>, ApiError> {
    let issues = validation::validate_update_discussion(&payload);
    if !issues.is_empty() {
        return Err(ApiError::Validation(issues));
    }

    let discussion = state
        .repo
        .get_discussion(id)
        .await
        .ok_or(ApiError::NotFound("Discussion"))?;

    if !policy::can_update_discussion(&user, &discussion) {
        return Err(ApiError::Forbidden);
    }

    let updated = state
        .repo
        .update_discussion(id, payload)
        .await
        .ok_or(ApiError::NotFound("Discussion"))?;

    Ok(Json(updated))
}

/// delete_discussion
///
/// [Authenticated Route] Deletes a discussion. Same load-then-authorize order
/// as updates.
///
/// *Authorization*: author or ADMIN. A MENTOR may edit but not delete.
#[utoipa::path(
    delete,
    path = "/discussions/{id}",
    params(("id" = Uuid, Path, description = "Discussion ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_discussion(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let discussion = state
        .repo
        .get_discussion(id)
        .await
        .ok_or(ApiError::NotFound("Discussion"))?;

    if !policy::can_delete_discussion(&user, &discussion) {
        return Err(ApiError::Forbidden);
    }

    if state.repo.delete_discussion(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Discussion"))
    }
}

// --- Comment Handlers ---

/// list_comments
///
/// [Authenticated Route] Lists a discussion's comments in thread order.
/// The parent discussion must exist.
#[utoipa::path(
    get,
    path = "/discussions/{id}/comments",
    params(("id" = Uuid, Path, description = "Discussion ID")),
    responses(
        (status = 200, description = "Comments", body = [Comment]),
        (status = 404, description = "Not Found")
    )
)]
pub async fn list_comments(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(discussion_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    if state.repo.get_discussion(discussion_id).await.is_none() {
        return Err(ApiError::NotFound("Discussion"));
    }
    Ok(Json(state.repo.list_comments(discussion_id).await))
}

/// create_comment
///
/// [Authenticated Route] Posts a comment under a discussion. The parent must
/// exist at creation time (404 otherwise); any authenticated principal may comment.
#[utoipa::path(
    post,
    path = "/discussions/{id}/comments",
    params(("id" = Uuid, Path, description = "Discussion ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn create_comment(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(discussion_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let issues = validation::validate_create_comment(&payload);
    if !issues.is_empty() {
        return Err(ApiError::Validation(issues));
    }

    if state.repo.get_discussion(discussion_id).await.is_none() {
        return Err(ApiError::NotFound("Discussion"));
    }

    let comment = state
        .repo
        .create_comment(discussion_id, author_id, payload.content)
        .await
        .ok_or(ApiError::Internal)?;

    Ok((StatusCode::CREATED, Json(comment)))
}

// --- Admin Handlers ---

/// set_role
///
/// [Admin Route] Changes a target account's role.
///
/// *RBAC*: caller must be ADMIN. The new value is restricted to LEARNER or
/// MENTOR; ADMIN cannot be assigned through this path regardless of the
/// caller's privilege (only the bootstrap registration rule grants it).
#[utoipa::path(
    patch,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "Account ID")),
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Updated", body = Account),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn set_role(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetRoleRequest>,
) -> Result<Json<Account>, ApiError> {
    if !policy::can_moderate(&user) {
        return Err(ApiError::Forbidden);
    }

    let role = match payload.role.as_str() {
        "LEARNER" => Role::Learner,
        "MENTOR" => Role::Mentor,
        _ => {
            return Err(ApiError::Validation(vec![
                "Role must be either LEARNER or MENTOR".to_string(),
            ]));
        }
    };

    let updated = state
        .repo
        .set_account_role(id, role)
        .await
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(updated))
}

/// delete_account
///
/// [Admin Route] Deletes an account. Authored discussions and comments cascade
/// at the schema level.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_account(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !policy::can_moderate(&user) {
        return Err(ApiError::Forbidden);
    }

    if state.repo.delete_account(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("User"))
    }
}

/// delete_comment
///
/// [Admin Route] Deletes any comment. There is deliberately no author-initiated
/// delete path: comment removal is a moderation action, so even the comment's
/// own author receives 403 here unless they are ADMIN.
#[utoipa::path(
    delete,
    path = "/admin/comments/{id}",
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !policy::can_moderate(&user) {
        return Err(ApiError::Forbidden);
    }

    if state.repo.get_comment(id).await.is_none() {
        return Err(ApiError::NotFound("Comment"));
    }

    if state.repo.delete_comment(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Comment"))
    }
}

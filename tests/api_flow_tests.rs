//! Full-router flow tests: real routing, middleware, extractors and handlers,
//! with an in-memory repository standing in for Postgres.

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use forum_api::{
    AppState,
    config::AppConfig,
    create_router,
    models::{
        Account, AccountRecord, Comment, Discussion, Role, UpdateDiscussionRequest,
    },
    repository::{CreateAccountError, NewAccount, Repository},
};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tower::ServiceExt;
use uuid::Uuid;

// --- IN-MEMORY REPOSITORY ---

#[derive(Default)]
struct Store {
    accounts: HashMap<Uuid, AccountRecord>,
    discussions: HashMap<Uuid, Discussion>,
    comments: HashMap<Uuid, Comment>,
}

/// A stateful Repository backed by hash maps, faithful to the Postgres
/// implementation's contract (uniqueness, existence, cascades).
#[derive(Default)]
struct InMemoryRepository {
    store: Mutex<Store>,
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_account_by_email(&self, email: &str) -> Option<AccountRecord> {
        let store = self.store.lock().unwrap();
        store.accounts.values().find(|a| a.email == email).cloned()
    }

    async fn account_conflict_exists(&self, email: &str, username: &str) -> bool {
        let store = self.store.lock().unwrap();
        store
            .accounts
            .values()
            .any(|a| a.email == email || a.username == username)
    }

    async fn create_account(&self, new: NewAccount) -> Result<Account, CreateAccountError> {
        let mut store = self.store.lock().unwrap();
        // Unique-index semantics.
        if store
            .accounts
            .values()
            .any(|a| a.email == new.email || a.username == new.username)
        {
            return Err(CreateAccountError::Duplicate);
        }
        let now = Utc::now();
        let record = AccountRecord {
            id: Uuid::new_v4(),
            email: new.email,
            username: new.username,
            password_hash: new.password_hash,
            role: new.role,
            created_at: now,
            updated_at: now,
        };
        store.accounts.insert(record.id, record.clone());
        Ok(record.into())
    }

    async fn get_account(&self, id: Uuid) -> Option<Account> {
        let store = self.store.lock().unwrap();
        store.accounts.get(&id).cloned().map(Account::from)
    }

    async fn set_account_role(&self, id: Uuid, role: Role) -> Option<Account> {
        let mut store = self.store.lock().unwrap();
        let record = store.accounts.get_mut(&id)?;
        record.role = role;
        record.updated_at = Utc::now();
        Some(record.clone().into())
    }

    async fn delete_account(&self, id: Uuid) -> bool {
        let mut store = self.store.lock().unwrap();
        let removed = store.accounts.remove(&id).is_some();
        if removed {
            // FK cascade semantics.
            store.discussions.retain(|_, d| d.author_id != id);
            store.comments.retain(|_, c| c.author_id != id);
        }
        removed
    }

    async fn list_discussions(&self) -> Vec<Discussion> {
        let store = self.store.lock().unwrap();
        let mut all: Vec<_> = store.discussions.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    async fn get_discussion(&self, id: Uuid) -> Option<Discussion> {
        let store = self.store.lock().unwrap();
        store.discussions.get(&id).cloned()
    }

    async fn create_discussion(
        &self,
        author_id: Uuid,
        title: String,
        content: String,
    ) -> Option<Discussion> {
        let mut store = self.store.lock().unwrap();
        let now = Utc::now();
        let discussion = Discussion {
            id: Uuid::new_v4(),
            title,
            content,
            author_id,
            created_at: now,
            updated_at: now,
        };
        store.discussions.insert(discussion.id, discussion.clone());
        Some(discussion)
    }

    async fn update_discussion(
        &self,
        id: Uuid,
        req: UpdateDiscussionRequest,
    ) -> Option<Discussion> {
        let mut store = self.store.lock().unwrap();
        let discussion = store.discussions.get_mut(&id)?;
        if let Some(title) = req.title {
            discussion.title = title;
        }
        if let Some(content) = req.content {
            discussion.content = content;
        }
        discussion.updated_at = Utc::now();
        Some(discussion.clone())
    }

    async fn delete_discussion(&self, id: Uuid) -> bool {
        let mut store = self.store.lock().unwrap();
        let removed = store.discussions.remove(&id).is_some();
        if removed {
            store.comments.retain(|_, c| c.discussion_id != id);
        }
        removed
    }

    async fn list_comments(&self, discussion_id: Uuid) -> Vec<Comment> {
        let store = self.store.lock().unwrap();
        let mut all: Vec<_> = store
            .comments
            .values()
            .filter(|c| c.discussion_id == discussion_id)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        all
    }

    async fn create_comment(
        &self,
        discussion_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Option<Comment> {
        let mut store = self.store.lock().unwrap();
        let comment = Comment {
            id: Uuid::new_v4(),
            content,
            discussion_id,
            author_id,
            created_at: Utc::now(),
        };
        store.comments.insert(comment.id, comment.clone());
        Some(comment)
    }

    async fn get_comment(&self, id: Uuid) -> Option<Comment> {
        let store = self.store.lock().unwrap();
        store.comments.get(&id).cloned()
    }

    async fn delete_comment(&self, id: Uuid) -> bool {
        let mut store = self.store.lock().unwrap();
        store.comments.remove(&id).is_some()
    }
}

// --- TEST APP ---

const BOOTSTRAP_EMAIL: &str = "root@forum.example";

fn test_app() -> Router {
    let mut config = AppConfig::default();
    config.bcrypt_cost = 4;
    config.bootstrap_admin_email = Some(BOOTSTRAP_EMAIL.to_string());
    let state = AppState {
        repo: Arc::new(InMemoryRepository::default()),
        config,
    };
    create_router(state)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Registers an account and logs it in, returning (token, account json).
async fn register_and_login(app: &Router, email: &str, username: &str) -> (String, Value) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": email, "username": username, "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let account = body_json(response).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": email, "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    (body["token"].as_str().unwrap().to_string(), account)
}

// --- TESTS ---

#[tokio::test]
async fn test_health_check() {
    let app = test_app();
    let response = app
        .oneshot(bare_request("GET", "/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_discussion_endpoints_require_authentication() {
    let app = test_app();
    let response = app
        .oneshot(bare_request("GET", "/discussions", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = test_app();
    let _ = register_and_login(&app, "a@x.com", "alice").await;

    // Same email, different username.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": "a@x.com", "username": "alice2", "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Same username, different email.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": "b@x.com", "username": "alice", "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_bootstrap_admin_survives_delete_and_reregister() {
    let app = test_app();
    let (admin_token, admin) = register_and_login(&app, BOOTSTRAP_EMAIL, "root").await;
    assert_eq!(admin["role"], "ADMIN");

    // The admin deletes itself, then registers again with the same address.
    let response = app
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/admin/users/{}", admin["id"].as_str().unwrap()),
            Some(&admin_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (_, reborn) = register_and_login(&app, BOOTSTRAP_EMAIL, "root").await;
    assert_eq!(reborn["role"], "ADMIN");
}

#[tokio::test]
async fn test_full_discussion_lifecycle() {
    let app = test_app();

    // register(a@x.com, "alice", "password123") -> 201 LEARNER
    let (alice_token, alice) = register_and_login(&app, "a@x.com", "alice").await;
    assert_eq!(alice["role"], "LEARNER");

    // create Discussion as alice -> 201
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/discussions",
            Some(&alice_token),
            json!({ "title": "Ownership rules", "content": "Let's talk borrows." }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let discussion = body_json(response).await;
    let discussion_id = discussion["id"].as_str().unwrap().to_string();

    // update that Discussion as a fresh LEARNER bob -> 403
    let (bob_token, _) = register_and_login(&app, "b@x.com", "bob").await;
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/discussions/{discussion_id}"),
            Some(&bob_token),
            json!({ "title": "Hijacked title" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // but bob can still read it
    let response = app
        .clone()
        .oneshot(bare_request(
            "GET",
            &format!("/discussions/{discussion_id}"),
            Some(&bob_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // delete as alice -> 204
    let response = app
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/discussions/{discussion_id}"),
            Some(&alice_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // subsequent GET of same id -> 404
    let response = app
        .clone()
        .oneshot(bare_request(
            "GET",
            &format!("/discussions/{discussion_id}"),
            Some(&alice_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mentor_can_edit_but_not_delete_foreign_discussion() {
    let app = test_app();
    let (admin_token, _) = register_and_login(&app, BOOTSTRAP_EMAIL, "root").await;
    let (alice_token, _) = register_and_login(&app, "a@x.com", "alice").await;
    let (mentor_token, mentor) = register_and_login(&app, "m@x.com", "mentor").await;

    // Promote the mentor account.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/admin/users/{}/role", mentor["id"].as_str().unwrap()),
            Some(&admin_token),
            json!({ "role": "MENTOR" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Roles are a snapshot at issuance: re-login to pick the promotion up.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "m@x.com", "password": "password123" }),
        ))
        .await
        .unwrap();
    let mentor_token_fresh = body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/discussions",
            Some(&alice_token),
            json!({ "title": "Trait objects", "content": "dyn or impl?" }),
        ))
        .await
        .unwrap();
    let discussion_id = body_json(response).await["id"].as_str().unwrap().to_string();

    // The pre-promotion token still carries LEARNER and is refused.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/discussions/{discussion_id}"),
            Some(&mentor_token),
            json!({ "title": "Moderated title" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The fresh MENTOR token may edit...
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/discussions/{discussion_id}"),
            Some(&mentor_token_fresh),
            json!({ "title": "Moderated title" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // ...but not delete.
    let response = app
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/discussions/{discussion_id}"),
            Some(&mentor_token_fresh),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_comment_moderation_flow() {
    let app = test_app();
    let (admin_token, _) = register_and_login(&app, BOOTSTRAP_EMAIL, "root").await;
    let (alice_token, _) = register_and_login(&app, "a@x.com", "alice").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/discussions",
            Some(&alice_token),
            json!({ "title": "Async traits", "content": "How stable are they?" }),
        ))
        .await
        .unwrap();
    let discussion_id = body_json(response).await["id"].as_str().unwrap().to_string();

    // Comment on a nonexistent parent: 404.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/discussions/{}/comments", Uuid::new_v4()),
            Some(&alice_token),
            json!({ "content": "into the void" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Comment on the real one: 201.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/discussions/{discussion_id}/comments"),
            Some(&alice_token),
            json!({ "content": "Stable since 1.75, mostly." }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let comment = body_json(response).await;
    let comment_id = comment["id"].as_str().unwrap().to_string();

    // The author cannot delete their own comment.
    let response = app
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/admin/comments/{comment_id}"),
            Some(&alice_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The admin can.
    let response = app
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/admin/comments/{comment_id}"),
            Some(&admin_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // And the thread is empty again.
    let response = app
        .clone()
        .oneshot(bare_request(
            "GET",
            &format!("/discussions/{discussion_id}/comments"),
            Some(&alice_token),
        ))
        .await
        .unwrap();
    let comments = body_json(response).await;
    assert_eq!(comments.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_error_body_shape() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": "bad", "username": "x", "password": "short" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "ValidationError");
    assert!(body["message"].is_array());
    assert_eq!(body["message"].as_array().unwrap().len(), 3);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "ghost@x.com", "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["message"], "Invalid credentials");
}

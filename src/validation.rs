//! Input validation for all request payloads.
//!
//! Each function returns the full list of human-readable issues rather than
//! failing on the first, so a 400 response reports everything wrong with the
//! payload at once.

use crate::models::{
    CreateCommentRequest, CreateDiscussionRequest, LoginRequest, RegisterRequest,
    UpdateDiscussionRequest,
};

/// Minimal structural email check: exactly one '@', a non-empty local part, and
/// a dotted domain. Deliverability is not our problem; shape is.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let (Some(local), Some(domain)) = (parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Domain needs an interior dot.
    domain.split('.').count() >= 2 && domain.split('.').all(|label| !label.is_empty())
}

/// validate_register
///
/// Username length in [3, 30] characters; password length in [8, 72] **bytes**,
/// because bcrypt only uses the first 72 bytes of its input.
pub fn validate_register(req: &RegisterRequest) -> Vec<String> {
    let mut issues = Vec::new();

    if !is_valid_email(&req.email) {
        issues.push("Email must be a valid email address".to_string());
    }

    let username_len = req.username.chars().count();
    if !(3..=30).contains(&username_len) {
        issues.push("Username must be between 3 and 30 characters".to_string());
    }

    if !(8..=72).contains(&req.password.len()) {
        issues.push("Password must be between 8 and 72 characters".to_string());
    }

    issues
}

/// validate_login
///
/// Shape-only checks; credential correctness is decided later and reported
/// through the single undifferentiated 401.
pub fn validate_login(req: &LoginRequest) -> Vec<String> {
    let mut issues = Vec::new();

    if !is_valid_email(&req.email) {
        issues.push("Email must be a valid email address".to_string());
    }
    if req.password.is_empty() {
        issues.push("Password must not be empty".to_string());
    }

    issues
}

/// validate_create_discussion
///
/// Title in [3, 120] characters, content in [1, 5000].
pub fn validate_create_discussion(req: &CreateDiscussionRequest) -> Vec<String> {
    let mut issues = Vec::new();

    if !(3..=120).contains(&req.title.chars().count()) {
        issues.push("Title must be between 3 and 120 characters".to_string());
    }
    if !(1..=5000).contains(&req.content.chars().count()) {
        issues.push("Content must be between 1 and 5000 characters".to_string());
    }

    issues
}

/// validate_update_discussion
///
/// Both fields optional with the same bounds as creation, but at least one must
/// be present.
pub fn validate_update_discussion(req: &UpdateDiscussionRequest) -> Vec<String> {
    let mut issues = Vec::new();

    if req.title.is_none() && req.content.is_none() {
        issues.push("At least one of title or content must be provided".to_string());
        return issues;
    }

    if let Some(title) = &req.title {
        if !(3..=120).contains(&title.chars().count()) {
            issues.push("Title must be between 3 and 120 characters".to_string());
        }
    }
    if let Some(content) = &req.content {
        if !(1..=5000).contains(&content.chars().count()) {
            issues.push("Content must be between 1 and 5000 characters".to_string());
        }
    }

    issues
}

/// validate_create_comment
///
/// Content in [1, 2000] characters.
pub fn validate_create_comment(req: &CreateCommentRequest) -> Vec<String> {
    let mut issues = Vec::new();

    if !(1..=2000).contains(&req.content.chars().count()) {
        issues.push("Content must be between 1 and 2000 characters".to_string());
    }

    issues
}

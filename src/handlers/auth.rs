//! Registration, login and profile management.

use serde_json::json;
use tokio::task;

use super::HandlerResult;
use crate::auth::{password, Subject};
use crate::error::ApiError;
use crate::http::request::{ApiRequest, Payload};
use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::store::{NewUser, UserPatch, UserRecord};

const MIN_PASSWORD_CHARS: usize = 8;

/// Minimal shape check: one `@`, a non-empty local part and a dotted domain.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

/// Untrimmed password field, `None` when absent or blank.
fn password_field(body: &Payload) -> Option<String> {
    body.0
        .get("password")
        .and_then(|v| v.as_str())
        .filter(|p| !p.trim().is_empty())
        .map(str::to_string)
}

fn check_password_length(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::invalid(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

async fn hash_password(password: String) -> Result<String, ApiError> {
    task::spawn_blocking(move || password::hash(&password))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)
}

async fn password_matches(password: String, hashed: String) -> Result<bool, ApiError> {
    task::spawn_blocking(move || password::verify(&password, &hashed))
        .await
        .map_err(ApiError::internal)
}

fn session(state: &AppState, user: &UserRecord) -> serde_json::Value {
    let token = state.tokens.issue(Subject {
        id: user.id,
        username: &user.username,
        email: &user.email,
    });
    json!({ "user": user.profile(), "token": token })
}

pub async fn register(state: AppState, req: ApiRequest) -> HandlerResult {
    let body = req.payload()?;
    body.require(&["username", "email", "password"])?;

    let username = body.non_blank("username").unwrap_or_default();
    let email = body.non_blank("email").unwrap_or_default();
    let password = password_field(&body).unwrap_or_default();

    if !is_valid_email(&email) {
        return Err(ApiError::invalid("Invalid email address"));
    }
    check_password_length(&password)?;

    let user = state
        .store
        .create_user(NewUser {
            username,
            email,
            password_hash: hash_password(password).await?,
            avatar: body.non_blank("avatar"),
        })
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    Ok(ApiResponse::created(
        session(&state, &user),
        "Account created successfully",
    ))
}

pub async fn login(state: AppState, req: ApiRequest) -> HandlerResult {
    let body = req.payload()?;
    body.require(&["email", "password"])?;

    let email = body.non_blank("email").unwrap_or_default();
    let password = password_field(&body).unwrap_or_default();

    let user = state
        .store
        .user_by_email(&email)
        .await
        .ok_or(ApiError::InvalidCredentials)?;
    if !password_matches(password, user.password_hash.clone()).await? {
        tracing::debug!(user_id = user.id, "Password mismatch");
        return Err(ApiError::InvalidCredentials);
    }

    Ok(ApiResponse::ok(session(&state, &user)).with_message("Login successful"))
}

pub async fn me(state: AppState, req: ApiRequest) -> HandlerResult {
    let claims = req.authenticate(&state.tokens)?;
    let user = state
        .store
        .user_by_id(claims.user_id)
        .await
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let (builds_count, favorites_count) = state.store.user_stats(user.id).await;

    Ok(ApiResponse::ok(json!({
        "user": user.profile(),
        "stats": {
            "builds_count": builds_count,
            "favorites_count": favorites_count,
        },
    })))
}

pub async fn update_profile(state: AppState, req: ApiRequest) -> HandlerResult {
    let claims = req.authenticate(&state.tokens)?;
    let body = req.payload()?;

    let mut patch = UserPatch {
        username: body.non_blank("username"),
        avatar: body.text("avatar"),
        ..Default::default()
    };

    if let Some(email) = body.non_blank("email") {
        if !is_valid_email(&email) {
            return Err(ApiError::invalid("Invalid email address"));
        }
        patch.email = Some(email);
    }

    if let Some(password) = password_field(&body) {
        check_password_length(&password)?;
        patch.password_hash = Some(hash_password(password).await?);
    }

    if patch.is_empty() {
        return Err(ApiError::bad_request("No data to update"));
    }

    let user = state.store.update_user(claims.user_id, patch).await?;
    Ok(ApiResponse::ok(json!({ "user": user.profile() }))
        .with_message("Profile updated successfully"))
}

pub async fn logout(_state: AppState, _req: ApiRequest) -> HandlerResult {
    Ok(ApiResponse::message("Logout successful"))
}

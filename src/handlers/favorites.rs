//! Favorites of the authenticated caller.

use serde_json::json;

use super::HandlerResult;
use crate::auth::Claims;
use crate::error::ApiError;
use crate::http::request::ApiRequest;
use crate::http::response::ApiResponse;
use crate::http::server::AppState;

const ADDED: &str = "Build added to favorites";
const REMOVED: &str = "Build removed from favorites";

/// `build_id` from the JSON body.
fn body_build_id(req: &ApiRequest) -> Result<i64, ApiError> {
    let required = || ApiError::bad_request("build_id is required");
    let body = req.payload().map_err(|_| required())?;
    body.integer("build_id")
        .map_err(|_| required())?
        .ok_or_else(required)
}

/// The build must exist and be public or owned by the caller.
async fn ensure_accessible(state: &AppState, build_id: i64, claims: &Claims) -> Result<(), ApiError> {
    let build = state
        .store
        .build(build_id)
        .await
        .ok_or_else(|| ApiError::not_found("Build not found"))?;
    if !build.is_public && build.user_id != claims.user_id {
        return Err(ApiError::forbidden("This build is not accessible"));
    }
    Ok(())
}

pub async fn index(state: AppState, req: ApiRequest) -> HandlerResult {
    let claims = req.authenticate(&state.tokens)?;
    let favorites = state.store.user_favorites(claims.user_id).await;
    Ok(ApiResponse::ok(json!({
        "total": favorites.len(),
        "favorites": favorites,
    })))
}

pub async fn ids(state: AppState, req: ApiRequest) -> HandlerResult {
    let claims = req.authenticate(&state.tokens)?;
    let ids = state.store.favorite_build_ids(claims.user_id).await;
    Ok(ApiResponse::ok(json!({
        "total": ids.len(),
        "favorite_build_ids": ids,
    })))
}

pub async fn check(state: AppState, req: ApiRequest) -> HandlerResult {
    let claims = req.authenticate(&state.tokens)?;
    let build_id = req.int_param("buildId")?;
    let is_favorite = state.store.is_favorite(claims.user_id, build_id).await;
    Ok(ApiResponse::ok(json!({
        "build_id": build_id,
        "is_favorite": is_favorite,
    })))
}

pub async fn add(state: AppState, req: ApiRequest) -> HandlerResult {
    let claims = req.authenticate(&state.tokens)?;
    let build_id = body_build_id(&req)?;
    ensure_accessible(&state, build_id, &claims).await?;

    let favorite = state.store.add_favorite(claims.user_id, build_id).await?;
    Ok(ApiResponse::created(
        json!({ "favorite_id": favorite.id, "build_id": build_id }),
        ADDED,
    ))
}

pub async fn toggle(state: AppState, req: ApiRequest) -> HandlerResult {
    let claims = req.authenticate(&state.tokens)?;
    let build_id = body_build_id(&req)?;
    ensure_accessible(&state, build_id, &claims).await?;

    let is_favorite = state.store.toggle_favorite(claims.user_id, build_id).await?;
    let (action, message) = if is_favorite {
        ("added", ADDED)
    } else {
        ("removed", REMOVED)
    };
    Ok(ApiResponse::ok(json!({
        "action": action,
        "is_favorite": is_favorite,
        "build_id": build_id,
    }))
    .with_message(message))
}

pub async fn remove(state: AppState, req: ApiRequest) -> HandlerResult {
    let claims = req.authenticate(&state.tokens)?;
    let build_id = req.int_param("buildId")?;
    if state.store.build(build_id).await.is_none() {
        return Err(ApiError::not_found("Build not found"));
    }

    if !state.store.remove_favorite(claims.user_id, build_id).await {
        return Err(ApiError::not_found("This build is not in your favorites"));
    }
    Ok(ApiResponse::message(REMOVED))
}

//! Build listing, search and owner-only mutation.

use serde_json::json;

use super::HandlerResult;
use crate::auth::Claims;
use crate::error::ApiError;
use crate::http::request::{ApiRequest, Payload};
use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::store::{BuildPatch, BuildQuery, BuildRecord, NewBuild, SortKey, SortOrder};

const REFINEMENTS: std::ops::RangeInclusive<i64> = 1..=5;

fn refinement(body: &Payload) -> Result<Option<u8>, ApiError> {
    match body.integer("weapon_refinement")? {
        None => Ok(None),
        Some(value) if REFINEMENTS.contains(&value) => Ok(Some(value as u8)),
        Some(_) => Err(ApiError::invalid(
            "weapon_refinement must be between 1 and 5",
        )),
    }
}

/// Load build `id` and make sure `claims` owns it.
async fn owned_build(
    state: &AppState,
    id: i64,
    claims: &Claims,
    action: &str,
) -> Result<BuildRecord, ApiError> {
    let build = state
        .store
        .build(id)
        .await
        .ok_or_else(|| ApiError::not_found("Build not found"))?;
    if build.user_id != claims.user_id {
        tracing::debug!(build_id = id, user_id = claims.user_id, "Ownership check failed");
        return Err(ApiError::forbidden(format!(
            "You are not allowed to {action} this build"
        )));
    }
    Ok(build)
}

pub async fn index(state: AppState, req: ApiRequest) -> HandlerResult {
    let character_id = req
        .query("character_id")
        .map(|v| v.parse::<i64>())
        .transpose()
        .map_err(|_| ApiError::bad_request("Invalid character_id"))?;

    let query = BuildQuery {
        character_id,
        element: req.query("element").map(str::to_string),
        search: req.query("search").map(str::to_string),
        sort: SortKey::from_param(req.query("sort")),
        order: SortOrder::from_param(req.query("order")),
    };
    let builds = state.store.list_public_builds(&query).await;

    Ok(ApiResponse::ok(json!({
        "total": builds.len(),
        "builds": builds,
    })))
}

pub async fn mine(state: AppState, req: ApiRequest) -> HandlerResult {
    let claims = req.authenticate(&state.tokens)?;
    let builds = state.store.user_builds(claims.user_id).await;
    Ok(ApiResponse::ok(json!({
        "total": builds.len(),
        "builds": builds,
    })))
}

pub async fn top_rated(state: AppState, req: ApiRequest) -> HandlerResult {
    let builds = state.store.top_rated_builds(req.limit(10, 50)).await;
    Ok(ApiResponse::ok(json!({ "builds": builds })))
}

pub async fn recent(state: AppState, req: ApiRequest) -> HandlerResult {
    let builds = state.store.recent_builds(req.limit(10, 50)).await;
    Ok(ApiResponse::ok(json!({ "builds": builds })))
}

pub async fn search(state: AppState, req: ApiRequest) -> HandlerResult {
    let needle = req.query("q").unwrap_or_default();
    if needle.chars().count() < 2 {
        return Err(ApiError::bad_request(
            "Search query must be at least 2 characters",
        ));
    }

    let builds = state.store.search_builds(needle, req.limit(20, 100)).await;
    Ok(ApiResponse::ok(json!({
        "total": builds.len(),
        "query": needle,
        "builds": builds,
    })))
}

pub async fn show(state: AppState, req: ApiRequest) -> HandlerResult {
    let id = req.int_param("id")?;
    let build = state
        .store
        .build(id)
        .await
        .ok_or_else(|| ApiError::not_found("Build not found"))?;

    if !build.is_public {
        let viewer = req.optional_user(&state.tokens);
        if viewer.map(|c| c.user_id) != Some(build.user_id) {
            return Err(ApiError::forbidden("Access denied"));
        }
    }

    let view = state
        .store
        .record_view(id)
        .await
        .ok_or_else(|| ApiError::not_found("Build not found"))?;
    Ok(ApiResponse::ok(json!({ "build": view })))
}

pub async fn create(state: AppState, req: ApiRequest) -> HandlerResult {
    let claims = req.authenticate(&state.tokens)?;
    let body = req.payload()?;
    body.require(&["character_id", "title"])?;

    let character_id = body
        .integer("character_id")?
        .ok_or_else(|| ApiError::invalid("character_id is required"))?;

    let new = NewBuild {
        user_id: claims.user_id,
        character_id,
        title: body.non_blank("title").unwrap_or_default(),
        description: body.text("description"),
        artifact_set: body.text("artifact_set"),
        artifact_main_stats: body.json("artifact_main_stats"),
        artifact_sub_stats: body.json("artifact_sub_stats"),
        weapon_name: body.text("weapon_name"),
        weapon_refinement: refinement(&body)?.unwrap_or(1),
        talent_priority: body.text("talent_priority"),
        team_composition: body.json("team_composition"),
        is_public: body.flag("is_public").unwrap_or(true),
        tags: body.json("tags"),
    };

    let build = state.store.create_build(new).await?;
    tracing::info!(build_id = build.build.id, user_id = claims.user_id, "Build created");
    Ok(ApiResponse::created(
        json!({ "build": build }),
        "Build created successfully",
    ))
}

pub async fn update(state: AppState, req: ApiRequest) -> HandlerResult {
    let claims = req.authenticate(&state.tokens)?;
    let id = req.int_param("id")?;
    owned_build(&state, id, &claims, "modify").await?;
    let body = req.payload()?;

    let title = body.text("title");
    if title.as_deref() == Some("") {
        return Err(ApiError::invalid("title cannot be empty"));
    }

    let patch = BuildPatch {
        title,
        description: body.text("description"),
        artifact_set: body.text("artifact_set"),
        artifact_main_stats: body.json("artifact_main_stats"),
        artifact_sub_stats: body.json("artifact_sub_stats"),
        weapon_name: body.text("weapon_name"),
        weapon_refinement: refinement(&body)?,
        talent_priority: body.text("talent_priority"),
        team_composition: body.json("team_composition"),
        is_public: body.flag("is_public"),
        tags: body.json("tags"),
    };
    if patch.is_empty() {
        return Err(ApiError::bad_request("No data to update"));
    }

    let build = state.store.update_build(id, patch).await?;
    Ok(ApiResponse::ok(json!({ "build": build })).with_message("Build updated successfully"))
}

pub async fn delete(state: AppState, req: ApiRequest) -> HandlerResult {
    let claims = req.authenticate(&state.tokens)?;
    let id = req.int_param("id")?;
    owned_build(&state, id, &claims, "delete").await?;

    state.store.delete_build(id).await?;
    tracing::info!(build_id = id, user_id = claims.user_id, "Build deleted");
    Ok(ApiResponse::message("Build deleted successfully"))
}

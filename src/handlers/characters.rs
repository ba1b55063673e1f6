//! Character catalog endpoints. All public.

use serde_json::json;

use super::HandlerResult;
use crate::error::ApiError;
use crate::http::request::ApiRequest;
use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::store::{CharacterQuery, Element, WeaponType, RARITIES};

pub async fn index(state: AppState, req: ApiRequest) -> HandlerResult {
    let rarity = req
        .query("rarity")
        .map(|v| v.parse::<u8>())
        .transpose()
        .map_err(|_| ApiError::bad_request("Invalid rarity"))?;

    let query = CharacterQuery {
        element: req.query("element").map(str::to_string),
        weapon_type: req.query("weapon_type").map(str::to_string),
        rarity,
        region: req.query("region").map(str::to_string),
        search: req.query("search").map(str::to_string),
    };
    let characters = state.store.list_characters(&query).await;

    Ok(ApiResponse::ok(json!({
        "total": characters.len(),
        "characters": characters,
    })))
}

pub async fn popular(state: AppState, req: ApiRequest) -> HandlerResult {
    let characters = state.store.popular_characters(req.limit(10, 50)).await;
    Ok(ApiResponse::ok(json!({
        "total": characters.len(),
        "characters": characters,
    })))
}

pub async fn search(state: AppState, req: ApiRequest) -> HandlerResult {
    let needle = req.query("q").unwrap_or_default();
    if needle.chars().count() < 2 {
        return Err(ApiError::bad_request(
            "Search query must be at least 2 characters",
        ));
    }

    let query = CharacterQuery {
        search: Some(needle.to_string()),
        ..Default::default()
    };
    let characters = state.store.list_characters(&query).await;
    Ok(ApiResponse::ok(json!({
        "total": characters.len(),
        "query": needle,
        "characters": characters,
    })))
}

pub async fn by_element(state: AppState, req: ApiRequest) -> HandlerResult {
    let element: Element = req
        .param("element")?
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid element"))?;
    let characters = state.store.characters_by_element(element).await;

    Ok(ApiResponse::ok(json!({
        "element": element,
        "total": characters.len(),
        "characters": characters,
    })))
}

pub async fn by_weapon(state: AppState, req: ApiRequest) -> HandlerResult {
    let weapon: WeaponType = req
        .param("weaponType")?
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid weapon type"))?;
    let characters = state.store.characters_by_weapon(weapon).await;

    Ok(ApiResponse::ok(json!({
        "weapon_type": weapon,
        "total": characters.len(),
        "characters": characters,
    })))
}

pub async fn by_rarity(state: AppState, req: ApiRequest) -> HandlerResult {
    let rarity = req.int_param("rarity")?;
    let Some(&rarity) = RARITIES.iter().find(|&&r| i64::from(r) == rarity) else {
        return Err(ApiError::bad_request("Invalid rarity (4 or 5 stars)"));
    };
    let characters = state.store.characters_by_rarity(rarity).await;

    Ok(ApiResponse::ok(json!({
        "rarity": rarity,
        "total": characters.len(),
        "characters": characters,
    })))
}

pub async fn show(state: AppState, req: ApiRequest) -> HandlerResult {
    let id = req.int_param("id")?;
    let character = state
        .store
        .character(id)
        .await
        .ok_or_else(|| ApiError::not_found("Character not found"))?;
    let builds_count = state.store.character_build_count(id).await;

    Ok(ApiResponse::ok(json!({
        "character": character,
        "stats": { "builds_count": builds_count },
    })))
}

pub async fn builds(state: AppState, req: ApiRequest) -> HandlerResult {
    let id = req.int_param("id")?;
    let character = state
        .store
        .character(id)
        .await
        .ok_or_else(|| ApiError::not_found("Character not found"))?;
    let builds = state.store.character_builds(id).await;

    Ok(ApiResponse::ok(json!({
        "character": character,
        "total": builds.len(),
        "builds": builds,
    })))
}

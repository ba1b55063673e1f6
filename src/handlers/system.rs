//! Liveness and route introspection.

use serde_json::json;

use super::HandlerResult;
use crate::auth::unix_now;
use crate::http::request::ApiRequest;
use crate::http::response::ApiResponse;
use crate::http::server::AppState;

pub async fn health(_state: AppState, _req: ApiRequest) -> HandlerResult {
    Ok(ApiResponse::ok(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": unix_now(),
    })))
}

/// Registered routes in priority order. Only mounted in debug mode.
pub async fn routes(state: AppState, _req: ApiRequest) -> HandlerResult {
    let routes: Vec<_> = state
        .routes
        .routes()
        .map(|(method, path)| json!({ "method": method.to_string(), "path": path }))
        .collect();
    Ok(ApiResponse::ok(json!({ "routes": routes })))
}

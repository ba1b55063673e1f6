//! Resource handlers and the route table.
//!
//! # Data Flow
//! ```text
//! dispatcher (http/server.rs)
//!     → Router<Handler>::resolve(method, path)
//!     → handler(AppState, ApiRequest)
//!         → authenticate / validate / authorize
//!         → Store query or mutation
//!     → Ok(ApiResponse) | Err(ApiError)
//! ```
//!
//! # Design Decisions
//! - Handlers are plain async functions stored as `fn` pointers
//! - Literal routes are registered ahead of placeholder routes on the same prefix
//! - The route listing is only registered in debug mode

mod auth;
mod builds;
mod characters;
mod favorites;
mod system;

use std::future::Future;

use futures_util::future::{BoxFuture, FutureExt};

use crate::error::ApiError;
use crate::http::request::ApiRequest;
use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::routing::{RouteError, Router};

pub type HandlerResult = Result<ApiResponse, ApiError>;

pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

/// A registered route target.
pub type Handler = fn(AppState, ApiRequest) -> HandlerFuture;

fn boxed<F>(future: F) -> HandlerFuture
where
    F: Future<Output = HandlerResult> + Send + 'static,
{
    future.boxed()
}

/// Build the API route table in priority order.
pub fn api_routes(debug: bool) -> Result<Router<Handler>, RouteError> {
    let mut routes: Router<Handler> = Router::new();

    routes
        .post("/api/auth/register", |s, r| boxed(auth::register(s, r)))?
        .post("/api/auth/login", |s, r| boxed(auth::login(s, r)))?
        .get("/api/auth/me", |s, r| boxed(auth::me(s, r)))?
        .put("/api/auth/profile", |s, r| boxed(auth::update_profile(s, r)))?
        .post("/api/auth/logout", |s, r| boxed(auth::logout(s, r)))?;

    routes
        .get("/api/builds", |s, r| boxed(builds::index(s, r)))?
        .get("/api/builds/my-builds", |s, r| boxed(builds::mine(s, r)))?
        .get("/api/builds/top-rated", |s, r| boxed(builds::top_rated(s, r)))?
        .get("/api/builds/recent", |s, r| boxed(builds::recent(s, r)))?
        .get("/api/builds/search", |s, r| boxed(builds::search(s, r)))?
        .get("/api/builds/:id", |s, r| boxed(builds::show(s, r)))?
        .post("/api/builds", |s, r| boxed(builds::create(s, r)))?
        .put("/api/builds/:id", |s, r| boxed(builds::update(s, r)))?
        .delete("/api/builds/:id", |s, r| boxed(builds::delete(s, r)))?;

    routes
        .get("/api/characters", |s, r| boxed(characters::index(s, r)))?
        .get("/api/characters/popular", |s, r| boxed(characters::popular(s, r)))?
        .get("/api/characters/search", |s, r| boxed(characters::search(s, r)))?
        .get("/api/characters/element/:element", |s, r| {
            boxed(characters::by_element(s, r))
        })?
        .get("/api/characters/weapon/:weaponType", |s, r| {
            boxed(characters::by_weapon(s, r))
        })?
        .get("/api/characters/rarity/:rarity", |s, r| {
            boxed(characters::by_rarity(s, r))
        })?
        .get("/api/characters/:id", |s, r| boxed(characters::show(s, r)))?
        .get("/api/characters/:id/builds", |s, r| boxed(characters::builds(s, r)))?;

    routes
        .get("/api/favorites", |s, r| boxed(favorites::index(s, r)))?
        .get("/api/favorites/ids", |s, r| boxed(favorites::ids(s, r)))?
        .get("/api/favorites/check/:buildId", |s, r| boxed(favorites::check(s, r)))?
        .post("/api/favorites", |s, r| boxed(favorites::add(s, r)))?
        .post("/api/favorites/toggle", |s, r| boxed(favorites::toggle(s, r)))?
        .delete("/api/favorites/:buildId", |s, r| boxed(favorites::remove(s, r)))?;

    routes.get("/api/health", |s, r| boxed(system::health(s, r)))?;
    if debug {
        routes.get("/api/routes", |s, r| boxed(system::routes(s, r)))?;
    }

    Ok(routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn resolved(routes: &Router<Handler>, method: Method, path: &str) -> Option<String> {
        routes
            .resolve(&method, path)
            .map(|hit| hit.template.to_string())
    }

    #[test]
    fn test_literal_routes_win_over_ids() {
        let routes = api_routes(false).unwrap();
        assert_eq!(
            resolved(&routes, Method::GET, "/api/builds/my-builds").as_deref(),
            Some("/api/builds/my-builds")
        );
        assert_eq!(
            resolved(&routes, Method::GET, "/api/builds/42").as_deref(),
            Some("/api/builds/:id")
        );
        assert_eq!(
            resolved(&routes, Method::GET, "/api/characters/popular").as_deref(),
            Some("/api/characters/popular")
        );
        assert_eq!(
            resolved(&routes, Method::GET, "/api/characters/3/builds").as_deref(),
            Some("/api/characters/:id/builds")
        );
        assert_eq!(
            resolved(&routes, Method::POST, "/api/favorites/toggle").as_deref(),
            Some("/api/favorites/toggle")
        );
    }

    #[test]
    fn test_route_listing_only_in_debug() {
        let quiet = api_routes(false).unwrap();
        let debug = api_routes(true).unwrap();
        assert_eq!(debug.len(), quiet.len() + 1);
        assert!(resolved(&quiet, Method::GET, "/api/routes").is_none());
        assert!(resolved(&debug, Method::GET, "/api/routes").is_some());
    }

    #[test]
    fn test_unknown_method_is_unrouted() {
        let routes = api_routes(false).unwrap();
        assert!(resolved(&routes, Method::PATCH, "/api/builds/1").is_none());
        assert!(resolved(&routes, Method::GET, "/api/unknown").is_none());
    }
}

//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Look up the first route matching a method and path
//! - Return matched handler with captured params, or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) ordered scan (route table is tens of entries)
//! - Registration order is the priority: literal routes such as
//!   `/builds/search` must be registered before `/builds/:id`
//! - Explicit `None` rather than silent default

use axum::http::Method;

use super::matcher::{Params, PathTemplate, RouteError};

/// Which request methods a route accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    Any,
    Only(Method),
}

impl MethodFilter {
    fn accepts(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(m) => m == method,
        }
    }
}

impl std::fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodFilter::Any => f.write_str("ANY"),
            MethodFilter::Only(m) => f.write_str(m.as_str()),
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        MethodFilter::Only(method)
    }
}

#[derive(Debug)]
struct Route<H> {
    method: MethodFilter,
    template: PathTemplate,
    handler: H,
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub handler: &'a H,
    pub params: Params,
    /// Template of the matched route, suitable as a metrics label.
    pub template: &'a str,
}

/// Ordered, first-match route table.
#[derive(Debug)]
pub struct Router<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Earlier registrations take priority.
    pub fn register(
        &mut self,
        method: impl Into<MethodFilter>,
        template: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        let template = PathTemplate::parse(template)?;
        self.routes.push(Route {
            method: method.into(),
            template,
            handler,
        });
        Ok(self)
    }

    pub fn get(&mut self, template: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.register(Method::GET, template, handler)
    }

    pub fn post(&mut self, template: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.register(Method::POST, template, handler)
    }

    pub fn put(&mut self, template: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.register(Method::PUT, template, handler)
    }

    pub fn delete(&mut self, template: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.register(Method::DELETE, template, handler)
    }

    pub fn any(&mut self, template: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.register(MethodFilter::Any, template, handler)
    }

    /// Find the first route accepting `method` whose template matches `path`.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, H>> {
        self.routes
            .iter()
            .filter(|route| route.method.accepts(method))
            .find_map(|route| {
                route.template.matches(path).map(|params| RouteMatch {
                    handler: &route.handler,
                    params,
                    template: route.template.as_str(),
                })
            })
    }

    /// Registered `(method, template)` pairs in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&MethodFilter, &str)> {
        self.routes
            .iter()
            .map(|route| (&route.method, route.template.as_str()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_shadows_placeholder() {
        let mut router = Router::new();
        router
            .get("/items/popular", "popular")
            .unwrap()
            .get("/items/:id", "show")
            .unwrap();

        let hit = router.resolve(&Method::GET, "/items/popular").unwrap();
        assert_eq!(*hit.handler, "popular");
        assert!(hit.params.is_empty());

        let hit = router.resolve(&Method::GET, "/items/42").unwrap();
        assert_eq!(*hit.handler, "show");
        assert_eq!(hit.params.get("id").map(String::as_str), Some("42"));
        assert_eq!(hit.template, "/items/:id");
    }

    #[test]
    fn test_registration_order_is_priority() {
        // Registering the general route first is a caller error: it swallows the literal.
        let mut router = Router::new();
        router
            .get("/items/:id", "show")
            .unwrap()
            .get("/items/popular", "popular")
            .unwrap();

        let hit = router.resolve(&Method::GET, "/items/popular").unwrap();
        assert_eq!(*hit.handler, "show");
        assert_eq!(hit.params.get("id").map(String::as_str), Some("popular"));
    }

    #[test]
    fn test_method_mismatch_is_not_found() {
        let mut router = Router::new();
        router.get("/items/:id", "show").unwrap();

        assert!(router.resolve(&Method::DELETE, "/items/1").is_none());
        assert!(router.resolve(&Method::GET, "/other").is_none());
    }

    #[test]
    fn test_same_path_different_methods() {
        let mut router = Router::new();
        router
            .get("/items/:id", "show")
            .unwrap()
            .put("/items/:id", "update")
            .unwrap()
            .delete("/items/:id", "delete")
            .unwrap();

        assert_eq!(*router.resolve(&Method::PUT, "/items/3").unwrap().handler, "update");
        assert_eq!(*router.resolve(&Method::DELETE, "/items/3").unwrap().handler, "delete");
        assert!(router.resolve(&Method::POST, "/items/3").is_none());
    }

    #[test]
    fn test_any_method() {
        let mut router = Router::new();
        router.any("/ping", "ping").unwrap();

        for method in [Method::GET, Method::POST, Method::PATCH, Method::OPTIONS] {
            assert_eq!(*router.resolve(&method, "/ping").unwrap().handler, "ping");
        }
    }

    #[test]
    fn test_invalid_template_is_rejected() {
        let mut router: Router<&str> = Router::new();
        assert!(router.get("/a/:id/:id", "dup").is_err());
        assert!(router.is_empty());
    }

    #[test]
    fn test_route_listing() {
        let mut router = Router::new();
        router.post("/a", 1).unwrap().any("/b/:x", 2).unwrap();

        let listed: Vec<(String, String)> = router
            .routes()
            .map(|(m, t)| (m.to_string(), t.to_string()))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("POST".to_string(), "/a".to_string()),
                ("ANY".to_string(), "/b/:x".to_string()),
            ]
        );
    }
}

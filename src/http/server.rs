//! HTTP server setup and dispatch.
//!
//! # Responsibilities
//! - Build the application state (config, route table, store, token codec)
//! - Wire up middleware (request id, tracing, CORS, panic catching, timeout)
//! - Give timed out requests the same envelope as handler errors
//! - Dispatch every request through the route table
//! - Read the body under the configured size limit
//! - Render handler outcomes and record request metrics
//! - Serve until the shutdown signal fires
//!
//! # Design Decisions
//! - axum only provides the catch-all route; matching is done by `routing::Router`
//! - Handler errors are rendered here so every failure shares the envelope
//! - Panics become a generic 500 envelope; detail only in debug mode

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::TokenCodec;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers::{self, Handler};
use crate::http::middleware::cors::cors_middleware;
use crate::http::request::ApiRequest;
use crate::http::response::render_error;
use crate::observability::metrics;
use crate::routing::{RouteError, Router as RouteTable};
use crate::store::Store;

const X_REQUEST_ID: &str = "x-request-id";

/// Label used for requests that matched no route.
const UNMATCHED: &str = "unmatched";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub routes: Arc<RouteTable<Handler>>,
    pub store: Store,
    pub tokens: Arc<TokenCodec>,
}

/// HTTP server for the build manager API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server over `store`.
    pub fn new(config: AppConfig, store: Store) -> Result<Self, RouteError> {
        let routes = handlers::api_routes(config.debug)?;
        let state = AppState {
            tokens: Arc::new(TokenCodec::from_config(&config.auth)),
            config: Arc::new(config),
            routes: Arc::new(routes),
            store,
        };

        let router = Self::build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let config = state.config.clone();
        let cors_policy = Arc::new(config.cors.clone());
        let debug = config.debug;

        Router::new()
            .route("/", any(dispatch))
            .route("/{*path}", any(dispatch))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::map_response(envelope_timeout))
            .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
                panic_response(panic, debug)
            }))
            .layer(middleware::from_fn_with_state(cors_policy, cors_middleware))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The assembled axum router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.state.routes.len(),
            debug = self.state.config.debug,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Resolve the route, run its handler and render the outcome.
async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let start = Instant::now();
    let debug = state.config.debug;
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();

    let Some(hit) = state.routes.resolve(&method, parts.uri.path()) else {
        tracing::debug!(method = %method, path = %parts.uri.path(), "No route matched");
        let err = ApiError::RouteNotFound {
            method: method.clone(),
            path: parts.uri.path().to_string(),
        };
        let response = render_error(&err, debug);
        metrics::record_request(method.as_str(), UNMATCHED, response.status().as_u16(), start);
        return response;
    };
    let handler = *hit.handler;
    let template = hit.template.to_string();
    let params = hit.params;

    // A fully streamed body can only fail here on the length limit.
    let body = match axum::body::to_bytes(body, state.config.security.max_body_size).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(error = %err, route = %template, "Request body rejected");
            let response = render_error(&ApiError::PayloadTooLarge, debug);
            metrics::record_request(method.as_str(), &template, response.status().as_u16(), start);
            return response;
        }
    };

    let request = ApiRequest::new(method.clone(), &parts.uri, params, parts.headers, body);
    let response = match handler(state.clone(), request).await {
        Ok(ok) => ok.into_response(),
        Err(err) => {
            if err.status().is_server_error() {
                tracing::error!(error = %err, route = %template, "Handler failed");
            } else {
                tracing::debug!(error = %err, route = %template, status = %err.status(), "Request rejected");
            }
            render_error(&err, debug)
        }
    };

    metrics::record_request(method.as_str(), &template, response.status().as_u16(), start);
    response
}

/// Per-request span carrying the id set by `SetRequestIdLayer`.
fn request_span(request: &Request) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = request_id(request.headers()),
    )
}

fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

/// The timeout layer answers with a bare 408; give it the error envelope.
async fn envelope_timeout(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return render_error(&ApiError::Timeout, false);
    }
    response
}

fn panic_response(panic: Box<dyn Any + Send + 'static>, debug: bool) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "Handler panicked");
    render_error(&ApiError::Internal(detail), debug)
}

//! Build manager API library.
//!
//! JSON over HTTP service for game character builds: accounts with bearer
//! tokens, a read-only character catalog, user-authored builds and favorites.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Domain
pub mod auth;
pub mod error;
pub mod handlers;
pub mod store;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use error::ApiError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::Store;

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, tracing, timeout)
//!     → middleware/cors.rs (origin policy, preflight short-circuit)
//!     → server.rs dispatch (route table lookup, bounded body read)
//!     → request.rs (params, query, JSON payload, bearer auth)
//!     → handler
//!     → response.rs (JSON envelope)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ApiRequest, Payload};
pub use response::ApiResponse;
pub use server::{AppState, HttpServer};

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (ordered route scan, method filter)
//!     → matcher.rs (segment-by-segment template match, param capture)
//!     → Return: handler + params, or NoMatch (404 upstream)
//!
//! Route Compilation (at startup):
//!     static route list (handlers/mod.rs)
//!     → compile templates, reject duplicate placeholders
//!     → Freeze as immutable Router shared via Arc
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by registration)

pub mod matcher;
pub mod router;

pub use matcher::{Params, PathTemplate, RouteError};
pub use router::{MethodFilter, RouteMatch, Router};

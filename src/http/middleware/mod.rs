//! Request middleware applied ahead of dispatch.

pub mod cors;

pub use cors::cors_middleware;

//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! register / login:
//!     password.rs (argon2 hash / verify)
//!     → token.rs issue(subject) → credential string returned to client
//!
//! protected request:
//!     Authorization: Bearer <credential>
//!     → bearer.rs (extract credential)
//!     → token.rs verify (signature, payload, expiry)
//!     → Claims handed to the handler, or 401
//! ```
//!
//! # Design Decisions
//! - No server side session store
//! - One generic failure for missing, forged and expired credentials

pub mod bearer;
pub mod password;
pub mod token;

use axum::http::HeaderMap;

pub use bearer::bearer_token;
pub use token::{unix_now, Claims, Subject, TokenCodec};

/// Verify the bearer credential carried by `headers`, if any.
pub fn authenticate(codec: &TokenCodec, headers: &HeaderMap) -> Option<Claims> {
    bearer_token(headers).and_then(|token| codec.verify(token))
}

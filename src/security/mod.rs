//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Upgrade request:
//!     → auth.rs (secret + user id)   → 401 and close on failure
//! Ordinary request:
//!     → auth.rs (secret, `/` exempt) → 401 "Unauthorized" on failure
//! ```
//!
//! # Design Decisions
//! - One shared secret for both entry points
//! - Fail closed: malformed credentials are refused, never ignored

pub mod auth;

pub use auth::{AuthError, SharedSecret, UserId};

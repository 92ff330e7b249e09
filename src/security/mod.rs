//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → http::middleware::access_control (enabled per config flag)
//!         → permissions.rs (API key or authenticated, body hash or admin)
//!         → digest.rs (MD5 of the re-serialized JSON body)
//!     → 403 on denial, otherwise pass to the gateway handler
//! ```

pub mod digest;
pub mod permissions;

pub use permissions::{has_api_key_or_authenticated, hash_in_header_or_admin};

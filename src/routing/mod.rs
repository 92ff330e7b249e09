//! Routing subsystem.
//!
//! # Responsibilities
//! - named.rs: reverse named path templates into concrete paths
//! - Gateway prefix matching lives in `http::server` (longest lookup prefix wins)

pub mod named;

pub use named::{NamedRoutes, RouteError};

//! Proxying subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound Request<Bytes>
//!     → ProxyService (Accept-Language, Remote-User, cookies, default payload)
//!     → ConnectionService dispatch
//!     → ResponseEnvelope | ServiceError
//! ```

pub mod pagination;
pub mod service;

pub use service::ProxyService;

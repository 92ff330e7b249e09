//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, trace, timeout)
//!     → middleware/ (remote user, access control)
//!     → request.rs (buffer body, inbound accessors)
//!     → proxy::ProxyService (relay to the matched service)
//!     → response.rs (envelope or error to HTTP response)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{AuthenticatedUser, RemoteUser};
pub use server::{AppState, HttpServer, X_REQUEST_ID};

//! Microservice request relay library.
//!
//! Forwards inbound HTTP requests to downstream services with injected
//! credentials, optional cookie and remote-user forwarding, and relays the
//! downstream response back as a [`service::ResponseEnvelope`].

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod resilience;
pub mod routing;
pub mod security;
pub mod service;
pub mod transport;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::ProxyService;
pub use service::{CallArgs, ConnectionService, ResponseEnvelope, ServiceDefinition, ServiceError};

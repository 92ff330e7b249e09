//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → ServiceDefinition per [[services]] entry
//! ```
//!
//! # Design Decisions
//! - Config is an explicit value passed to constructors; nothing reads globals
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CredentialsConfig, ListenerConfig, ObservabilityConfig, ProxyConfig, RelayConfig,
    SecurityConfig, ServiceConfig, TransportConfig,
};
pub use validation::ValidationError;

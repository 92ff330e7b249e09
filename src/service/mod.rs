//! Connection service subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceDefinition (per downstream: base location, credentials, registry, transport)
//!     → ConnectionService::new(target) (url.rs: strip prefix once, join)
//!     → produce_response(operation, args)
//!         → dispatch.rs: verb | extension | MethodNotAllowed
//!         → Transport
//!         → map_outcome: envelope.rs | connection refused | Decode error
//! ```
//!
//! # Design Decisions
//! - Only `MethodNotAllowed` and `Decode` reach the caller as errors
//! - Definitions are shared (`Arc`), services are built per call

pub mod connection;
pub mod definition;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod url;

pub use connection::ConnectionService;
pub use definition::{DefinitionError, ServiceDefinition, ServiceDefinitionBuilder};
pub use dispatch::{
    CallArgs, CallContext, ExtensionHandler, HandlerResult, MethodRegistry, Passthrough,
    SEND_FILE, STANDARD_METHODS,
};
pub use envelope::ResponseEnvelope;
pub use error::{HandlerError, ServiceError};

//! Startup orchestration.
//!
//! # Responsibilities
//! - Build one service definition per `[[services]]` entry
//!
//! All definitions share a single transport, so connections are pooled
//! across every downstream.

use std::sync::Arc;

use thiserror::Error;

use crate::config::RelayConfig;
use crate::service::{DefinitionError, ServiceDefinition};
use crate::transport::{ReqwestTransport, Transport, TransportError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Build definitions for every configured service over `transport`.
pub fn build_definitions(
    config: &RelayConfig,
    transport: Arc<dyn Transport>,
) -> Result<Vec<ServiceDefinition>, DefinitionError> {
    config
        .services
        .iter()
        .map(|service| {
            ServiceDefinition::builder_from_config(config, service)
                .transport(transport.clone())
                .build()
        })
        .collect()
}

/// Build every definition over one pooled transport from `[transport]`.
pub fn build(config: &RelayConfig) -> Result<Vec<ServiceDefinition>, StartupError> {
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(&config.transport)?);
    let definitions = build_definitions(config, transport)?;

    tracing::info!(
        services = definitions.len(),
        retries = config.transport.connect_retries,
        "Service definitions ready"
    );
    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_build_definitions_shares_transport() {
        let config = parse_config(
            r#"
            [[services]]
            name = "products"
            base_location = "http://products:8000"
            lookup_prefix = "/products-api"

            [[services]]
            name = "orders"
            base_location = "http://orders:8000"
            lookup_prefix = "/orders-api"
            "#,
        )
        .unwrap();
        let transport: Arc<dyn Transport> =
            Arc::new(ReqwestTransport::new(&config.transport).unwrap());

        let definitions = build_definitions(&config, transport.clone()).unwrap();
        assert_eq!(definitions.len(), 2);
        assert_eq!(definitions[1].lookup_prefix(), "/orders-api");
        assert!(Arc::ptr_eq(&definitions[0].transport(), &definitions[1].transport()));
    }
}

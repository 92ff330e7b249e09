//! Static description of one downstream service.

use std::future::Future;
use std::sync::Arc;

use axum::http::header::{HeaderName, HeaderValue};
use axum::http::HeaderMap;
use thiserror::Error;

use crate::config::{RelayConfig, ServiceConfig};
use crate::routing::NamedRoutes;
use crate::service::dispatch::{CallArgs, CallContext, HandlerResult, MethodRegistry};
use crate::transport::{ReqwestTransport, Transport, TransportError};

/// Errors raised while building a [`ServiceDefinition`].
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("credential for service '{0}' is not a valid header value")]
    InvalidCredential(String),

    #[error("custom header '{name}' for service '{service}' is invalid")]
    InvalidHeader { service: String, name: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

struct DefinitionInner {
    name: String,
    base_location: Option<String>,
    lookup_prefix: String,
    authorization: HeaderValue,
    custom_headers: HeaderMap,
    methods: MethodRegistry,
    routes: NamedRoutes,
    pagination: (String, String),
    transport: Arc<dyn Transport>,
}

/// Immutable, cheaply cloned description of a downstream.
///
/// Every [`ConnectionService`](crate::service::ConnectionService) built from
/// one definition shares its transport and connection pool.
#[derive(Clone)]
pub struct ServiceDefinition {
    inner: Arc<DefinitionInner>,
}

impl ServiceDefinition {
    pub fn builder(name: impl Into<String>) -> ServiceDefinitionBuilder {
        ServiceDefinitionBuilder::new(name)
    }

    /// Builder preloaded from a `[[services]]` entry.
    ///
    /// Extension names from the file are only declared; attach handlers with
    /// [`ServiceDefinitionBuilder::extension`].
    pub fn builder_from_config(config: &RelayConfig, service: &ServiceConfig) -> ServiceDefinitionBuilder {
        let mut builder = ServiceDefinitionBuilder::new(service.name.clone())
            .lookup_prefix(service.lookup_prefix.clone())
            .api_key_header(config.credentials.api_key_header.clone())
            .api_key(service.api_key.clone())
            .pagination(service.pagination_before.clone(), service.pagination_after.clone())
            .routes(NamedRoutes::from_map(config.routes.clone()));
        builder.transport_config = Some(config.transport.clone());
        if let Some(base) = &service.base_location {
            builder = builder.base_location(base.clone());
        }
        for (name, value) in &service.headers {
            builder = builder.custom_header(name.clone(), value.clone());
        }
        for name in &service.extension_methods {
            builder = builder.declare(name.clone());
        }
        builder
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn base_location(&self) -> Option<&str> {
        self.inner.base_location.as_deref()
    }

    pub fn lookup_prefix(&self) -> &str {
        &self.inner.lookup_prefix
    }

    pub fn authorization(&self) -> &HeaderValue {
        &self.inner.authorization
    }

    pub fn custom_headers(&self) -> &HeaderMap {
        &self.inner.custom_headers
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.inner.methods
    }

    pub fn routes(&self) -> &NamedRoutes {
        &self.inner.routes
    }

    /// Substring pair rewritten in pagination links.
    pub fn pagination(&self) -> (&str, &str) {
        (&self.inner.pagination.0, &self.inner.pagination.1)
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.inner.transport.clone()
    }
}

impl std::fmt::Debug for ServiceDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDefinition")
            .field("name", &self.inner.name)
            .field("base_location", &self.inner.base_location)
            .field("lookup_prefix", &self.inner.lookup_prefix)
            .field("methods", &self.inner.methods)
            .finish()
    }
}

/// Builder for [`ServiceDefinition`].
pub struct ServiceDefinitionBuilder {
    name: String,
    base_location: Option<String>,
    lookup_prefix: String,
    api_key_header: String,
    api_key: String,
    custom_headers: Vec<(String, String)>,
    methods: MethodRegistry,
    routes: NamedRoutes,
    pagination: (String, String),
    transport: Option<Arc<dyn Transport>>,
    transport_config: Option<crate::config::TransportConfig>,
}

impl ServiceDefinitionBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_location: None,
            lookup_prefix: String::new(),
            api_key_header: crate::config::CredentialsConfig::default().api_key_header,
            api_key: String::new(),
            custom_headers: Vec::new(),
            methods: MethodRegistry::new(),
            routes: NamedRoutes::default(),
            pagination: (String::new(), String::new()),
            transport: None,
            transport_config: None,
        }
    }

    pub fn base_location(mut self, base: impl Into<String>) -> Self {
        self.base_location = Some(base.into());
        self
    }

    pub fn lookup_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.lookup_prefix = prefix.into();
        self
    }

    /// Scheme word written before the key, e.g. `ACCESS-KEY`.
    pub fn api_key_header(mut self, header: impl Into<String>) -> Self {
        self.api_key_header = header.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    pub fn custom_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Declare an operation name without a handler.
    pub fn declare(mut self, name: impl Into<String>) -> Self {
        self.methods.declare(name);
        self
    }

    /// Register an extension operation.
    pub fn extension<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(CallContext, CallArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.methods.register(name, handler);
        self
    }

    pub fn routes(mut self, routes: NamedRoutes) -> Self {
        self.routes = routes;
        self
    }

    pub fn pagination(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.pagination = (before.into(), after.into());
        self
    }

    /// Use an existing transport (shared pool, or a test double).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<ServiceDefinition, DefinitionError> {
        let authorization = HeaderValue::try_from(format!("{} {}", self.api_key_header, self.api_key))
            .map_err(|_| DefinitionError::InvalidCredential(self.name.clone()))?;

        let mut custom_headers = HeaderMap::new();
        for (name, value) in &self.custom_headers {
            let invalid = || DefinitionError::InvalidHeader {
                service: self.name.clone(),
                name: name.clone(),
            };
            let header_name = HeaderName::try_from(name.as_str()).map_err(|_| invalid())?;
            let header_value = HeaderValue::try_from(value.as_str()).map_err(|_| invalid())?;
            custom_headers.insert(header_name, header_value);
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let config = self.transport_config.unwrap_or_default();
                Arc::new(ReqwestTransport::new(&config)?) as Arc<dyn Transport>
            }
        };

        Ok(ServiceDefinition {
            inner: Arc::new(DefinitionInner {
                name: self.name,
                base_location: self.base_location,
                lookup_prefix: self.lookup_prefix,
                authorization,
                custom_headers,
                methods: self.methods,
                routes: self.routes,
                pagination: self.pagination,
                transport,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let definition = ServiceDefinition::builder("plain").build().unwrap();
        assert_eq!(definition.authorization(), "X-ACCESS-KEY ");
        assert_eq!(definition.base_location(), None);
        assert_eq!(definition.methods().method_names(), ["send_file"]);
    }

    #[test]
    fn test_from_config() {
        let config: RelayConfig = toml::from_str(
            r#"
            [credentials]
            api_key_header = "ACCESS-KEY"

            [routes]
            product = "/api/v1/products/{id}/"

            [[services]]
            name = "products"
            base_location = "http://container:8000"
            api_key = "sadwqe.qweoj23aQ"
            extension_methods = ["archive"]
            pagination_before = "/api/v1/"
            pagination_after = "/api/v2/"

            [services.headers]
            X-Custom-Field = "ABC"
            "#,
        )
        .unwrap();

        let definition = ServiceDefinition::builder_from_config(&config, &config.services[0])
            .build()
            .unwrap();
        assert_eq!(definition.authorization(), "ACCESS-KEY sadwqe.qweoj23aQ");
        assert_eq!(definition.custom_headers()["x-custom-field"], "ABC");
        assert_eq!(definition.methods().method_names(), ["send_file", "archive"]);
        assert_eq!(definition.pagination(), ("/api/v1/", "/api/v2/"));
        assert!(definition.routes().contains("product"));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let err = ServiceDefinition::builder("bad")
            .custom_header("Bad Header", "x")
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidHeader { .. }));

        let err = ServiceDefinition::builder("bad")
            .api_key("line\nbreak")
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidCredential(_)));
    }
}

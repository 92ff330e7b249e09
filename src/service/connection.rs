//! Connection service: one logical call to a downstream.
//!
//! # Responsibilities
//! - Resolve the downstream URL from a prefix-stripped path
//! - Assemble credential, special and custom headers
//! - Dispatch an operation and map its outcome to an envelope

use std::time::Instant;

use axum::http::header::{HeaderName, HeaderValue, AUTHORIZATION};
use axum::http::{HeaderMap, Method};

use crate::observability::metrics;
use crate::routing::RouteError;
use crate::service::definition::ServiceDefinition;
use crate::service::dispatch::{
    map_outcome, CallArgs, CallContext, Passthrough, Resolved, STANDARD_METHODS,
};
use crate::service::envelope::ResponseEnvelope;
use crate::service::error::ServiceError;
use crate::service::url;
use crate::transport::OutboundRequest;

/// Replace every header of `base` that `other` also carries.
pub(crate) fn overlay(base: &mut HeaderMap, other: &HeaderMap) {
    for name in other.keys() {
        base.remove(name);
    }
    for (name, value) in other {
        base.append(name.clone(), value.clone());
    }
}

/// A downstream call target bound to one resolved URL.
#[derive(Debug, Clone)]
pub struct ConnectionService {
    definition: ServiceDefinition,
    url: String,
    special_headers: HeaderMap,
}

impl ConnectionService {
    pub fn new(definition: &ServiceDefinition, target: &str) -> Self {
        let mut service = Self {
            definition: definition.clone(),
            url: String::new(),
            special_headers: HeaderMap::new(),
        };
        service.set_url(target);
        service
    }

    /// Like [`ConnectionService::new`] with caller-supplied headers.
    ///
    /// Entries that are not valid header names or values are skipped.
    pub fn with_special_headers<I, K, V>(definition: &ServiceDefinition, target: &str, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut service = Self::new(definition, target);
        for (name, value) in headers {
            let parsed = (
                HeaderName::try_from(name.as_ref()),
                HeaderValue::try_from(value.as_ref()),
            );
            match parsed {
                (Ok(name), Ok(value)) => {
                    service.special_headers.insert(name, value);
                }
                _ => tracing::debug!(
                    service = %definition.name(),
                    header = %name.as_ref(),
                    "Ignoring malformed special header"
                ),
            }
        }
        service
    }

    /// Construct and immediately produce a response.
    pub async fn one_shot(
        definition: &ServiceDefinition,
        target: &str,
        operation: &str,
        args: CallArgs,
    ) -> Result<ResponseEnvelope, ServiceError> {
        Self::new(definition, target).produce_response(operation, args).await
    }

    pub fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Recompute the resolved URL for `target`.
    pub fn set_url(&mut self, target: &str) -> &str {
        self.url = url::resolve_url(
            self.definition.base_location(),
            self.definition.lookup_prefix(),
            target,
        );
        &self.url
    }

    pub fn join_url(host: &str, path: &str) -> String {
        url::join_url(host, path)
    }

    /// Path for a named route of the host routing table.
    pub fn reverse_url(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        self.definition.routes().reverse(name, params)
    }

    pub fn http_method_names() -> &'static [&'static str] {
        &STANDARD_METHODS
    }

    /// Extension operation names.
    pub fn method_names(&self) -> &[String] {
        self.definition.methods().method_names()
    }

    pub fn allowed_methods(&self) -> Vec<String> {
        STANDARD_METHODS.iter().map(|m| m.to_uppercase()).collect()
    }

    pub fn authorization_header(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.definition.authorization().clone());
        headers
    }

    pub fn special_headers(&self) -> &HeaderMap {
        &self.special_headers
    }

    /// Authorization, then special headers, then custom headers; later wins.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = self.authorization_header();
        overlay(&mut headers, &self.special_headers);
        overlay(&mut headers, self.definition.custom_headers());
        headers
    }

    /// Parameters shared by every downstream request of this service.
    pub fn request_params(&self) -> OutboundRequest {
        OutboundRequest::new(Method::GET, self.url.clone(), self.headers())
    }

    pub async fn produce_response(
        &self,
        operation: &str,
        args: CallArgs,
    ) -> Result<ResponseEnvelope, ServiceError> {
        self.dispatch(operation, args, self.request_params(), Passthrough::default(), None)
            .await
    }

    pub(crate) async fn dispatch(
        &self,
        operation: &str,
        args: CallArgs,
        template: OutboundRequest,
        passthrough: Passthrough,
        inbound_path: Option<&str>,
    ) -> Result<ResponseEnvelope, ServiceError> {
        let start = Instant::now();
        let service = self.definition.name();
        let operation = operation.to_lowercase();

        let Some(resolved) = self.definition.methods().resolve(&operation) else {
            tracing::warn!(
                service = %service,
                operation = %operation,
                path = inbound_path.unwrap_or_default(),
                "Method not allowed, register it as an extension method"
            );
            metrics::record_dispatch(service, &operation, "rejected", start);
            return Err(ServiceError::method_not_allowed(operation));
        };

        tracing::debug!(service = %service, operation = %operation, url = %self.url, "Dispatching");

        let summary = args.summary();
        let ctx = CallContext::new(self.definition.transport(), template, passthrough);
        let outcome = match resolved {
            Resolved::Verb(method) => ctx.execute(method, args).await,
            Resolved::Extension(handler) => handler.call(ctx, args).await,
        };

        let transport_failed = outcome.is_err();
        let result = map_outcome(service, &operation, &summary, outcome);
        let label = match &result {
            Ok(_) if transport_failed => "connection_refused",
            Ok(_) => "ok",
            Err(_) => "decode_error",
        };
        metrics::record_dispatch(service, &operation, label, start);
        result
    }
}

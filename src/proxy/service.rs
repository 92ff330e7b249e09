//! Proxying service: a connection service bound to one inbound request.

use axum::body::Bytes;
use axum::http::header::{HeaderName, HeaderValue, ACCEPT_LANGUAGE};
use axum::http::{HeaderMap, Request};

use crate::config::ProxyConfig;
use crate::http::request::{self as inbound, REMOTE_USER};
use crate::proxy::pagination;
use crate::service::connection::overlay;
use crate::service::{CallArgs, ConnectionService, Passthrough, ResponseEnvelope, ServiceDefinition, ServiceError};
use crate::transport::OutboundRequest;

/// Relays one inbound request to a downstream service.
#[derive(Debug)]
pub struct ProxyService<'r> {
    connection: ConnectionService,
    request: &'r Request<Bytes>,
    options: ProxyConfig,
}

impl<'r> ProxyService<'r> {
    pub fn new(
        definition: &ServiceDefinition,
        request: &'r Request<Bytes>,
        target: &str,
        options: ProxyConfig,
    ) -> Self {
        Self::from_connection(ConnectionService::new(definition, target), request, options)
    }

    /// Target the inbound request path.
    pub fn for_request(definition: &ServiceDefinition, request: &'r Request<Bytes>, options: ProxyConfig) -> Self {
        Self::new(definition, request, request.uri().path(), options)
    }

    /// Wrap an already configured connection, e.g. one with special headers.
    pub fn from_connection(connection: ConnectionService, request: &'r Request<Bytes>, options: ProxyConfig) -> Self {
        Self {
            connection,
            request,
            options,
        }
    }

    pub fn connection(&self) -> &ConnectionService {
        &self.connection
    }

    pub fn request(&self) -> &Request<Bytes> {
        self.request
    }

    pub fn options(&self) -> &ProxyConfig {
        &self.options
    }

    pub fn url(&self) -> &str {
        self.connection.url()
    }

    pub fn set_url(&mut self, target: &str) -> &str {
        self.connection.set_url(target)
    }

    /// Inbound-derived headers overlaid with the connection headers.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(language) = inbound::accept_language(self.request) {
            headers.insert(ACCEPT_LANGUAGE, language.clone());
        }
        if self.options.proxy_remote_user {
            if let Some(user) = inbound::authenticated_user(self.request) {
                headers.insert(HeaderName::from_static(REMOTE_USER), HeaderValue::from(user.id));
            }
        }
        overlay(&mut headers, &self.connection.headers());
        headers
    }

    /// Inbound cookies, forwarded only when enabled.
    pub fn cookies(&self) -> Option<Vec<(String, String)>> {
        self.options
            .send_cookies
            .then(|| inbound::cookies(self.request))
    }

    pub fn request_params(&self) -> OutboundRequest {
        let mut params = self.connection.request_params();
        params.headers = self.headers();
        params.cookies = self.cookies();
        params
    }

    /// Execute `operation`, defaulting to the inbound method.
    pub async fn produce_response(
        &self,
        operation: Option<&str>,
        args: CallArgs,
    ) -> Result<ResponseEnvelope, ServiceError> {
        let operation = operation.unwrap_or_else(|| self.request.method().as_str());
        let passthrough = Passthrough {
            query: inbound::query_pairs(self.request),
            body: inbound::body_payload(self.request),
        };
        self.connection
            .dispatch(
                operation,
                args,
                self.request_params(),
                passthrough,
                Some(self.request.uri().path()),
            )
            .await
    }

    /// Point a downstream link (e.g. a pagination `next`) at the gateway.
    pub fn rewrite_downstream_host(&self, text: &str) -> String {
        let gateway = self.gateway_host();
        let definition = self.connection.definition();
        let (before, after) = definition.pagination();
        pagination::rewrite_link(text, definition.base_location(), &gateway, before, after)
    }

    /// Configured gateway host, else the scheme and host the caller used.
    fn gateway_host(&self) -> String {
        if let Some(host) = &self.options.gateway_host {
            return host.clone();
        }
        match inbound::host(self.request) {
            Some(host) => format!("{}://{}", inbound::scheme(self.request), host),
            None => String::new(),
        }
    }
}

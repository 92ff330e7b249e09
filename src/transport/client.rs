//! Pooled, retrying HTTP transport backed by reqwest.
//!
//! # Responsibilities
//! - Own one `reqwest::Client` (connection pool for http and https)
//! - Translate `OutboundRequest` into a reqwest request per attempt
//! - Retry connect-phase failures with exponential backoff
//! - Buffer the response body

use axum::http::header;
use futures_util::future::{BoxFuture, FutureExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};

use crate::config::TransportConfig;
use crate::resilience::RetryPolicy;
use crate::transport::{FilePart, OutboundRequest, Payload, RawResponse, Transport, TransportError};

/// Transport that performs real HTTP calls.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    retry: RetryPolicy,
}

impl ReqwestTransport {
    /// Create a transport from configuration.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(max_idle) = config.pool_max_idle_per_host {
            builder = builder.pool_max_idle_per_host(max_idle);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self::with_client(client, RetryPolicy::from_config(config)))
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn build(&self, request: &OutboundRequest) -> Result<RequestBuilder, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(cookie) = request.cookie_header() {
            builder = builder.header(header::COOKIE, cookie);
        }

        let builder = match &request.payload {
            None => builder,
            Some(Payload::Json(value)) => builder.json(value),
            Some(Payload::Form(fields)) => builder.form(fields),
            Some(Payload::Raw { content_type, bytes }) => {
                let builder = builder.body(bytes.clone());
                match content_type {
                    Some(ct) => builder.header(header::CONTENT_TYPE, ct.as_str()),
                    None => builder,
                }
            }
            Some(Payload::Multipart { fields, files }) => {
                builder.multipart(multipart_form(fields, files)?)
            }
        };

        Ok(builder)
    }

    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        let mut retry = 0;

        loop {
            let attempt = self.build(&request)?;

            match attempt.send().await {
                Ok(response) => {
                    let status = response.status();
                    let headers = response.headers().clone();
                    let body = response.bytes().await.map_err(|e| TransportError::Request {
                        url: request.url.clone(),
                        reason: e.to_string(),
                    })?;

                    tracing::debug!(
                        method = %request.method,
                        url = %request.url,
                        status = %status,
                        retries = retry,
                        "Downstream responded"
                    );
                    return Ok(RawResponse::new(status, headers, body));
                }
                Err(e) if e.is_builder() => {
                    return Err(TransportError::InvalidRequest(e.to_string()));
                }
                Err(e) => {
                    let connect_failure = e.is_connect();
                    if let Some(delay) = self.retry.next_delay(retry, connect_failure) {
                        tracing::warn!(
                            url = %request.url,
                            attempt = retry + 1,
                            delay = ?delay,
                            error = %e,
                            "Connect failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        retry += 1;
                        continue;
                    }

                    return Err(if connect_failure {
                        TransportError::Connect {
                            url: request.url.clone(),
                            attempts: retry + 1,
                            reason: e.to_string(),
                        }
                    } else {
                        TransportError::Request {
                            url: request.url.clone(),
                            reason: e.to_string(),
                        }
                    });
                }
            }
        }
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: OutboundRequest) -> BoxFuture<'_, Result<RawResponse, TransportError>> {
        self.send(request).boxed()
    }
}

fn multipart_form(fields: &[(String, String)], files: &[FilePart]) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name.clone(), value.clone());
    }
    for file in files {
        let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        }
        form = form.part(file.field.clone(), part);
    }
    Ok(form)
}

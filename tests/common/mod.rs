//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use microservice_relay::service::ServiceDefinition;
use microservice_relay::transport::{OutboundRequest, RawResponse, Transport, TransportError};

/// Transport returning scripted outcomes and recording every request.
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<OutboundRequest>>,
    outcomes: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a JSON response.
    pub fn respond_json(&self, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).unwrap();
        self.push(Ok(RawResponse::json(status, &body)));
    }

    /// Queue a response with a raw body and content type.
    pub fn respond_raw(&self, status: u16, content_type: &str, body: &'static str) {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", content_type.parse().unwrap());
        let status = StatusCode::from_u16(status).unwrap();
        self.push(Ok(RawResponse::new(status, headers, body)));
    }

    /// Queue a connection failure.
    pub fn refuse(&self) {
        self.push(Err(TransportError::Connect {
            url: "http://downstream".into(),
            attempts: 4,
            reason: "connection refused".into(),
        }));
    }

    pub fn push(&self, outcome: Result<RawResponse, TransportError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> OutboundRequest {
        self.requests().pop().expect("no request recorded")
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: OutboundRequest) -> BoxFuture<'_, Result<RawResponse, TransportError>> {
        self.requests.lock().unwrap().push(request);
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RawResponse::json(StatusCode::OK, &Value::Null)));
        async move { outcome }.boxed()
    }
}

/// The `external` service used across the tests.
pub fn external_service(transport: Arc<MockTransport>) -> ServiceDefinition {
    ServiceDefinition::builder("external")
        .base_location("https://api.external-service.com")
        .lookup_prefix("/external")
        .api_key_header("ACCESS-KEY")
        .api_key("12345-qwerty-98765")
        .custom_header("X-Custom-Field", "ABC")
        .transport(transport)
        .build()
        .unwrap()
}

/// Start a raw HTTP/1.1 backend on an ephemeral port.
///
/// `f` receives the raw request text and returns status line, content type
/// and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (&'static str, &'static str, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let raw = read_request(&mut socket).await;

                        let (status, content_type, body) = f(raw).await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            content_type,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Read one request: the head plus `Content-Length` bytes of body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}

/// An address nothing listens on.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

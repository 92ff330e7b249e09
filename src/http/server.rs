//! HTTP gateway setup.
//!
//! # Responsibilities
//! - Create the Axum router with one catch-all relay handler
//! - Wire up middleware (trace, timeout, request id, remote user, access control)
//! - Select the downstream service by lookup prefix
//! - Relay through `ProxyService` and map the outcome to a response

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ProxyConfig, RelayConfig};
use crate::http::middleware::{access_control_middleware, remote_user_middleware, AccessControlState};
use crate::http::request::{self, RemoteUser};
use crate::http::response::detail;
use crate::proxy::ProxyService;
use crate::service::{CallArgs, ResponseEnvelope, ServiceDefinition};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Pagination fields rewritten to point at the gateway.
const PAGINATION_LINKS: [&str; 2] = ["next", "previous"];

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    services: Arc<Vec<ServiceDefinition>>,
    proxy: ProxyConfig,
    max_body_size: usize,
}

impl AppState {
    pub fn new(mut services: Vec<ServiceDefinition>, proxy: ProxyConfig, max_body_size: usize) -> Self {
        // Longest prefix first so nested prefixes win.
        services.sort_by_key(|s| std::cmp::Reverse(s.lookup_prefix().len()));
        Self {
            services: Arc::new(services),
            proxy,
            max_body_size,
        }
    }

    /// Service whose lookup prefix owns `path`.
    pub fn route(&self, path: &str) -> Option<&ServiceDefinition> {
        self.services
            .iter()
            .find(|service| prefix_matches(service.lookup_prefix(), path))
    }
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    let Some(rest) = path.strip_prefix(prefix) else {
        return false;
    };
    prefix.is_empty() || prefix.ends_with('/') || rest.is_empty() || rest.starts_with('/')
}

/// HTTP gateway relaying to the configured services.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &RelayConfig, services: Vec<ServiceDefinition>) -> Self {
        let state = AppState::new(services, config.proxy.clone(), config.security.max_body_size);
        let access = AccessControlState::new(config.credentials.clone(), &config.security);
        let timeout = Duration::from_secs(config.listener.request_timeout_secs);
        Self {
            router: Self::build_router(state, access, timeout),
        }
    }

    #[allow(deprecated)]
    fn build_router(state: AppState, access: AccessControlState, timeout: Duration) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        let mut router = Router::new()
            .route("/{*path}", any(relay_handler))
            .route("/", any(relay_handler))
            .with_state(state);

        if access.is_enabled() {
            router = router.layer(middleware::from_fn_with_state(access, access_control_middleware));
        }

        router
            .layer(middleware::from_fn(remote_user_middleware))
            .layer(TimeoutLayer::new(timeout))
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
    }

    /// The assembled router, e.g. for driving it without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP gateway starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP gateway stopped");
        Ok(())
    }
}

/// Relay one inbound request to the service owning its path.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request = match request::buffer(request, state.max_body_size).await {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let path = request.uri().path();
    let Some(definition) = state.route(path) else {
        tracing::warn!(path = %path, "No service matched");
        return detail(StatusCode::NOT_FOUND, "Not found.");
    };

    let remote_user = request.extensions().get::<RemoteUser>().and_then(|user| user.0);
    tracing::debug!(
        service = %definition.name(),
        method = %request.method(),
        path = %path,
        remote_user = ?remote_user,
        "Relaying request"
    );

    let proxy = ProxyService::for_request(definition, &request, state.proxy.clone());
    match proxy.produce_response(None, CallArgs::new()).await {
        Ok(envelope) => rewrite_pagination(&proxy, envelope).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Point top-level pagination links of a list response at the gateway.
fn rewrite_pagination(proxy: &ProxyService<'_>, envelope: ResponseEnvelope) -> ResponseEnvelope {
    let (status, mut body, headers, content_type) = envelope.into_parts();
    if let Value::Object(fields) = &mut body {
        for key in PAGINATION_LINKS {
            if let Some(Value::String(link)) = fields.get_mut(key) {
                *link = proxy.rewrite_downstream_host(link);
            }
        }
    }
    ResponseEnvelope::new(status, body, headers, content_type)
}

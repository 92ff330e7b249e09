//! Operation dispatch.
//!
//! # Responsibilities
//! - Hold the registry of extension operations and their handlers
//! - Resolve an operation name to a verb executor or an extension handler
//! - Assemble outbound requests for verb executors
//! - Map a handler outcome to an envelope or a caller-visible error
//!
//! # Design Decisions
//! - Registration is explicit: a name must be declared AND have a handler
//! - Handlers return `Result`; every `Err` collapses to connection-refused

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::{HeaderMap, Method};
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::service::envelope::ResponseEnvelope;
use crate::service::error::{HandlerError, ServiceError};
use crate::transport::{FilePart, OutboundRequest, Payload, RawResponse, Transport};

/// Verbs every service accepts, in order.
pub const STANDARD_METHODS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

/// Built-in extension sending a multipart body.
pub const SEND_FILE: &str = "send_file";

pub type HandlerResult = Result<RawResponse, HandlerError>;

/// Keyword arguments of one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    /// Query parameters; `None` falls back to the inbound query.
    pub params: Option<Vec<(String, String)>>,
    /// Body; `None` (or an empty payload) falls back to the inbound body.
    pub data: Option<Payload>,
    /// Files for multipart uploads.
    pub files: Vec<FilePart>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(value: Value) -> Self {
        Self::new().with_data(Payload::Json(value))
    }

    pub fn with_data(mut self, data: Payload) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params = Some(params.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn with_file(mut self, file: FilePart) -> Self {
        self.files.push(file);
        self
    }

    /// Short description for logs; never includes body contents.
    pub fn summary(&self) -> String {
        let data = match &self.data {
            None => "none",
            Some(Payload::Json(_)) => "json",
            Some(Payload::Form(_)) => "form",
            Some(Payload::Raw { .. }) => "raw",
            Some(Payload::Multipart { .. }) => "multipart",
        };
        format!(
            "params={} data={} files={}",
            self.params.as_ref().map_or(0, Vec::len),
            data,
            self.files.len()
        )
    }
}

/// Inbound values verb executors fall back to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Passthrough {
    pub query: Vec<(String, String)>,
    pub body: Option<Payload>,
}

/// Everything a handler needs to reach the downstream.
#[derive(Clone)]
pub struct CallContext {
    transport: Arc<dyn Transport>,
    template: OutboundRequest,
    passthrough: Passthrough,
}

impl CallContext {
    pub fn new(transport: Arc<dyn Transport>, template: OutboundRequest, passthrough: Passthrough) -> Self {
        Self {
            transport,
            template,
            passthrough,
        }
    }

    pub fn url(&self) -> &str {
        &self.template.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.template.headers
    }

    pub fn passthrough(&self) -> &Passthrough {
        &self.passthrough
    }

    /// Explicit data wins unless it is empty; otherwise the inbound body.
    fn body(&self, data: Option<Payload>) -> Option<Payload> {
        data.filter(|d| !d.is_empty())
            .or_else(|| self.passthrough.body.clone())
            .filter(|d| !d.is_empty())
    }

    /// Outbound request a generic verb executor sends for `method`.
    pub fn request(&self, method: Method, args: CallArgs) -> OutboundRequest {
        let mut request = self.template.clone();
        let reads_query = matches!(method, Method::GET | Method::HEAD | Method::OPTIONS);
        request.method = method;

        if reads_query {
            request.query = args
                .params
                .filter(|params| !params.is_empty())
                .unwrap_or_else(|| self.passthrough.query.clone());
            return request;
        }

        request.query = args.params.unwrap_or_default();
        let body = self.body(args.data);
        request.payload = if args.files.is_empty() {
            body
        } else {
            Some(Payload::Multipart {
                fields: body.map(|b| b.form_fields()).unwrap_or_default(),
                files: args.files,
            })
        };
        request
    }

    /// Send `request` as-is.
    pub async fn send(self, request: OutboundRequest) -> HandlerResult {
        Ok(self.transport.execute(request).await?)
    }

    /// Generic verb executor.
    pub async fn execute(self, method: Method, args: CallArgs) -> HandlerResult {
        let request = self.request(method, args);
        self.send(request).await
    }

    /// Multipart POST of files and data fields, whatever the inbound method.
    pub async fn send_file(self, args: CallArgs) -> HandlerResult {
        let mut request = self.template.clone();
        request.method = Method::POST;
        request.query = args.params.unwrap_or_default();
        request.payload = Some(Payload::Multipart {
            fields: self.body(args.data).map(|b| b.form_fields()).unwrap_or_default(),
            files: args.files,
        });
        self.send(request).await
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("template", &self.template)
            .field("passthrough", &self.passthrough)
            .finish()
    }
}

/// A named extension operation.
pub trait ExtensionHandler: Send + Sync {
    fn call(&self, ctx: CallContext, args: CallArgs) -> BoxFuture<'static, HandlerResult>;
}

struct FnHandler<F>(F);

impl<F, Fut> ExtensionHandler for FnHandler<F>
where
    F: Fn(CallContext, CallArgs) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: CallContext, args: CallArgs) -> BoxFuture<'static, HandlerResult> {
        (self.0)(ctx, args).boxed()
    }
}

/// Outcome of resolving an operation name.
pub enum Resolved {
    Verb(Method),
    Extension(Arc<dyn ExtensionHandler>),
}

/// Declared extension operations and their handlers.
#[derive(Clone)]
pub struct MethodRegistry {
    declared: Vec<String>,
    handlers: HashMap<String, Arc<dyn ExtensionHandler>>,
}

impl MethodRegistry {
    /// Registry with the built-in `send_file` operation.
    pub fn new() -> Self {
        let mut registry = Self {
            declared: Vec::new(),
            handlers: HashMap::new(),
        };
        registry.register(SEND_FILE, |ctx: CallContext, args: CallArgs| ctx.send_file(args));
        registry
    }

    /// Declare an operation name. Without a handler it is still rejected.
    pub fn declare(&mut self, name: impl Into<String>) {
        let name = name.into().to_lowercase();
        if !self.declared.contains(&name) {
            self.declared.push(name);
        }
    }

    /// Declare an operation and attach its handler.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(CallContext, CallArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let name = name.into().to_lowercase();
        self.declare(name.clone());
        self.handlers.insert(name, Arc::new(FnHandler(handler)));
    }

    /// Extension names: built-ins first, then declared extras in order.
    pub fn method_names(&self) -> &[String] {
        &self.declared
    }

    /// Names accepted by dispatch: standard verbs then extensions.
    pub fn all_names(&self) -> Vec<String> {
        STANDARD_METHODS
            .iter()
            .map(|m| m.to_string())
            .chain(self.declared.iter().cloned())
            .collect()
    }

    pub fn is_standard(operation: &str) -> bool {
        STANDARD_METHODS.contains(&operation)
    }

    /// Resolve a lower-cased operation name.
    pub fn resolve(&self, operation: &str) -> Option<Resolved> {
        if Self::is_standard(operation) {
            let method = Method::from_bytes(operation.to_uppercase().as_bytes()).ok()?;
            return Some(Resolved::Verb(method));
        }
        if !self.declared.iter().any(|name| name == operation) {
            return None;
        }
        self.handlers
            .get(operation)
            .map(|handler| Resolved::Extension(handler.clone()))
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handled: Vec<&String> = self.handlers.keys().collect();
        handled.sort();
        f.debug_struct("MethodRegistry")
            .field("declared", &self.declared)
            .field("handled", &handled)
            .finish()
    }
}

/// Map a handler outcome to the caller-visible result.
pub fn map_outcome(
    service: &str,
    operation: &str,
    args_summary: &str,
    outcome: HandlerResult,
) -> Result<ResponseEnvelope, ServiceError> {
    let raw = match outcome {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!(
                service = %service,
                operation = %operation,
                args = %args_summary,
                error = %e,
                "Connection error, no downstream response"
            );
            return Ok(ResponseEnvelope::connection_refused());
        }
    };

    match raw.decode() {
        Ok(body) => Ok(ResponseEnvelope::from_raw(raw, body)),
        Err(source) => {
            tracing::warn!(
                service = %service,
                operation = %operation,
                status = %raw.status,
                "Downstream body is not JSON"
            );
            Err(ServiceError::Decode {
                status: raw.status,
                content_type: raw.content_type().map(str::to_string),
                source,
            })
        }
    }
}

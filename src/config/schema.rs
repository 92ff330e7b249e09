//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration for the gateway binary.
    pub listener: ListenerConfig,

    /// Credential material shared by every downstream service.
    pub credentials: CredentialsConfig,

    /// Inbound-request forwarding switches.
    pub proxy: ProxyConfig,

    /// Downstream HTTP client settings.
    pub transport: TransportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Access checks applied by the gateway.
    pub security: SecurityConfig,

    /// Named path templates used by `reverse_url`.
    pub routes: BTreeMap<String, String>,

    /// Downstream service definitions.
    pub services: Vec<ServiceConfig>,
}

impl RelayConfig {
    /// Find a service definition by name.
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Whole-request timeout applied by the gateway, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Credential configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Scheme word placed before the key in the `Authorization` header.
    pub api_key_header: String,

    /// Key accepted on inbound requests by the API-key permission.
    pub api_key: String,

    /// Header carrying the MD5 of the request body.
    pub hash_header: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            api_key_header: "X-ACCESS-KEY".to_string(),
            api_key: String::new(),
            hash_header: "X-Hash".to_string(),
        }
    }
}

/// What the proxying layer forwards from the inbound request.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Forward inbound cookies downstream.
    pub send_cookies: bool,

    /// Send `Remote-User` with the authenticated user id.
    pub proxy_remote_user: bool,

    /// Public host used when rewriting pagination links.
    /// Falls back to the inbound `Host` header.
    pub gateway_host: Option<String>,
}

/// Downstream transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Retries on connect-phase failures.
    pub connect_retries: u32,

    /// Backoff factor in milliseconds (delay = factor * 2^retry).
    pub backoff_factor_ms: u64,

    /// Upper bound for a single backoff delay in milliseconds.
    pub max_backoff_ms: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: Option<u64>,

    /// Total request timeout in seconds. Unset means no deadline.
    pub request_timeout_secs: Option<u64>,

    /// Idle pooled connections kept per host.
    pub pool_max_idle_per_host: Option<usize>,
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_retries: 3,
            backoff_factor_ms: 500,
            max_backoff_ms: 120_000,
            connect_timeout_secs: Some(10),
            request_timeout_secs: None,
            pool_max_idle_per_host: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Inbound access checks.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Reject requests that carry neither the API key nor an authenticated user.
    pub require_api_key_or_authenticated: bool,

    /// Reject write requests whose body hash header does not match.
    pub require_body_hash: bool,

    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            require_api_key_or_authenticated: false,
            require_body_hash: false,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// One downstream microservice.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Unique service identifier for logging/metrics.
    pub name: String,

    /// Scheme and authority of the downstream (e.g., "http://container:8000").
    /// Unset means targets are already absolute.
    pub base_location: Option<String>,

    /// Prefix stripped once from inbound paths.
    pub lookup_prefix: String,

    /// Key sent in the `Authorization` header.
    pub api_key: String,

    /// Extra operation names this service accepts besides `send_file`.
    pub extension_methods: Vec<String>,

    /// Substring replaced in pagination links.
    pub pagination_before: String,

    /// Replacement for `pagination_before`.
    pub pagination_after: String,

    /// Custom headers added to every downstream request.
    pub headers: BTreeMap<String, String>,
}

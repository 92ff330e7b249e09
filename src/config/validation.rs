//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Service names unique, base locations absolute http(s) URLs
//! - Prefixes and route templates are absolute paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

const MAX_CONNECT_RETRIES: u32 = 10;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service at index {0} has an empty name")]
    EmptyServiceName(usize),

    #[error("duplicate service name '{0}'")]
    DuplicateService(String),

    #[error("service '{name}' has invalid base_location '{value}'")]
    InvalidBaseLocation { name: String, value: String },

    #[error("service '{name}' lookup_prefix '{value}' must start with '/'")]
    InvalidLookupPrefix { name: String, value: String },

    #[error("transport.connect_retries {0} exceeds {MAX_CONNECT_RETRIES}")]
    TooManyRetries(u32),

    #[error("route '{name}' template '{value}' must start with '/'")]
    InvalidRouteTemplate { name: String, value: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (idx, service) in config.services.iter().enumerate() {
        if service.name.trim().is_empty() {
            errors.push(ValidationError::EmptyServiceName(idx));
        } else if !seen.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateService(service.name.clone()));
        }

        if let Some(base) = &service.base_location {
            let valid = Url::parse(base)
                .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
                .unwrap_or(false);
            if !valid {
                errors.push(ValidationError::InvalidBaseLocation {
                    name: service.name.clone(),
                    value: base.clone(),
                });
            }
        }

        if !service.lookup_prefix.is_empty() && !service.lookup_prefix.starts_with('/') {
            errors.push(ValidationError::InvalidLookupPrefix {
                name: service.name.clone(),
                value: service.lookup_prefix.clone(),
            });
        }
    }

    if config.transport.connect_retries > MAX_CONNECT_RETRIES {
        errors.push(ValidationError::TooManyRetries(config.transport.connect_retries));
    }

    for (name, template) in &config.routes {
        if !template.starts_with('/') {
            errors.push(ValidationError::InvalidRouteTemplate {
                name: name.clone(),
                value: template.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ServiceConfig;

    fn service(name: &str, base: Option<&str>, prefix: &str) -> ServiceConfig {
        ServiceConfig {
            name: name.to_string(),
            base_location: base.map(str::to_string),
            lookup_prefix: prefix.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let mut config = RelayConfig::default();
        config.services.push(service("products", Some("http://container:8000"), "/api/v2"));
        config.services.push(service("absolute", None, ""));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RelayConfig::default();
        config.services.push(service("a", Some("container:8000"), "api"));
        config.services.push(service("a", None, ""));
        config.services.push(service(" ", None, ""));
        config.transport.connect_retries = 50;
        config.routes.insert("broken".into(), "api/v1/".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&ValidationError::DuplicateService("a".into())));
        assert!(errors.contains(&ValidationError::EmptyServiceName(2)));
        assert!(errors.contains(&ValidationError::TooManyRetries(50)));
    }
}

//! Named path templates and their reversal.
//!
//! Templates look like `/api/v1/products/{id}/`; every `{param}` must be
//! supplied exactly once when reversing.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no route named '{0}'")]
    NoReverseMatch(String),

    #[error("route '{route}' requires parameter '{param}'")]
    MissingParam { route: String, param: String },

    #[error("route '{route}' has no parameter '{param}'")]
    UnexpectedParam { route: String, param: String },

    #[error("parameter '{param}' of route '{route}' must be a non-empty path segment")]
    InvalidParam { route: String, param: String },
}

/// Table of named path templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedRoutes {
    routes: BTreeMap<String, String>,
}

impl NamedRoutes {
    pub fn from_map(routes: BTreeMap<String, String>) -> Self {
        Self { routes }
    }

    pub fn insert(&mut self, name: impl Into<String>, template: impl Into<String>) {
        self.routes.insert(name.into(), template.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Build the path for `name`, substituting `params`.
    pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        let template = self
            .routes
            .get(name)
            .ok_or_else(|| RouteError::NoReverseMatch(name.to_string()))?;

        let mut path = String::with_capacity(template.len());
        let mut used = Vec::new();
        let mut rest = template.as_str();

        while let Some(start) = rest.find('{') {
            path.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                path.push_str(&rest[start..]);
                rest = "";
                break;
            };
            let param = &after[..end];
            let value = params
                .iter()
                .find(|(key, _)| *key == param)
                .map(|(_, value)| *value)
                .ok_or_else(|| RouteError::MissingParam {
                    route: name.to_string(),
                    param: param.to_string(),
                })?;
            if value.is_empty() || value.contains('/') {
                return Err(RouteError::InvalidParam {
                    route: name.to_string(),
                    param: param.to_string(),
                });
            }
            path.push_str(value);
            used.push(param);
            rest = &after[end + 1..];
        }
        path.push_str(rest);

        if let Some((param, _)) = params.iter().find(|(key, _)| !used.contains(key)) {
            return Err(RouteError::UnexpectedParam {
                route: name.to_string(),
                param: param.to_string(),
            });
        }

        Ok(path)
    }
}

//! Dynamic configuration validation.
//!
//! # Responsibilities
//! - Reject empty or duplicate route/backend names
//! - Check backend addresses and weights
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Routes may point at backend groups owned by another provider, so group
//!   references are not resolved here

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::dynamic::Configuration;

/// A single semantic problem found in a dynamic configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route #{index} has an empty name")]
    EmptyRouteName { index: usize },

    #[error("duplicate route name {0:?}")]
    DuplicateRoute(String),

    #[error("route {0:?} has an empty backend group")]
    EmptyBackendGroup(String),

    #[error("backend #{index} has an empty name")]
    EmptyBackendName { index: usize },

    #[error("duplicate backend name {0:?}")]
    DuplicateBackend(String),

    #[error("backend {name:?} has an invalid address {address:?}")]
    InvalidAddress { name: String, address: String },

    #[error("backend {0:?} has zero weight")]
    ZeroWeight(String),
}

/// Validate a dynamic configuration.
pub fn validate(config: &Configuration) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut route_names = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.name.is_empty() {
            errors.push(ValidationError::EmptyRouteName { index });
        } else if !route_names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }
        if route.backend_group.is_empty() {
            errors.push(ValidationError::EmptyBackendGroup(route.name.clone()));
        }
    }

    let mut backend_names = HashSet::new();
    for (index, backend) in config.backends.iter().enumerate() {
        if backend.name.is_empty() {
            errors.push(ValidationError::EmptyBackendName { index });
        } else if !backend_names.insert(backend.name.as_str()) {
            errors.push(ValidationError::DuplicateBackend(backend.name.clone()));
        }
        if backend.address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                name: backend.name.clone(),
                address: backend.address.clone(),
            });
        }
        if backend.weight == 0 {
            errors.push(ValidationError::ZeroWeight(backend.name.clone()));
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
    use crate::dynamic::{BackendConfig, RouteConfig};

    fn backend(name: &str, address: &str) -> BackendConfig {
        BackendConfig {
            name: name.into(),
            group: "web".into(),
            address: address.into(),
            weight: 1,
            max_connections: 10,
        }
    }

    fn route(name: &str, group: &str) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            host: None,
            path_prefix: Some("/".into()),
            backend_group: group.into(),
            priority: 0,
        }
    }

    #[test]
    fn test_empty_configuration_is_valid() {
        assert!(validate(&Configuration::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut zero = backend("b2", "127.0.0.1:3001");
        zero.weight = 0;
        let config = Configuration {
            routes: vec![route("r1", "web"), route("r1", ""), route("", "web")],
            backends: vec![backend("b1", "not-an-address"), zero],
        };

        let errors = validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateRoute("r1".into()),
                ValidationError::EmptyBackendGroup("r1".into()),
                ValidationError::EmptyRouteName { index: 2 },
                ValidationError::InvalidAddress {
                    name: "b1".into(),
                    address: "not-an-address".into(),
                },
                ValidationError::ZeroWeight("b2".into()),
            ]
        );
    }

    #[test]
    fn test_routes_may_reference_foreign_groups() {
        let config = Configuration {
            routes: vec![route("api", "owned-elsewhere")],
            backends: Vec::new(),
        };
        assert!(validate(&config).is_ok());
    }
}

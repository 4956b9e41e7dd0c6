//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that every manifest route compiles
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Handler names are checked at startup, where the handler registry lives

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;
use crate::routing::macros::MacroRegistry;
use crate::routing::pattern::{HostKind, PathPattern};
use crate::routing::router::parse_methods;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem, located by its config field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check `config`, collecting every error found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level `{}`", config.observability.log_level),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    if let Some(domain) = &config.routing.root_domain {
        if domain.is_empty() || domain.starts_with('.') {
            errors.push(ValidationError::new(
                "routing.root_domain",
                format!("`{}` is not a domain name", domain),
            ));
        }
    }

    validate_routes(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_routes(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    let macros = MacroRegistry::new();
    let mut names = HashSet::new();

    for (i, route) in config.routes.iter().enumerate() {
        let field = |name: &str| format!("routes[{}].{}", i, name);

        if let Err(e) = parse_methods(&route.method) {
            errors.push(ValidationError::new(field("method"), e.to_string()));
        }
        if let Err(e) = HostKind::parse(&route.host) {
            errors.push(ValidationError::new(field("host"), e.to_string()));
        }
        if let Err(e) = PathPattern::compile(&route.path, &macros) {
            errors.push(ValidationError::new(field("path"), e.to_string()));
        }
        if route.handlers.is_empty() && route.body.is_none() {
            errors.push(ValidationError::new(
                field("handlers"),
                "route needs at least one handler or a body",
            ));
        }
        if let Some(name) = &route.name {
            if !names.insert(name.as_str()) {
                errors.push(ValidationError::new(
                    field("name"),
                    format!("duplicate route name `{}`", name),
                ));
            }
        }
    }
}

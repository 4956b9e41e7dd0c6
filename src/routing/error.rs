//! Routing error definitions.

use axum::http::Method;
use thiserror::Error;

/// Errors raised while registering a route.
///
/// All of these indicate a programming or configuration mistake; startup
/// treats any of them as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The host or path pattern could not be compiled.
    #[error("malformed pattern `{pattern}`: {reason}")]
    MalformedPattern { pattern: String, reason: String },

    /// The same method, host and path shape is already registered.
    #[error("route {method} {host}{path} is already registered")]
    DuplicateRoute {
        method: Method,
        host: String,
        path: String,
    },

    /// A parameter slot at the same trie position is held by a different parameter.
    #[error("parameter `{attempted}` in `{path}` conflicts with `{existing}` registered at the same position")]
    ParamConflict {
        path: String,
        existing: String,
        attempted: String,
    },

    /// Route names must be unique within a table.
    #[error("route name `{0}` is already taken")]
    DuplicateName(String),

    /// A route must carry at least one handler.
    #[error("route {method} {path} has an empty handler chain")]
    EmptyHandlerChain { method: Method, path: String },

    /// The method name is not a valid HTTP token.
    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),
}

impl RegistrationError {
    pub(crate) fn malformed(pattern: &str, reason: impl Into<String>) -> Self {
        RegistrationError::MalformedPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Unsuccessful resolution outcomes.
///
/// These are expected at runtime and map to 404 / 405 responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No route matches the host and path.
    #[error("no route matches the request")]
    NotFound,

    /// The path matches routes registered for other methods only.
    #[error("method not allowed, allowed: {}", format_methods(.allowed))]
    MethodNotAllowed { allowed: Vec<Method> },
}

fn format_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised when a handler asks for a typed parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// No parameter with that name is bound.
    #[error("parameter `{0}` is not bound")]
    Missing(String),

    /// The macro's decoder rejected the raw value.
    #[error("parameter `{name}` value `{raw}` is not a valid {macro_name}")]
    Invalid {
        name: String,
        macro_name: String,
        raw: String,
    },

    /// The decoded value does not convert to the requested type.
    #[error("parameter `{name}` value `{raw}` cannot be read as {expected}")]
    Mismatch {
        name: String,
        raw: String,
        expected: &'static str,
    },
}

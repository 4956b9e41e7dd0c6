//! Built-in named handlers.
//!
//! Routes declared in the configuration file reference handlers by name.
//! The registry maps those names to handler instances.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use axum::http::StatusCode;

use crate::http::context::{handler, Context, Flow, Handler};

/// Error returned when a chain references an unregistered handler name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown handler `{0}`")]
pub struct UnknownHandler(pub String);

/// Name -> handler lookup used when building routes from configuration.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry with the built-in handlers:
    /// `info`, `params`, `healthcheck`, `log` and `deny`.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("info", info);
        registry.register("params", params_json);
        registry.register("healthcheck", healthcheck);
        registry.register("log", log_request);
        registry.register("deny", deny);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, h: impl Handler + 'static) {
        self.handlers.insert(name.into(), handler(h));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Resolve a list of names into a chain, failing on the first unknown name.
    pub fn chain(&self, names: &[String]) -> Result<Vec<Arc<dyn Handler>>, UnknownHandler> {
        names
            .iter()
            .map(|name| self.get(name).ok_or_else(|| UnknownHandler(name.clone())))
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler writing a fixed text body.
pub fn text(body: impl Into<String>) -> Arc<dyn Handler> {
    let body = body.into();
    handler(move |ctx: &mut Context| {
        ctx.write_string(&body);
        Flow::Continue
    })
}

/// Writes the bound parameters followed by a request summary.
fn info(ctx: &mut Context) -> Flow {
    let mut out = String::new();
    for param in ctx.params() {
        let _ = writeln!(out, "{} = {}", param.name(), param.raw());
    }
    let _ = write!(
        out,
        "Info\n\nMethod: {}\nSubdomain: {}\nPath: {}\nParameters length: {}",
        ctx.method(),
        ctx.subdomain().unwrap_or_default(),
        ctx.path(),
        ctx.params().len()
    );
    ctx.set_content_type("text/plain; charset=utf-8");
    ctx.write_string(&out);
    Flow::Continue
}

fn params_json(ctx: &mut Context) -> Flow {
    match serde_json::to_string(ctx.params()) {
        Ok(json) => {
            ctx.set_content_type("application/json");
            ctx.write_string(&json);
            Flow::Continue
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode parameters");
            ctx.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            Flow::Stop
        }
    }
}

fn healthcheck(ctx: &mut Context) -> Flow {
    ctx.write_string("ok");
    Flow::Stop
}

fn log_request(ctx: &mut Context) -> Flow {
    tracing::info!(
        request_id = ctx.request_id().unwrap_or("unknown"),
        method = %ctx.method(),
        path = ctx.path(),
        route = ctx.route().map(|r| r.path()).unwrap_or_default(),
        "Request matched"
    );
    Flow::Continue
}

fn deny(ctx: &mut Context) -> Flow {
    ctx.set_status(StatusCode::FORBIDDEN);
    ctx.write_string("Forbidden");
    Flow::Stop
}

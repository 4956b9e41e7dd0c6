//! Request context and the handler chaining contract.
//!
//! # Responsibilities
//! - Carry the resolved route, parameters and subdomain to handlers
//! - Accumulate the response (status, headers, body)
//! - Run a route's handler chain in order
//!
//! # Design Decisions
//! - Handlers are synchronous; each one decides whether the chain continues
//! - The context is owned by a single request, so handlers take `&mut`

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

use crate::routing::params::Params;
use crate::routing::router::{Route, RouteMatch};

/// Whether the chain proceeds after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// A step in a route's handler chain.
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut Context) -> Flow;
}

impl<F> Handler for F
where
    F: Fn(&mut Context) -> Flow + Send + Sync,
{
    fn handle(&self, ctx: &mut Context) -> Flow {
        self(ctx)
    }
}

/// Wrap a handler for use in a chain.
pub fn handler(h: impl Handler + 'static) -> Arc<dyn Handler> {
    Arc::new(h)
}

/// Run `chain` in order until a handler stops it.
///
/// Returns the number of handlers that ran.
pub fn run_chain(chain: &[Arc<dyn Handler>], ctx: &mut Context) -> usize {
    let mut ran = 0;
    for h in chain {
        ran += 1;
        if h.handle(ctx) == Flow::Stop {
            break;
        }
    }
    ran
}

/// Per-request state shared by the handlers of one chain.
pub struct Context {
    method: Method,
    host: String,
    path: String,
    request_id: Option<String>,
    route: Option<Arc<Route>>,
    params: Params,
    subdomain: Option<String>,
    values: HashMap<String, String>,
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl Context {
    pub fn new(method: Method, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method,
            host: host.into(),
            path: path.into(),
            request_id: None,
            route: None,
            params: Params::new(),
            subdomain: None,
            values: HashMap::new(),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    /// Attach a resolution result.
    pub fn with_match(mut self, matched: RouteMatch) -> Self {
        self.route = Some(matched.route);
        self.params = matched.params;
        self.subdomain = matched.subdomain;
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Subdomain label, when the request was served by a subdomain route.
    pub fn subdomain(&self) -> Option<&str> {
        self.subdomain.as_deref()
    }

    /// Request-scoped values shared between middleware and handlers.
    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set a response header. Invalid names or values are ignored and logged.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "Ignoring invalid response header"),
        }
    }

    pub fn set_content_type(&mut self, value: &'static str) {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
    }

    pub fn write_string(&mut self, text: &str) {
        self.body.push_str(text);
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Split into the response parts accumulated by the chain.
    pub fn into_response_parts(self) -> (StatusCode, HeaderMap, String) {
        (self.status, self.headers, self.body)
    }
}

impl fmt::Write for Context {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.body.push_str(s);
        Ok(())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("request_id", &self.request_id)
            .field("params", &self.params)
            .field("status", &self.status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    fn mark(tag: &'static str) -> Arc<dyn Handler> {
        handler(move |ctx: &mut Context| {
            ctx.write_string(tag);
            Flow::Continue
        })
    }

    #[test]
    fn test_chain_runs_in_order() {
        let chain = vec![mark("a"), mark("b"), mark("c")];
        let mut ctx = Context::new(Method::GET, "localhost", "/");
        assert_eq!(run_chain(&chain, &mut ctx), 3);
        assert_eq!(ctx.body(), "abc");
    }

    #[test]
    fn test_chain_stops() {
        let deny = handler(|ctx: &mut Context| {
            ctx.set_status(StatusCode::FORBIDDEN);
            Flow::Stop
        });
        let chain = vec![mark("a"), deny, mark("never")];
        let mut ctx = Context::new(Method::GET, "localhost", "/");
        assert_eq!(run_chain(&chain, &mut ctx), 2);
        assert_eq!(ctx.body(), "a");
        assert_eq!(ctx.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_values_and_headers() {
        let mut ctx = Context::new(Method::POST, "localhost", "/postvalue");
        ctx.set_value("user", "guest");
        ctx.set_header("x-custom", "1");
        ctx.set_header("bad header", "1");
        let user = ctx.value("user").unwrap_or_default().to_string();
        write!(ctx, "Hello {}", user).unwrap();

        assert_eq!(ctx.value("user"), Some("guest"));
        assert_eq!(ctx.headers().len(), 1);
        assert_eq!(ctx.body(), "Hello guest");
    }
}

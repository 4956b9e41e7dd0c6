//! Route groups.
//!
//! A party shares a host prefix, a path prefix and middleware between the
//! routes registered through it. It is purely a registration convenience:
//! every route still goes through `RouterBuilder::register_with`.

use std::sync::Arc;

use axum::http::Method;

use crate::http::context::{handler, Handler};
use crate::routing::error::RegistrationError;
use crate::routing::pattern::split_host;
use crate::routing::router::{parse_methods, Route, RouteOptions, RouterBuilder};

/// A group of routes under a common prefix.
pub struct Party<'r> {
    builder: &'r mut RouterBuilder,
    host: String,
    prefix: String,
    middleware: Vec<Arc<dyn Handler>>,
}

impl<'r> Party<'r> {
    pub(crate) fn new(builder: &'r mut RouterBuilder, prefix: &str, middleware: Vec<Arc<dyn Handler>>) -> Self {
        let (host, path) = split_host(prefix);
        Self {
            builder,
            host: host.to_string(),
            prefix: path.trim_end_matches('/').to_string(),
            middleware,
        }
    }

    /// Host pattern shared by the party (`""` when none).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Path prefix shared by the party, without trailing slash.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Append middleware that runs before handlers registered from now on.
    pub fn use_handler(&mut self, h: impl Handler + 'static) -> &mut Self {
        self.middleware.push(handler(h));
        self
    }

    /// Register a route relative to the party prefix.
    pub fn handle(
        &mut self,
        method: Method,
        path: &str,
        handlers: Vec<Arc<dyn Handler>>,
    ) -> Result<Arc<Route>, RegistrationError> {
        self.handle_with(method, path, handlers, RouteOptions::default())
    }

    pub fn handle_with(
        &mut self,
        method: Method,
        path: &str,
        handlers: Vec<Arc<dyn Handler>>,
        options: RouteOptions,
    ) -> Result<Arc<Route>, RegistrationError> {
        let full_path = self.join(path);
        let mut chain = self.middleware.clone();
        chain.extend(handlers);
        if chain.len() == self.middleware.len() {
            return Err(RegistrationError::EmptyHandlerChain {
                method,
                path: full_path,
            });
        }
        self.builder
            .register_with(method, &self.host, &full_path, chain, options)
    }

    pub fn handle_many(
        &mut self,
        methods: &str,
        path: &str,
        handlers: Vec<Arc<dyn Handler>>,
    ) -> Result<Vec<Arc<Route>>, RegistrationError> {
        parse_methods(methods)?
            .into_iter()
            .map(|method| self.handle(method, path, handlers.clone()))
            .collect()
    }

    pub fn get(&mut self, path: &str, h: impl Handler + 'static) -> Result<Arc<Route>, RegistrationError> {
        self.handle(Method::GET, path, vec![handler(h)])
    }

    pub fn post(&mut self, path: &str, h: impl Handler + 'static) -> Result<Arc<Route>, RegistrationError> {
        self.handle(Method::POST, path, vec![handler(h)])
    }

    pub fn put(&mut self, path: &str, h: impl Handler + 'static) -> Result<Arc<Route>, RegistrationError> {
        self.handle(Method::PUT, path, vec![handler(h)])
    }

    pub fn delete(&mut self, path: &str, h: impl Handler + 'static) -> Result<Arc<Route>, RegistrationError> {
        self.handle(Method::DELETE, path, vec![handler(h)])
    }

    /// Nested party. A host prefix in `prefix` replaces the parent's host;
    /// the path prefix and middleware are appended.
    pub fn party(&mut self, prefix: &str, middleware: Vec<Arc<dyn Handler>>) -> Party<'_> {
        let (host, path) = split_host(prefix);
        let host = if host.is_empty() {
            self.host.clone()
        } else {
            host.to_string()
        };
        let mut chain = self.middleware.clone();
        chain.extend(middleware);
        Party {
            prefix: self.join(path).trim_end_matches('/').to_string(),
            builder: &mut *self.builder,
            host,
            middleware: chain,
        }
    }

    /// Run `f` against this party, for block-style registration.
    pub fn scope<F>(&mut self, f: F) -> Result<(), RegistrationError>
    where
        F: FnOnce(&mut Party<'_>) -> Result<(), RegistrationError>,
    {
        f(self)
    }

    fn join(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            if self.prefix.is_empty() {
                "/".to_string()
            } else {
                self.prefix.clone()
            }
        } else {
            format!("{}/{}", self.prefix, path)
        }
    }
}

//! Route table: registration and lookup.
//!
//! # Responsibilities
//! - Compile and register routes (method + host + path + handler chain)
//! - Freeze the table for serving
//! - Resolve a request to one route and its bound parameters
//! - Report method mismatches separately from misses
//!
//! # Design Decisions
//! - Build phase and serve phase are separate types: `RouterBuilder` takes
//!   `&mut self`, `Router` only `&self`, so no locking on the read path
//! - Registration errors are returned, never logged and skipped
//! - Resolution allocates only the per-request `Params`

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use serde::Serialize;

use crate::http::context::{handler, Handler};
use crate::routing::error::{RegistrationError, ResolveError};
use crate::routing::host::HostMatcher;
use crate::routing::macros::MacroRegistry;
use crate::routing::params::Params;
use crate::routing::party::Party;
use crate::routing::pattern::{split_host, HostKind, PathPattern};
use crate::routing::trie::InsertConflict;

/// A registered route. Immutable once created.
pub struct Route {
    method: Method,
    host: HostKind,
    pattern: PathPattern,
    handlers: Vec<Arc<dyn Handler>>,
    priority: usize,
    name: Option<String>,
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn host(&self) -> &HostKind {
        &self.host
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn path(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    /// Registration order within the table.
    pub fn priority(&self) -> usize {
        self.priority
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Summary suitable for listings.
    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            method: self.method.to_string(),
            host: self.host.to_string(),
            path: self.pattern.as_str().to_string(),
            name: self.name.clone(),
            handlers: self.handlers.len(),
            priority: self.priority,
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("host", &self.host)
            .field("path", &self.pattern.as_str())
            .field("handlers", &self.handlers.len())
            .field("priority", &self.priority)
            .finish()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.method, self.host, self.pattern)
    }
}

/// Serializable view of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub method: String,
    pub host: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub handlers: usize,
    pub priority: usize,
}

/// A successful resolution.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub params: Params,
    /// Subdomain label when a subdomain trie was selected.
    pub subdomain: Option<String>,
}

/// Options applied to a single registration.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub name: Option<String>,
}

/// Mutable route table used during startup.
pub struct RouterBuilder {
    macros: MacroRegistry,
    hosts: HostMatcher<Arc<Route>>,
    routes: Vec<Arc<Route>>,
    names: HashMap<String, Arc<Route>>,
}

impl RouterBuilder {
    /// A builder with the built-in parameter macros.
    pub fn new() -> Self {
        Self::with_macros(MacroRegistry::new())
    }

    pub fn with_macros(macros: MacroRegistry) -> Self {
        Self {
            macros,
            hosts: HostMatcher::new(),
            routes: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Resolve subdomains relative to `domain`.
    pub fn root_domain(mut self, domain: impl Into<String>) -> Self {
        self.hosts = std::mem::take(&mut self.hosts).with_root_domain(domain);
        self
    }

    /// Macros used for patterns registered from now on.
    pub fn macros_mut(&mut self) -> &mut MacroRegistry {
        &mut self.macros
    }

    pub fn macros(&self) -> &MacroRegistry {
        &self.macros
    }

    /// Register a route.
    ///
    /// `host` is `""` (any host), `"sub."`, `"*."` or an exact host name.
    pub fn register(
        &mut self,
        method: Method,
        host: &str,
        path: &str,
        handlers: Vec<Arc<dyn Handler>>,
    ) -> Result<Arc<Route>, RegistrationError> {
        self.register_with(method, host, path, handlers, RouteOptions::default())
    }

    pub fn register_with(
        &mut self,
        method: Method,
        host: &str,
        path: &str,
        handlers: Vec<Arc<dyn Handler>>,
        options: RouteOptions,
    ) -> Result<Arc<Route>, RegistrationError> {
        let host = HostKind::parse(host)?;
        let pattern = PathPattern::compile(path, &self.macros)?;

        if handlers.is_empty() {
            return Err(RegistrationError::EmptyHandlerChain {
                method,
                path: pattern.as_str().to_string(),
            });
        }

        if let Some(name) = &options.name {
            if self.names.contains_key(name) {
                return Err(RegistrationError::DuplicateName(name.clone()));
            }
        }

        let route = Arc::new(Route {
            method: method.clone(),
            host: host.clone(),
            pattern,
            handlers,
            priority: self.routes.len(),
            name: options.name,
        });

        self.hosts
            .trie_mut(&host)
            .insert(method.clone(), route.pattern.segments(), route.clone())
            .map_err(|conflict| match conflict {
                InsertConflict::Duplicate => RegistrationError::DuplicateRoute {
                    method: method.clone(),
                    host: host.to_string(),
                    path: route.path().to_string(),
                },
                InsertConflict::Param { existing, attempted } => RegistrationError::ParamConflict {
                    path: route.path().to_string(),
                    existing,
                    attempted,
                },
            })?;

        tracing::debug!(
            method = %route.method,
            host = %route.host,
            path = %route.path(),
            handlers = route.handlers.len(),
            "Route registered"
        );

        if let Some(name) = &route.name {
            self.names.insert(name.clone(), route.clone());
        }
        self.routes.push(route.clone());
        Ok(route)
    }

    /// Register a combined pattern such as `admin./users/{id}`.
    pub fn handle(
        &mut self,
        method: Method,
        pattern: &str,
        handlers: Vec<Arc<dyn Handler>>,
    ) -> Result<Arc<Route>, RegistrationError> {
        let (host, path) = split_host(pattern);
        self.register(method, host, path, handlers)
    }

    /// Register the same chain under several space-separated methods, e.g. `"POST PUT"`.
    pub fn handle_many(
        &mut self,
        methods: &str,
        pattern: &str,
        handlers: Vec<Arc<dyn Handler>>,
    ) -> Result<Vec<Arc<Route>>, RegistrationError> {
        parse_methods(methods)?
            .into_iter()
            .map(|method| self.handle(method, pattern, handlers.clone()))
            .collect()
    }

    pub fn get(&mut self, pattern: &str, h: impl Handler + 'static) -> Result<Arc<Route>, RegistrationError> {
        self.handle(Method::GET, pattern, vec![handler(h)])
    }

    pub fn post(&mut self, pattern: &str, h: impl Handler + 'static) -> Result<Arc<Route>, RegistrationError> {
        self.handle(Method::POST, pattern, vec![handler(h)])
    }

    pub fn put(&mut self, pattern: &str, h: impl Handler + 'static) -> Result<Arc<Route>, RegistrationError> {
        self.handle(Method::PUT, pattern, vec![handler(h)])
    }

    pub fn delete(&mut self, pattern: &str, h: impl Handler + 'static) -> Result<Arc<Route>, RegistrationError> {
        self.handle(Method::DELETE, pattern, vec![handler(h)])
    }

    pub fn patch(&mut self, pattern: &str, h: impl Handler + 'static) -> Result<Arc<Route>, RegistrationError> {
        self.handle(Method::PATCH, pattern, vec![handler(h)])
    }

    /// Start a group of routes sharing a host/path prefix and middleware.
    pub fn party(&mut self, prefix: &str, middleware: Vec<Arc<dyn Handler>>) -> Party<'_> {
        Party::new(self, prefix, middleware)
    }

    /// Routes registered so far, in registration order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Freeze the table.
    pub fn build(self) -> Router {
        tracing::info!(
            routes = self.routes.len(),
            macros = self.macros.names().len(),
            "Route table frozen"
        );
        Router {
            hosts: self.hosts,
            routes: self.routes,
            names: self.names,
        }
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen route table. Safe to share across request tasks.
pub struct Router {
    hosts: HostMatcher<Arc<Route>>,
    routes: Vec<Arc<Route>>,
    names: HashMap<String, Arc<Route>>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Resolve a request to a route and its parameters.
    pub fn resolve(&self, method: &Method, host: &str, path: &str) -> Result<RouteMatch, ResolveError> {
        if let Some(found) = self.resolve_method(method, host, path) {
            return Ok(found);
        }

        let mut allowed: Vec<Method> = self
            .registered_methods()
            .into_iter()
            .filter(|m| *m != method)
            .filter(|m| self.resolve_method(m, host, path).is_some())
            .cloned()
            .collect();

        if allowed.is_empty() {
            tracing::trace!(method = %method, host, path, "No route matched");
            return Err(ResolveError::NotFound);
        }

        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        tracing::trace!(method = %method, host, path, allowed = ?allowed, "Method not allowed");
        Err(ResolveError::MethodNotAllowed { allowed })
    }

    fn resolve_method(&self, method: &Method, host: &str, path: &str) -> Option<RouteMatch> {
        let selection = self.hosts.select(method, host);
        let found = selection.trie.lookup(method, path)?;
        Some(RouteMatch {
            route: found.value.clone(),
            params: found.params,
            subdomain: selection.subdomain,
        })
    }

    fn registered_methods(&self) -> HashSet<&Method> {
        self.hosts
            .tries()
            .flat_map(|(_, trie)| trie.methods())
            .collect()
    }

    /// Routes in registration order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn route_by_name(&self, name: &str) -> Option<&Arc<Route>> {
        self.names.get(name)
    }

    /// Build a URL for a named route from values in declaration order.
    ///
    /// Exact-host routes yield `//host/path`. Static subdomain routes yield
    /// `//label.root_domain/path` when a root domain is configured. Without
    /// one, and for root or wildcard routes, only the path is returned.
    pub fn url_for(&self, name: &str, values: &[&str]) -> Option<String> {
        let route = self.names.get(name)?;
        let path = route.pattern.build(values)?;
        match (&route.host, self.hosts.root_domain()) {
            (HostKind::Exact(host), _) => Some(format!("//{}{}", host, path)),
            (HostKind::StaticSubdomain(label), Some(domain)) => {
                Some(format!("//{}.{}{}", label, domain, path))
            }
            _ => Some(path),
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .finish()
    }
}

/// Parse a space- or comma-separated list of method names.
pub fn parse_methods(methods: &str) -> Result<Vec<Method>, RegistrationError> {
    let parsed: Vec<Method> = methods
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|m| !m.is_empty())
        .map(|m| {
            Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| RegistrationError::InvalidMethod(m.to_string()))
        })
        .collect::<Result<_, _>>()?;

    if parsed.is_empty() {
        return Err(RegistrationError::InvalidMethod(methods.to_string()));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::context::{handler, Context, Flow};

    fn noop(_: &mut Context) -> Flow {
        Flow::Continue
    }

    #[test]
    fn test_register_and_resolve() {
        let mut builder = Router::builder();
        builder.get("/games/{gameID:uint64}/clans", noop).unwrap();
        builder.get("/games/{gameID:uint64}/clans/search", noop).unwrap();
        let router = builder.build();

        let m = router.resolve(&Method::GET, "localhost", "/games/42/clans").unwrap();
        assert_eq!(m.route.path(), "/games/{gameID:uint64}/clans");
        assert_eq!(m.params.get_u64("gameID").unwrap(), 42);
        assert!(m.subdomain.is_none());

        let m = router.resolve(&Method::GET, "localhost", "/games/42/clans/search").unwrap();
        assert_eq!(m.route.path(), "/games/{gameID:uint64}/clans/search");

        assert_eq!(
            router.resolve(&Method::GET, "localhost", "/games/abc/clans").unwrap_err(),
            ResolveError::NotFound
        );
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let mut builder = Router::builder();
        builder.handle_many("POST PUT", "/postvalue", vec![handler(noop)]).unwrap();
        builder.get("/healthcheck", noop).unwrap();
        let router = builder.build();

        let err = router.resolve(&Method::DELETE, "example.com", "/postvalue").unwrap_err();
        assert_eq!(
            err,
            ResolveError::MethodNotAllowed {
                allowed: vec![Method::POST, Method::PUT]
            }
        );
        assert_eq!(
            router.resolve(&Method::DELETE, "example.com", "/nothing").unwrap_err(),
            ResolveError::NotFound
        );
    }

    #[test]
    fn test_registration_errors() {
        let mut builder = Router::builder();
        builder.get("/users/{id:uint64}", noop).unwrap();

        assert!(matches!(
            builder.get("/users/{id:uint64}/", noop),
            Err(RegistrationError::DuplicateRoute { .. })
        ));
        assert!(matches!(
            builder.get("/users/{name}/posts", noop),
            Err(RegistrationError::ParamConflict { .. })
        ));
        assert!(matches!(
            builder.get("/users/{id:uuid}", noop),
            Err(RegistrationError::MalformedPattern { .. })
        ));
        assert!(matches!(
            builder.handle(Method::GET, "users/{id}", vec![handler(noop)]),
            Err(RegistrationError::MalformedPattern { .. })
        ));
        assert!(matches!(
            builder.get("users", noop),
            Err(RegistrationError::MalformedPattern { .. })
        ));
        assert!(matches!(
            builder.register(Method::GET, "", "/empty", Vec::new()),
            Err(RegistrationError::EmptyHandlerChain { .. })
        ));
        assert!(matches!(
            builder.handle_many("GET BAD METHOD(", "/x", vec![handler(noop)]),
            Err(RegistrationError::InvalidMethod(_))
        ));
        assert_eq!(builder.routes().len(), 1);
    }

    #[test]
    fn test_priority_is_registration_order() {
        let mut builder = Router::builder();
        let a = builder.get("/a", noop).unwrap();
        let b = builder.post("/b", noop).unwrap();
        assert_eq!(a.priority(), 0);
        assert_eq!(b.priority(), 1);
        let infos: Vec<_> = builder.build().routes().iter().map(|r| r.info().path).collect();
        assert_eq!(infos, vec!["/a", "/b"]);
    }

    #[test]
    fn test_url_for_named_route() {
        let mut builder = Router::builder();
        builder
            .register_with(
                Method::GET,
                "",
                "/games/{gameID:uint64}/clans/clan/{clanPublicID:uint64}",
                vec![handler(noop)],
                RouteOptions {
                    name: Some("clan".into()),
                },
            )
            .unwrap();
        let router = builder.build();
        assert_eq!(
            router.url_for("clan", &["42", "93"]).as_deref(),
            Some("/games/42/clans/clan/93")
        );
        assert!(router.url_for("clan", &["x", "93"]).is_none());
        assert!(router.url_for("missing", &[]).is_none());
    }

    #[test]
    fn test_url_for_subdomain_route() {
        let named = |name: &str| RouteOptions {
            name: Some(name.into()),
        };
        let mut builder = Router::builder().root_domain("mydomain.com");
        builder
            .register_with(Method::GET, "admin.", "/users/{id}", vec![handler(noop)], named("admin"))
            .unwrap();
        builder
            .register_with(Method::GET, "*.", "/shop", vec![handler(noop)], named("shop"))
            .unwrap();
        let router = builder.build();
        assert_eq!(
            router.url_for("admin", &["7"]).as_deref(),
            Some("//admin.mydomain.com/users/7")
        );
        assert_eq!(router.url_for("shop", &[]).as_deref(), Some("/shop"));

        let mut builder = Router::builder();
        builder
            .register_with(Method::GET, "admin.", "/users/{id}", vec![handler(noop)], named("admin"))
            .unwrap();
        assert_eq!(builder.build().url_for("admin", &["7"]).as_deref(), Some("/users/7"));
    }

    #[test]
    fn test_parse_methods() {
        assert_eq!(parse_methods("post, put").unwrap(), vec![Method::POST, Method::PUT]);
        assert!(parse_methods("  ").is_err());
    }
}

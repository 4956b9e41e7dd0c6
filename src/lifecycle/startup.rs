//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn the route manifest into a frozen route table
//! - Rebuild and swap the table when the configuration changes
//!
//! # Design Decisions
//! - Routes register in manifest order, so priority follows the file
//! - A multi-method route's name is attached to its first method only
//! - A route's `body` becomes a final text handler after its named handlers

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::Method;
use thiserror::Error;

use crate::config::{AppConfig, RouteConfig, RoutingConfig};
use crate::http::handlers::{text, HandlerRegistry, UnknownHandler};
use crate::observability::metrics;
use crate::routing::error::RegistrationError;
use crate::routing::router::{parse_methods, Router, RouteOptions, RouterBuilder};

/// Errors that abort building a route table.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("route #{index}: {source}")]
    Registration {
        index: usize,
        #[source]
        source: RegistrationError,
    },

    #[error("route #{index}: {source}")]
    Handler {
        index: usize,
        #[source]
        source: UnknownHandler,
    },
}

/// A frozen router together with the settings the front end applies to it.
#[derive(Debug)]
pub struct RouteTable {
    pub router: Router,
    pub settings: RoutingConfig,
}

/// Build a route table from `config`.
pub fn build_table(config: &AppConfig, handlers: &HandlerRegistry) -> Result<RouteTable, StartupError> {
    let mut builder = Router::builder();
    if let Some(domain) = &config.routing.root_domain {
        builder = builder.root_domain(domain.clone());
    }

    for (index, route) in config.routes.iter().enumerate() {
        register_route(&mut builder, route, handlers, index)?;
    }

    let router = builder.build();
    metrics::record_routes(router.len());
    Ok(RouteTable {
        router,
        settings: config.routing.clone(),
    })
}

fn register_route(
    builder: &mut RouterBuilder,
    route: &RouteConfig,
    handlers: &HandlerRegistry,
    index: usize,
) -> Result<(), StartupError> {
    let registration = |source| StartupError::Registration { index, source };

    let mut chain = handlers
        .chain(&route.handlers)
        .map_err(|source| StartupError::Handler { index, source })?;
    if let Some(body) = &route.body {
        chain.push(text(body.clone()));
    }

    let methods: Vec<Method> = parse_methods(&route.method).map_err(registration)?;
    for (i, method) in methods.into_iter().enumerate() {
        let options = RouteOptions {
            name: if i == 0 { route.name.clone() } else { None },
        };
        builder
            .register_with(method, &route.host, &route.path, chain.clone(), options)
            .map_err(registration)?;
    }
    Ok(())
}

/// Rebuild the table from `config` and swap it in.
///
/// On error the current table stays live.
pub fn reload(
    live: &ArcSwap<RouteTable>,
    config: &AppConfig,
    handlers: &HandlerRegistry,
) -> Result<usize, StartupError> {
    match build_table(config, handlers) {
        Ok(table) => {
            let routes = table.router.len();
            live.store(Arc::new(table));
            metrics::record_reload(true);
            tracing::info!(routes, "Route table reloaded");
            Ok(routes)
        }
        Err(e) => {
            metrics::record_reload(false);
            tracing::error!(error = %e, "Route table reload failed, keeping current table");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    const MANIFEST: &str = r#"
        [routing]
        root_domain = "mydomain.com"

        [[routes]]
        path = "/games/{gameID:uint64}/clans"
        handlers = ["log", "info"]
        name = "clans"

        [[routes]]
        method = "POST PUT"
        path = "/postvalue"
        handlers = ["log"]
        body = "stored"
        name = "postvalue"

        [[routes]]
        host = "*."
        path = "/"
        handlers = ["info"]
    "#;

    #[test]
    fn test_build_from_manifest() {
        let config = parse_config(MANIFEST).unwrap();
        let table = build_table(&config, &HandlerRegistry::new()).unwrap();

        assert_eq!(table.router.len(), 4);
        let post = table.router.resolve(&Method::POST, "mydomain.com", "/postvalue").unwrap();
        assert_eq!(post.route.handlers().len(), 2);
        assert_eq!(post.route.name(), Some("postvalue"));
        let put = table.router.resolve(&Method::PUT, "mydomain.com", "/postvalue").unwrap();
        assert_eq!(put.route.name(), None);

        let sub = table.router.resolve(&Method::GET, "shop.mydomain.com", "/").unwrap();
        assert_eq!(sub.subdomain.as_deref(), Some("shop"));
        assert_eq!(table.router.url_for("clans", &["7"]).as_deref(), Some("/games/7/clans"));
    }

    #[test]
    fn test_unknown_handler_is_fatal() {
        let mut config = AppConfig::default();
        config.routes.push(RouteConfig {
            method: "GET".into(),
            host: String::new(),
            path: "/".into(),
            handlers: vec!["missing".into()],
            name: None,
            body: None,
        });
        let err = build_table(&config, &HandlerRegistry::new()).unwrap_err();
        assert_eq!(err.to_string(), "route #0: unknown handler `missing`");
    }

    #[test]
    fn test_duplicate_route_is_fatal() {
        let mut config = parse_config(MANIFEST).unwrap();
        let duplicate = config.routes[0].clone();
        config.routes.push(RouteConfig { name: None, ..duplicate });
        let err = build_table(&config, &HandlerRegistry::new()).unwrap_err();
        assert!(matches!(
            err,
            StartupError::Registration {
                index: 3,
                source: RegistrationError::DuplicateRoute { .. }
            }
        ));
    }

    #[test]
    fn test_failed_reload_keeps_table() {
        let handlers = HandlerRegistry::new();
        let config = parse_config(MANIFEST).unwrap();
        let live = ArcSwap::from_pointee(build_table(&config, &handlers).unwrap());

        let mut broken = config.clone();
        broken.routes[0].handlers = vec!["missing".into()];
        assert!(reload(&live, &broken, &handlers).is_err());
        assert_eq!(live.load().router.len(), 4);

        let mut smaller = config;
        smaller.routes.truncate(1);
        assert_eq!(reload(&live, &smaller, &handlers).unwrap(), 1);
        assert_eq!(live.load().router.len(), 1);
    }
}

//! Dynamic HTTP request router.
//!
//! Routes are declared as method + host pattern + path pattern + handler
//! chain, compiled into per-host path tries and frozen into a [`Router`].

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::AppConfig;
pub use http::{Context, Flow, Handler, HttpServer};
pub use lifecycle::Shutdown;
pub use routing::{Router, RouterBuilder};

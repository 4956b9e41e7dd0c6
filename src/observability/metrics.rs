//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_dispatch_total` (counter): dispatches by method and outcome
//! - `router_dispatch_duration_seconds` (histogram): resolution plus chain time
//! - `router_routes_registered` (gauge): routes in the live table
//! - `router_reloads_total` (counter): route table reloads by result

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// How a request left the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Matched,
    NotFound,
    MethodNotAllowed,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Matched => "matched",
            DispatchOutcome::NotFound => "not_found",
            DispatchOutcome::MethodNotAllowed => "method_not_allowed",
        }
    }
}

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("router_dispatch_total", "Dispatched requests by method and outcome");
    describe_histogram!(
        "router_dispatch_duration_seconds",
        metrics::Unit::Seconds,
        "Time spent resolving a request and running its handler chain"
    );
    describe_gauge!("router_routes_registered", "Routes in the live route table");
    describe_counter!("router_reloads_total", "Route table reloads by result");

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_dispatch(method: &Method, outcome: DispatchOutcome, started: Instant) {
    counter!(
        "router_dispatch_total",
        "method" => method.as_str().to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!("router_dispatch_duration_seconds", "outcome" => outcome.as_str())
        .record(started.elapsed().as_secs_f64());
}

pub fn record_routes(count: usize) {
    gauge!("router_routes_registered").set(count as f64);
}

pub fn record_reload(success: bool) {
    let result = if success { "ok" } else { "error" };
    counter!("router_reloads_total", "result" => result).increment(1);
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum app with a single fallback dispatching to the route table
//! - Wire up middleware (tracing, timeout, request ID)
//! - Map resolution failures to 404 / 405 responses
//! - Serve until the shutdown future resolves

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::http::context::{run_chain, Context};
use crate::lifecycle::RouteTable;
use crate::observability::metrics::{self, DispatchOutcome};
use crate::routing::ResolveError;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<ArcSwap<RouteTable>>,
}

/// Generates a UUID v4 for requests that arrive without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// HTTP front end for the route table.
pub struct HttpServer {
    app: Router,
}

impl HttpServer {
    /// Create a server dispatching to `table`. The table may be swapped at
    /// any time; each request reads the current one once.
    pub fn new(config: &AppConfig, table: Arc<ArcSwap<RouteTable>>) -> Self {
        let app = Self::build_app(config, AppState { table });
        Self { app }
    }

    /// Build the axum app with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &AppConfig, state: AppState) -> Router {
        let header_name = header::HeaderName::from_static(X_REQUEST_ID);
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(header_name.clone(), UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(PropagateRequestIdLayer::new(header_name)),
            )
    }

    /// The axum app, for embedding or in-process testing.
    pub fn into_app(self) -> Router {
        self.app
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Resolve the request against the live table and run the matched chain.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let table = state.table.load_full();

    let method = request.method().clone();
    let host = request_host(&request);
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    match table.router.resolve(&method, &host, &path) {
        Ok(matched) => {
            let route = matched.route.clone();
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                host = %host,
                path = %path,
                route = %route,
                "Dispatching request"
            );

            let mut ctx = Context::new(method.clone(), host, path)
                .with_match(matched)
                .with_request_id(request_id);
            run_chain(route.handlers(), &mut ctx);

            metrics::record_dispatch(&method, DispatchOutcome::Matched, started);
            ctx.into_response_parts().into_response()
        }
        Err(ResolveError::MethodNotAllowed { allowed }) if table.settings.fire_method_not_allowed => {
            tracing::warn!(request_id = %request_id, method = %method, path = %path, "Method not allowed");
            metrics::record_dispatch(&method, DispatchOutcome::MethodNotAllowed, started);

            let allow = allowed
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let mut response = (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(header::ALLOW, value);
            }
            response
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, method = %method, host = %host, path = %path, error = %e, "No route matched");
            metrics::record_dispatch(&method, DispatchOutcome::NotFound, started);
            (StatusCode::NOT_FOUND, table.settings.not_found_body.clone()).into_response()
        }
    }
}

/// Host from the `Host` header, falling back to the URI authority (HTTP/2).
fn request_host(request: &Request<Body>) -> String {
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
        .unwrap_or_default()
        .to_string()
}

//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::net::TcpListener;

use party_router::config::{parse_config, AppConfig};
use party_router::http::{Context, Flow, HandlerRegistry, HttpServer};
use party_router::lifecycle::{build_table, RouteTable, Shutdown};

/// Handler that does nothing and lets the chain continue.
#[allow(dead_code)]
pub fn noop(_: &mut Context) -> Flow {
    Flow::Continue
}

/// Registry with the built-ins plus an `echo-route` handler writing the
/// matched pattern, for asserting which route served a request.
#[allow(dead_code)]
pub fn test_handlers() -> HandlerRegistry {
    let mut handlers = HandlerRegistry::new();
    handlers.register("echo-route", |ctx: &mut Context| {
        let path = ctx.route().map(|r| r.to_string()).unwrap_or_default();
        ctx.write_string(&path);
        Flow::Continue
    });
    handlers
}

/// A running server bound to an ephemeral port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub table: Arc<ArcSwap<RouteTable>>,
    pub shutdown: Arc<Shutdown>,
    pub config: AppConfig,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Parse `manifest`, build its table and serve it on 127.0.0.1:0.
#[allow(dead_code)]
pub async fn start_server(manifest: &str) -> TestServer {
    let config = parse_config(manifest).unwrap();
    let table = build_table(&config, &test_handlers()).unwrap();
    let table = Arc::new(ArcSwap::from_pointee(table));
    let shutdown = Arc::new(Shutdown::new());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(&config, table.clone());
    let stop = shutdown.wait();
    tokio::spawn(async move {
        let _ = server.run(listener, stop).await;
    });

    TestServer {
        addr,
        table,
        shutdown,
        config,
    }
}

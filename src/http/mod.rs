//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, request ID, timeout, trace layers)
//!     → routing::Router::resolve (live table, read through ArcSwap)
//!     → context.rs (run the matched handler chain)
//!     → status, headers and body accumulated in the Context
//!     → Send to client
//! ```

pub mod context;
pub mod handlers;
pub mod server;

pub use context::{handler, run_chain, Context, Flow, Handler};
pub use handlers::{HandlerRegistry, UnknownHandler};
pub use server::{AppState, HttpServer, X_REQUEST_ID};

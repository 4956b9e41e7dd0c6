//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build route table → Start listener
//!
//! Reload (startup.rs):
//!     New config → Build route table → Swap, or keep the old one on error
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     Ctrl-C received → Stop accepting → Drain in-flight requests → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast at startup: any registration error is fatal
//! - Reload failures are logged and never replace a working table
//! - The listener starts last (traffic only when the table is ready)

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_table, reload, RouteTable, StartupError};

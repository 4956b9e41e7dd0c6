//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (startup):
//!     method + host pattern + path pattern + handler chain
//!     → pattern.rs (compile host kind and path segments, via macros.rs)
//!     → host.rs (pick the trie for the host kind)
//!     → trie.rs (insert, rejecting duplicates and parameter conflicts)
//!     → RouterBuilder::build → frozen Router
//!
//! Resolution (per request):
//!     method + host + path
//!     → host.rs (exact → static subdomain → wildcard subdomain → root)
//!     → trie.rs (literal > parameter > wildcard, with backtracking)
//!     → RouteMatch { route, params, subdomain } | NotFound | MethodNotAllowed
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path: macros are plain predicates
//! - Deterministic: precedence depends on segment kind, never on timing
//! - Registration order only breaks ties the precedence rules leave open

pub mod error;
pub mod host;
pub mod macros;
pub mod params;
pub mod party;
pub mod pattern;
pub mod router;
pub mod trie;

pub use error::{DecodeError, RegistrationError, ResolveError};
pub use host::{normalize_host, HostMatcher};
pub use macros::{MacroRegistry, ParamMacro, ParamValue};
pub use params::{Param, Params};
pub use party::Party;
pub use pattern::{split_host, HostKind, PathPattern, Segment};
pub use router::{parse_methods, Route, RouteInfo, RouteMatch, RouteOptions, Router, RouterBuilder};
pub use trie::PathTrie;

//! Host and subdomain selection.
//!
//! # Responsibilities
//! - Hold one path trie per registered host kind
//! - Pick the trie that serves a request's method and host
//! - Extract the subdomain label of a request host
//!
//! # Selection Order (per method)
//! ```text
//! 1. exact host          api.example.com
//! 2. static subdomain    admin.
//! 3. wildcard subdomain  *.            (label exposed as `subdomain`)
//! 4. root                (no host)
//! ```
//!
//! # Design Decisions
//! - A stage only counts for a method if its trie serves that method, which
//!   behaves like one host matcher per method
//! - The chosen trie is final: a path miss there does not fall through
//! - Host comparison is case-insensitive and ignores the port

use std::collections::HashMap;
use std::net::IpAddr;

use axum::http::Method;

use crate::routing::pattern::HostKind;
use crate::routing::trie::PathTrie;

/// The trie chosen for a request, with the subdomain label when one applied.
#[derive(Debug)]
pub struct Selection<'h, T> {
    pub trie: &'h PathTrie<T>,
    pub subdomain: Option<String>,
}

/// Host-level index of path tries.
#[derive(Debug)]
pub struct HostMatcher<T> {
    exact: HashMap<String, PathTrie<T>>,
    subdomains: HashMap<String, PathTrie<T>>,
    wildcard: Option<PathTrie<T>>,
    root: PathTrie<T>,
    root_domain: Option<String>,
}

impl<T> Default for HostMatcher<T> {
    fn default() -> Self {
        Self {
            exact: HashMap::new(),
            subdomains: HashMap::new(),
            wildcard: None,
            root: PathTrie::new(),
            root_domain: None,
        }
    }
}

impl<T> HostMatcher<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve subdomains relative to `domain` (e.g. `example.com`) instead of
    /// guessing from the number of labels.
    pub fn with_root_domain(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into().trim_matches('.').to_ascii_lowercase();
        self.root_domain = if domain.is_empty() { None } else { Some(domain) };
        self
    }

    pub fn root_domain(&self) -> Option<&str> {
        self.root_domain.as_deref()
    }

    /// The trie for a host kind, created on first use.
    pub fn trie_mut(&mut self, kind: &HostKind) -> &mut PathTrie<T> {
        match kind {
            HostKind::Root => &mut self.root,
            HostKind::Exact(host) => self.exact.entry(host.clone()).or_default(),
            HostKind::StaticSubdomain(label) => self.subdomains.entry(label.clone()).or_default(),
            HostKind::WildcardSubdomain => self.wildcard.get_or_insert_with(PathTrie::new),
        }
    }

    /// Pick the trie serving `method` for the request `host`.
    pub fn select(&self, method: &Method, host: &str) -> Selection<'_, T> {
        let host = normalize_host(host);

        if let Some(trie) = self.exact.get(host.as_str()) {
            if trie.serves(method) {
                return Selection { trie, subdomain: None };
            }
        }

        if let Some(label) = self.subdomain_of(&host) {
            if let Some(trie) = self.subdomains.get(label) {
                if trie.serves(method) {
                    return Selection {
                        trie,
                        subdomain: Some(label.to_string()),
                    };
                }
            }
            if let Some(trie) = &self.wildcard {
                if trie.serves(method) {
                    return Selection {
                        trie,
                        subdomain: Some(label.to_string()),
                    };
                }
            }
        }

        Selection {
            trie: &self.root,
            subdomain: None,
        }
    }

    /// Subdomain part of an already normalized host.
    pub fn subdomain_of<'a>(&self, host: &'a str) -> Option<&'a str> {
        if host.is_empty() || host.parse::<IpAddr>().is_ok() {
            return None;
        }

        match &self.root_domain {
            Some(domain) => {
                let prefix = host.strip_suffix(domain.as_str())?.strip_suffix('.')?;
                if prefix.is_empty() {
                    None
                } else {
                    Some(prefix)
                }
            }
            None => {
                let (label, rest) = host.split_once('.')?;
                if label.is_empty() || rest.is_empty() {
                    return None;
                }
                if rest.contains('.') || rest == "localhost" {
                    Some(label)
                } else {
                    None
                }
            }
        }
    }

    /// Every trie with its host kind, for diagnostics.
    pub fn tries(&self) -> impl Iterator<Item = (HostKind, &PathTrie<T>)> {
        let exact = self
            .exact
            .iter()
            .map(|(host, trie)| (HostKind::Exact(host.clone()), trie));
        let subdomains = self
            .subdomains
            .iter()
            .map(|(label, trie)| (HostKind::StaticSubdomain(label.clone()), trie));
        let wildcard = self
            .wildcard
            .iter()
            .map(|trie| (HostKind::WildcardSubdomain, trie));
        exact
            .chain(subdomains)
            .chain(wildcard)
            .chain(std::iter::once((HostKind::Root, &self.root)))
    }
}

/// Lowercase a request host and strip its port. IPv6 literals lose their brackets.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = if let Some(rest) = host.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else {
        host.split(':').next().unwrap_or(host)
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}

//! Route pattern compilation.
//!
//! # Responsibilities
//! - Parse path patterns into literal and parameter segments
//! - Validate parameter names, macros and greedy placement
//! - Parse host patterns into a `HostKind`
//! - Substitute values back into a pattern (reverse routing)
//!
//! # Pattern Syntax
//! ```text
//! /games/{gameID:uint64}/clans     literal, typed parameter, literal
//! /users/{name}                    parameter defaulting to `string`
//! /static/{file:path}              greedy tail, must be last
//! admin./dashboard                 static subdomain prefix
//! *./party                         wildcard subdomain prefix
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::routing::error::RegistrationError;
use crate::routing::macros::{MacroRegistry, ParamMacro, DEFAULT_MACRO};

/// Host part of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostKind {
    /// No host constraint: served for any host not claimed elsewhere.
    Root,
    /// A full host name, e.g. `api.example.com`.
    Exact(String),
    /// A single subdomain label, written `admin.`.
    StaticSubdomain(String),
    /// Any subdomain, written `*.`.
    WildcardSubdomain,
}

impl HostKind {
    pub fn parse(raw: &str) -> Result<Self, RegistrationError> {
        let host = raw.trim().to_ascii_lowercase();
        if host.is_empty() {
            return Ok(HostKind::Root);
        }
        if host == "*." {
            return Ok(HostKind::WildcardSubdomain);
        }
        if host.contains('*') {
            return Err(RegistrationError::malformed(
                raw,
                "wildcard subdomain must be written exactly as `*.`",
            ));
        }
        if !host
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
        {
            return Err(RegistrationError::malformed(raw, "invalid character in host"));
        }

        let name = host.strip_suffix('.').unwrap_or(&host);
        if name.is_empty() || name.split('.').any(str::is_empty) {
            return Err(RegistrationError::malformed(raw, "empty host label"));
        }

        if host.ends_with('.') && !name.contains('.') {
            Ok(HostKind::StaticSubdomain(name.to_string()))
        } else {
            Ok(HostKind::Exact(name.to_string()))
        }
    }
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostKind::Root => Ok(()),
            HostKind::Exact(host) => write!(f, "{}", host),
            HostKind::StaticSubdomain(label) => write!(f, "{}.", label),
            HostKind::WildcardSubdomain => write!(f, "*."),
        }
    }
}

/// Split a combined pattern such as `admin./users` into host and path parts.
///
/// A host prefix is the text before the first `/` and must end in `.`
/// (`admin.`, `*.`, `example.com.`). Anything else is returned whole as the
/// path, so a relative path fails to compile instead of becoming a host.
pub fn split_host(raw: &str) -> (&str, &str) {
    let end = raw.find('/').unwrap_or(raw.len());
    let (head, path) = raw.split_at(end);
    if head.ends_with('.') {
        (head, path)
    } else {
        ("", raw)
    }
}

/// One compiled unit of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param {
        name: Arc<str>,
        kind: Arc<ParamMacro>,
        greedy: bool,
    },
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a raw path pattern against the given macro registry.
    pub fn compile(raw: &str, macros: &MacroRegistry) -> Result<Self, RegistrationError> {
        let raw = if raw.is_empty() { "/" } else { raw };
        if !raw.starts_with('/') {
            return Err(RegistrationError::malformed(raw, "path must start with `/`"));
        }

        let mut segments = Vec::new();
        let mut names = HashSet::new();

        for part in raw.split('/').filter(|s| !s.is_empty()) {
            let segment = Self::compile_segment(raw, part, macros)?;
            if let Segment::Param { name, .. } = &segment {
                if !names.insert(name.clone()) {
                    return Err(RegistrationError::malformed(
                        raw,
                        format!("parameter `{}` is declared twice", name),
                    ));
                }
            }
            segments.push(segment);
        }

        let greedy_before_end = segments
            .iter()
            .rev()
            .skip(1)
            .any(|s| matches!(s, Segment::Param { greedy: true, .. }));
        if greedy_before_end {
            return Err(RegistrationError::malformed(
                raw,
                "a path parameter must be the last segment",
            ));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    fn compile_segment(
        raw: &str,
        part: &str,
        macros: &MacroRegistry,
    ) -> Result<Segment, RegistrationError> {
        let inner = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
            Some(inner) => inner,
            None => {
                if part.contains('{') || part.contains('}') {
                    return Err(RegistrationError::malformed(
                        raw,
                        format!("parameter must span the whole segment, got `{}`", part),
                    ));
                }
                return Ok(Segment::Literal(part.to_string()));
            }
        };

        let (name, macro_name) = match inner.split_once(':') {
            Some((name, macro_name)) => (name.trim(), macro_name.trim()),
            None => (inner.trim(), DEFAULT_MACRO),
        };

        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(RegistrationError::malformed(
                raw,
                format!("invalid parameter name `{}`", name),
            ));
        }

        let kind = macros.lookup(macro_name).ok_or_else(|| {
            RegistrationError::malformed(raw, format!("unknown parameter macro `{}`", macro_name))
        })?;

        Ok(Segment::Param {
            name: Arc::from(name),
            greedy: kind.is_greedy(),
            kind,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, .. } => Some(&**name),
            Segment::Literal(_) => None,
        })
    }

    /// Build a concrete path by substituting `values` in declaration order.
    ///
    /// Returns `None` when the number of values differs from the number of
    /// parameters or a value is rejected by its macro. Greedy values may
    /// contain `/` between non-empty segments; other values may not.
    pub fn build(&self, values: &[&str]) -> Option<String> {
        if values.len() != self.param_names().count() {
            return None;
        }

        let mut values = values.iter();
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Param { kind, greedy, .. } => {
                    let value = values.next()?.trim_matches('/');
                    if !kind.matches(value) || (!greedy && value.contains('/')) {
                        return None;
                    }
                    // Lookup never yields an empty segment, so `a//b` cannot round-trip.
                    if *greedy && value.split('/').any(str::is_empty) {
                        return None;
                    }
                    path.push_str(value);
                }
            }
        }

        if path.is_empty() {
            path.push('/');
        }
        Some(path)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

//! Segment trie for path patterns.
//!
//! # Responsibilities
//! - Index compiled path patterns by segment
//! - Detect duplicate and conflicting registrations at insert time
//! - Resolve request paths with backtracking, collecting parameters
//!
//! # Design Decisions
//! - Each node owns literal children, at most one parameter child and at most
//!   one greedy (wildcard) child
//! - Lookup order is literal, then parameter, then wildcard; a branch that
//!   fails deeper down falls back to the next candidate at the same node
//! - Terminal values are keyed by method, and lookup keeps backtracking past
//!   nodes that only hold other methods
//! - Lookup never mutates the trie; bindings live in the caller's `Params`

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::http::Method;

use crate::routing::macros::ParamMacro;
use crate::routing::params::{Param, Params};
use crate::routing::pattern::Segment;

/// Reason an insertion was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertConflict {
    /// The method already has a value at this exact shape.
    Duplicate,
    /// A different parameter already occupies the slot.
    Param { existing: String, attempted: String },
}

/// A successful lookup.
#[derive(Debug)]
pub struct Found<'t, T> {
    pub value: &'t T,
    pub params: Params,
}

#[derive(Debug)]
struct Node<T> {
    literals: HashMap<String, Node<T>>,
    param: Option<Box<ParamChild<T>>>,
    wildcard: Option<Box<ParamChild<T>>>,
    routes: HashMap<Method, T>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            literals: HashMap::new(),
            param: None,
            wildcard: None,
            routes: HashMap::new(),
        }
    }
}

#[derive(Debug)]
struct ParamChild<T> {
    name: Arc<str>,
    kind: Arc<ParamMacro>,
    node: Node<T>,
}

impl<T> ParamChild<T> {
    fn describe(&self) -> String {
        format!("{{{}:{}}}", self.name, self.kind.name())
    }
}

/// Path trie holding one value per (method, path shape).
#[derive(Debug)]
pub struct PathTrie<T> {
    root: Node<T>,
    methods: HashSet<Method>,
    len: usize,
}

impl<T> Default for PathTrie<T> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            methods: HashSet::new(),
            len: 0,
        }
    }
}

impl<T> PathTrie<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` for `method` at the shape described by `segments`.
    pub fn insert(
        &mut self,
        method: Method,
        segments: &[Segment],
        value: T,
    ) -> Result<(), InsertConflict> {
        // Conflicts can only surface on nodes that already existed, so a
        // refused insert leaves the trie unchanged.
        let mut node = &mut self.root;

        for segment in segments {
            node = match segment {
                Segment::Literal(text) => node.literals.entry(text.clone()).or_default(),
                Segment::Param { name, kind, greedy } => {
                    let slot = if *greedy {
                        &mut node.wildcard
                    } else {
                        &mut node.param
                    };
                    let child = slot.get_or_insert_with(|| {
                        Box::new(ParamChild {
                            name: name.clone(),
                            kind: kind.clone(),
                            node: Node::default(),
                        })
                    });
                    // Macros compare by identity: a replaced macro with the same
                    // name is a different rule and must not reuse this slot.
                    if child.name != *name || !Arc::ptr_eq(&child.kind, kind) {
                        return Err(InsertConflict::Param {
                            existing: child.describe(),
                            attempted: format!("{{{}:{}}}", name, kind.name()),
                        });
                    }
                    &mut child.node
                }
            };
        }

        if node.routes.contains_key(&method) {
            return Err(InsertConflict::Duplicate);
        }
        node.routes.insert(method.clone(), value);
        self.methods.insert(method);
        self.len += 1;
        Ok(())
    }

    /// Resolve a request path for `method`.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<Found<'_, T>> {
        if !self.methods.contains(method) {
            return None;
        }

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::with_capacity(segments.len());
        let value = Self::find(&self.root, &segments, method, &mut params)?;
        Some(Found { value, params })
    }

    fn find<'t>(
        node: &'t Node<T>,
        segments: &[&str],
        method: &Method,
        params: &mut Params,
    ) -> Option<&'t T> {
        let (segment, rest) = match segments.split_first() {
            Some(split) => split,
            None => return node.routes.get(method),
        };

        if let Some(child) = node.literals.get(*segment) {
            if let Some(value) = Self::find(child, rest, method, params) {
                return Some(value);
            }
        }

        if let Some(child) = &node.param {
            if child.kind.matches(segment) {
                params.push(Param::new(child.name.clone(), segment.to_string(), child.kind.clone()));
                if let Some(value) = Self::find(&child.node, rest, method, params) {
                    return Some(value);
                }
                params.pop();
            }
        }

        if let Some(child) = &node.wildcard {
            if let Some(value) = child.node.routes.get(method) {
                let tail = segments.join("/");
                if child.kind.matches(&tail) {
                    params.push(Param::new(child.name.clone(), tail, child.kind.clone()));
                    return Some(value);
                }
            }
        }

        None
    }

    /// Returns true if at least one value is registered for `method`.
    pub fn serves(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::macros::{MacroRegistry, ParamValue};
    use crate::routing::pattern::PathPattern;

    fn trie(routes: &[(Method, &'static str)]) -> PathTrie<&'static str> {
        let macros = MacroRegistry::new();
        let mut trie = PathTrie::new();
        for (method, raw) in routes {
            let pattern = PathPattern::compile(raw, &macros).unwrap();
            trie.insert(method.clone(), pattern.segments(), *raw).unwrap();
        }
        trie
    }

    fn hit(trie: &PathTrie<&'static str>, method: Method, path: &str) -> Option<&'static str> {
        trie.lookup(&method, path).map(|found| *found.value)
    }

    #[test]
    fn test_literal_beats_wildcard() {
        let t = trie(&[
            (Method::GET, "/other2/{p:path}"),
            (Method::GET, "/other2/static2"),
        ]);
        assert_eq!(hit(&t, Method::GET, "/other2/static2"), Some("/other2/static2"));
        assert_eq!(hit(&t, Method::GET, "/other2/anything/else"), Some("/other2/{p:path}"));

        let found = t.lookup(&Method::GET, "/other2/anything/else").unwrap();
        assert_eq!(found.params.get("p"), Some("anything/else"));
    }

    #[test]
    fn test_backtracks_out_of_partial_literal_match() {
        let t = trie(&[
            (Method::GET, "/users/new/form"),
            (Method::GET, "/users/{id}/edit"),
            (Method::GET, "/{p:path}"),
        ]);
        assert_eq!(hit(&t, Method::GET, "/users/new/form"), Some("/users/new/form"));
        // "new" matches the literal, but only the param branch continues with "edit".
        assert_eq!(hit(&t, Method::GET, "/users/new/edit"), Some("/users/{id}/edit"));
        assert_eq!(hit(&t, Method::GET, "/users/new/other"), Some("/{p:path}"));

        let found = t.lookup(&Method::GET, "/users/new/other").unwrap();
        assert_eq!(found.params.len(), 1);
        assert_eq!(found.params.get("p"), Some("users/new/other"));
    }

    #[test]
    fn test_param_beats_wildcard_and_checks_macro() {
        let t = trie(&[
            (Method::GET, "/games/{id:uint64}"),
            (Method::GET, "/games/{rest:path}"),
        ]);
        assert_eq!(hit(&t, Method::GET, "/games/42"), Some("/games/{id:uint64}"));
        assert_eq!(hit(&t, Method::GET, "/games/abc"), Some("/games/{rest:path}"));
    }

    #[test]
    fn test_wildcard_needs_a_segment() {
        let t = trie(&[(Method::GET, "/{p:path}")]);
        assert_eq!(hit(&t, Method::GET, "/"), None);
        assert_eq!(hit(&t, Method::GET, "/a/b/c"), Some("/{p:path}"));

        let t = trie(&[(Method::GET, "/{p:path}"), (Method::GET, "/")]);
        assert_eq!(hit(&t, Method::GET, "/"), Some("/"));
    }

    #[test]
    fn test_lookup_is_method_aware() {
        let t = trie(&[
            (Method::GET, "/users/new"),
            (Method::POST, "/users/{id}"),
        ]);
        assert_eq!(hit(&t, Method::GET, "/users/new"), Some("/users/new"));
        assert_eq!(hit(&t, Method::POST, "/users/new"), Some("/users/{id}"));
        assert_eq!(hit(&t, Method::DELETE, "/users/new"), None);
        assert!(t.serves(&Method::POST));
        assert!(!t.serves(&Method::PUT));
    }

    #[test]
    fn test_params_in_declaration_order() {
        let t = trie(&[(Method::POST, "/games/{gameID:uint64}/clans/{clanPublicID:uint64}/leave")]);
        let found = t.lookup(&Method::POST, "/games/42/clans/93/leave").unwrap();
        let names: Vec<_> = found.params.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["gameID", "clanPublicID"]);
        assert_eq!(found.params.get_u64("clanPublicID").unwrap(), 93);
    }

    #[test]
    fn test_duplicate_rejected() {
        let macros = MacroRegistry::new();
        let mut t = PathTrie::new();
        let a = PathPattern::compile("/games/{id:uint64}", &macros).unwrap();
        let b = PathPattern::compile("/games/{id:uint64}/", &macros).unwrap();
        t.insert(Method::GET, a.segments(), 1).unwrap();
        assert_eq!(t.insert(Method::GET, b.segments(), 2), Err(InsertConflict::Duplicate));
        assert!(t.insert(Method::PUT, b.segments(), 3).is_ok());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_param_conflict() {
        let macros = MacroRegistry::new();
        let mut t = PathTrie::new();
        let a = PathPattern::compile("/users/{id:uint64}", &macros).unwrap();
        let b = PathPattern::compile("/users/{name}/posts", &macros).unwrap();
        let c = PathPattern::compile("/users/{id:int}", &macros).unwrap();
        let same = PathPattern::compile("/users/{id:uint64}/posts", &macros).unwrap();

        t.insert(Method::GET, a.segments(), 1).unwrap();
        assert_eq!(
            t.insert(Method::GET, b.segments(), 2),
            Err(InsertConflict::Param {
                existing: "{id:uint64}".into(),
                attempted: "{name:string}".into(),
            })
        );
        assert!(matches!(
            t.insert(Method::POST, c.segments(), 3),
            Err(InsertConflict::Param { .. })
        ));
        assert!(t.insert(Method::GET, same.segments(), 4).is_ok());
    }

    #[test]
    fn test_replaced_macro_conflicts() {
        let mut macros = MacroRegistry::new();
        let mut t = PathTrie::new();
        let old = PathPattern::compile("/f/{on:bool}", &macros).unwrap();
        t.insert(Method::GET, old.segments(), 1).unwrap();

        macros.register("bool", |raw| raw == "yes", |_| Some(ParamValue::Bool(true)));
        let new = PathPattern::compile("/f/{on:bool}", &macros).unwrap();
        assert_eq!(
            t.insert(Method::POST, new.segments(), 2),
            Err(InsertConflict::Param {
                existing: "{on:bool}".into(),
                attempted: "{on:bool}".into(),
            })
        );
        assert!(t.lookup(&Method::POST, "/f/true").is_none());
        assert_eq!(t.lookup(&Method::GET, "/f/true").map(|f| *f.value), Some(1));
    }

    #[test]
    fn test_wildcard_conflict() {
        let macros = MacroRegistry::new();
        let mut t = PathTrie::new();
        let a = PathPattern::compile("/static/{file:path}", &macros).unwrap();
        let b = PathPattern::compile("/static/{rest:path}", &macros).unwrap();
        t.insert(Method::GET, a.segments(), 1).unwrap();
        assert!(matches!(
            t.insert(Method::HEAD, b.segments(), 2),
            Err(InsertConflict::Param { .. })
        ));
    }
}

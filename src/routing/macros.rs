//! Parameter macro registry.
//!
//! # Responsibilities
//! - Map a parameter type name (`uint64`, `path`, ...) to a matching predicate
//! - Decode raw segments into typed values on demand
//! - Hold the built-in macros every route table starts with
//!
//! # Design Decisions
//! - The registry is an explicit value owned by the route builder, never a global
//! - Matching and decoding are separate so handlers only pay for decoding when they ask
//! - A greedy macro consumes the rest of the path and may only end a pattern

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::routing::error::DecodeError;

/// Name of the macro used when a parameter declares none.
pub const DEFAULT_MACRO: &str = "string";

/// Typed value of a bound path parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Int(i64),
    Uint(u64),
    Bool(bool),
}

type Predicate = dyn Fn(&str) -> bool + Send + Sync;
type Decoder = dyn Fn(&str) -> Option<ParamValue> + Send + Sync;

/// A named parameter matching and decoding rule.
#[derive(Clone)]
pub struct ParamMacro {
    name: Arc<str>,
    predicate: Arc<Predicate>,
    decoder: Arc<Decoder>,
    greedy: bool,
}

impl ParamMacro {
    /// Create a single-segment macro.
    ///
    /// The decoder returns `None` when the raw value cannot be converted.
    pub fn new<P, D>(name: impl Into<String>, predicate: P, decoder: D) -> Self
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
        D: Fn(&str) -> Option<ParamValue> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            predicate: Arc::new(predicate),
            decoder: Arc::new(decoder),
            greedy: false,
        }
    }

    /// Mark the macro as consuming every remaining path segment.
    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    /// Returns true if the raw segment (or tail, for greedy macros) is accepted.
    pub fn matches(&self, raw: &str) -> bool {
        !raw.is_empty() && (self.predicate)(raw)
    }

    /// Decode a raw value bound to the parameter `param`.
    pub fn decode(&self, param: &str, raw: &str) -> Result<ParamValue, DecodeError> {
        (self.decoder)(raw).ok_or_else(|| DecodeError::Invalid {
            name: param.to_string(),
            macro_name: self.name.to_string(),
            raw: raw.to_string(),
        })
    }
}

impl fmt::Debug for ParamMacro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamMacro")
            .field("name", &self.name)
            .field("greedy", &self.greedy)
            .finish()
    }
}

/// Structural equality on name and greediness. The trie compares slots by
/// `Arc` identity, so a replaced macro never shares a slot with its predecessor.
impl PartialEq for ParamMacro {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.greedy == other.greedy
    }
}

impl Eq for ParamMacro {}

/// Registry of parameter macros available to the pattern compiler.
#[derive(Debug, Clone)]
pub struct MacroRegistry {
    macros: HashMap<String, Arc<ParamMacro>>,
}

impl MacroRegistry {
    /// A registry with no macros at all.
    pub fn empty() -> Self {
        Self {
            macros: HashMap::new(),
        }
    }

    /// A registry holding the built-in macros.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_builtins();
        registry
    }

    /// Register a single-segment macro, replacing any macro with the same name.
    pub fn register<P, D>(&mut self, name: &str, predicate: P, decoder: D) -> Option<Arc<ParamMacro>>
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
        D: Fn(&str) -> Option<ParamValue> + Send + Sync + 'static,
    {
        self.insert(ParamMacro::new(name, predicate, decoder))
    }

    /// Register a prebuilt macro, returning the one it replaced.
    pub fn insert(&mut self, param_macro: ParamMacro) -> Option<Arc<ParamMacro>> {
        tracing::debug!(
            name = param_macro.name(),
            greedy = param_macro.is_greedy(),
            "Parameter macro registered"
        );
        self.macros
            .insert(param_macro.name().to_string(), Arc::new(param_macro))
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<ParamMacro>> {
        self.macros.get(name).cloned()
    }

    /// Registered macro names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.macros.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn register_builtins(&mut self) {
        self.register(DEFAULT_MACRO, |_| true, |raw| Some(ParamValue::String(raw.to_string())));

        self.register("int", signed::<isize>, decode_signed::<isize>);
        self.register("number", signed::<isize>, decode_signed::<isize>);
        self.register("int8", signed::<i8>, decode_signed::<i8>);
        self.register("int16", signed::<i16>, decode_signed::<i16>);
        self.register("int32", signed::<i32>, decode_signed::<i32>);
        self.register("int64", signed::<i64>, decode_signed::<i64>);

        self.register("uint", unsigned::<usize>, decode_unsigned::<usize>);
        self.register("uint8", unsigned::<u8>, decode_unsigned::<u8>);
        self.register("uint16", unsigned::<u16>, decode_unsigned::<u16>);
        self.register("uint32", unsigned::<u32>, decode_unsigned::<u32>);
        self.register("uint64", unsigned::<u64>, decode_unsigned::<u64>);
        self.register("long", unsigned::<u64>, decode_unsigned::<u64>);

        self.register(
            "bool",
            |raw| raw == "true" || raw == "false",
            |raw| match raw {
                "true" => Some(ParamValue::Bool(true)),
                "false" => Some(ParamValue::Bool(false)),
                _ => None,
            },
        );

        self.register(
            "alphabetical",
            |raw| raw.bytes().all(|b| b.is_ascii_alphabetic()),
            |raw| Some(ParamValue::String(raw.to_string())),
        );
        self.register(
            "file",
            |raw| {
                raw.bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
            },
            |raw| Some(ParamValue::String(raw.to_string())),
        );

        self.insert(
            ParamMacro::new("path", |_| true, |raw| Some(ParamValue::String(raw.to_string())))
                .greedy(),
        );
    }
}

impl Default for MacroRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Optional `-` followed by ASCII digits only; rejects `+5` and ` 5`.
fn is_signed_digits(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_unsigned_digits(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

fn signed<T: std::str::FromStr>(raw: &str) -> bool {
    is_signed_digits(raw) && raw.parse::<T>().is_ok()
}

fn unsigned<T: std::str::FromStr>(raw: &str) -> bool {
    is_unsigned_digits(raw) && raw.parse::<T>().is_ok()
}

fn decode_signed<T>(raw: &str) -> Option<ParamValue>
where
    T: std::str::FromStr + TryInto<i64>,
{
    if !is_signed_digits(raw) {
        return None;
    }
    let value: T = raw.parse().ok()?;
    value.try_into().ok().map(ParamValue::Int)
}

fn decode_unsigned<T>(raw: &str) -> Option<ParamValue>
where
    T: std::str::FromStr + TryInto<u64>,
{
    if !is_unsigned_digits(raw) {
        return None;
    }
    let value: T = raw.parse().ok()?;
    value.try_into().ok().map(ParamValue::Uint)
}

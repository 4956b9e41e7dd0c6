//! Bound path parameters.
//!
//! Parameters are produced fresh for every resolution and owned by the
//! request. Entries keep the order in which the pattern declares them.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::routing::error::DecodeError;
use crate::routing::macros::{ParamMacro, ParamValue};

/// A single bound parameter: its name, the raw matched text and its macro.
#[derive(Debug, Clone)]
pub struct Param {
    name: Arc<str>,
    raw: String,
    kind: Arc<ParamMacro>,
}

impl Param {
    pub(crate) fn new(name: Arc<str>, raw: String, kind: Arc<ParamMacro>) -> Self {
        Self { name, raw, kind }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn macro_name(&self) -> &str {
        self.kind.name()
    }

    /// Decode the raw value with the parameter's macro.
    pub fn decode(&self) -> Result<ParamValue, DecodeError> {
        self.kind.decode(&self.name, &self.raw)
    }

    fn mismatch(&self, expected: &'static str) -> DecodeError {
        DecodeError::Mismatch {
            name: self.name.to_string(),
            raw: self.raw.clone(),
            expected,
        }
    }
}

/// Ordered parameter bindings of one resolved request.
#[derive(Debug, Clone, Default)]
pub struct Params {
    entries: Vec<Param>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, param: Param) {
        self.entries.push(param);
    }

    pub(crate) fn pop(&mut self) {
        self.entries.pop();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.entries.iter()
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.entries.iter().find(|p| &*p.name == name)
    }

    /// Raw value of the named parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.param(name).map(Param::raw)
    }

    /// Raw value of the named parameter, or `default` when unbound.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Decoded value of the named parameter.
    pub fn decode(&self, name: &str) -> Result<ParamValue, DecodeError> {
        self.require(name)?.decode()
    }

    pub fn get_string(&self, name: &str) -> Result<String, DecodeError> {
        let param = self.require(name)?;
        match param.decode()? {
            ParamValue::String(s) => Ok(s),
            ParamValue::Int(v) => Ok(v.to_string()),
            ParamValue::Uint(v) => Ok(v.to_string()),
            ParamValue::Bool(v) => Ok(v.to_string()),
        }
    }

    pub fn get_u64(&self, name: &str) -> Result<u64, DecodeError> {
        let param = self.require(name)?;
        match param.decode()? {
            ParamValue::Uint(v) => Ok(v),
            ParamValue::Int(v) => u64::try_from(v).map_err(|_| param.mismatch("u64")),
            ParamValue::String(s) => s.parse().map_err(|_| param.mismatch("u64")),
            ParamValue::Bool(_) => Err(param.mismatch("u64")),
        }
    }

    pub fn get_i64(&self, name: &str) -> Result<i64, DecodeError> {
        let param = self.require(name)?;
        match param.decode()? {
            ParamValue::Int(v) => Ok(v),
            ParamValue::Uint(v) => i64::try_from(v).map_err(|_| param.mismatch("i64")),
            ParamValue::String(s) => s.parse().map_err(|_| param.mismatch("i64")),
            ParamValue::Bool(_) => Err(param.mismatch("i64")),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, DecodeError> {
        let param = self.require(name)?;
        match param.decode()? {
            ParamValue::Bool(v) => Ok(v),
            ParamValue::String(s) => s.parse().map_err(|_| param.mismatch("bool")),
            _ => Err(param.mismatch("bool")),
        }
    }

    fn require(&self, name: &str) -> Result<&Param, DecodeError> {
        self.param(name)
            .ok_or_else(|| DecodeError::Missing(name.to_string()))
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Serializes as a name -> raw value map, in declaration order.
impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for param in &self.entries {
            map.serialize_entry(param.name(), param.raw())?;
        }
        map.end()
    }
}

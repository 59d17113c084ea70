//! Filters applied through `| name args` in expressions.
//!
//! A filter receives the value piped into it and its argument tokens with
//! surrounding quotes already stripped. Closures with the matching signature
//! are filters too:
//!
//! ```rust
//! use serde_json::Value;
//! use wispy_render::{Engine, FilterError};
//!
//! let engine = Engine::builder()
//!     .filter("reverse", |v: Value, _args: &[&str]| -> Result<Value, FilterError> {
//!         let s = wispy_render::stringify(&v);
//!         Ok(Value::from(s.chars().rev().collect::<String>()))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let out = engine.render_str("{% .w | reverse %}", serde_json::json!({"w": "abc"}));
//! assert_eq!(out.output, "cba");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::value::{escape_html, stringify};

/// Why a filter refused its input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct FilterError(pub String);

impl FilterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub trait Filter: Send + Sync {
    fn apply(&self, value: Value, args: &[&str]) -> Result<Value, FilterError>;
}

impl<F> Filter for F
where
    F: Fn(Value, &[&str]) -> Result<Value, FilterError> + Send + Sync,
{
    fn apply(&self, value: Value, args: &[&str]) -> Result<Value, FilterError> {
        (self)(value, args)
    }
}

/// Name to filter table. Re-registering a name replaces the old entry.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in filter.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert("upcase", upcase);
        registry.insert("downcase", downcase);
        registry.insert("capitalize", capitalize);
        registry.insert("strip", strip);
        registry.insert("truncate", truncate);
        registry.insert("slice", slice);
        registry.insert("join", join);
        registry.insert("default", default);
        registry.insert("escape", escape);
        registry.insert("size", size);
        registry
    }

    pub fn insert<F: Filter + 'static>(&mut self, name: impl Into<String>, filter: F) {
        let name = name.into();
        if self.filters.insert(name.clone(), Arc::new(filter)).is_some() {
            warn!(filter = %name, "filter registered twice, keeping the latest");
        }
    }

    /// Moves every entry of `other` in, replacing same-named filters.
    pub fn extend(&mut self, other: FilterRegistry) {
        for (name, filter) in other.filters {
            if self.filters.insert(name.clone(), filter).is_some() {
                debug!(filter = %name, "replacing built-in filter");
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Filter> {
        self.filters.get(name).map(|f| f.as_ref())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn map_string(value: Value, f: impl FnOnce(&str) -> String) -> Result<Value, FilterError> {
    Ok(Value::String(f(&stringify(&value))))
}

fn upcase(value: Value, _args: &[&str]) -> Result<Value, FilterError> {
    map_string(value, str::to_uppercase)
}

fn downcase(value: Value, _args: &[&str]) -> Result<Value, FilterError> {
    map_string(value, str::to_lowercase)
}

fn capitalize(value: Value, _args: &[&str]) -> Result<Value, FilterError> {
    map_string(value, |s| {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    })
}

fn strip(value: Value, _args: &[&str]) -> Result<Value, FilterError> {
    map_string(value, |s| s.trim().to_string())
}

fn truncate(value: Value, args: &[&str]) -> Result<Value, FilterError> {
    let limit: usize = args
        .first()
        .ok_or_else(|| FilterError::new("expected a length"))?
        .trim()
        .parse()
        .map_err(|_| FilterError::new(format!("invalid length {:?}", args[0])))?;
    map_string(value, |s| s.chars().take(limit).collect())
}

fn slice(value: Value, args: &[&str]) -> Result<Value, FilterError> {
    if value.is_array() {
        return Ok(value);
    }
    let delim = args.first().copied().unwrap_or(",");
    if delim.is_empty() {
        return Err(FilterError::new("delimiter must not be empty"));
    }
    let text = stringify(&value);
    if text.trim().is_empty() {
        return Ok(Value::Array(Vec::new()));
    }
    Ok(Value::Array(
        text.split(delim)
            .map(|part| Value::String(part.trim().to_string()))
            .collect(),
    ))
}

fn join(value: Value, args: &[&str]) -> Result<Value, FilterError> {
    let sep = args.first().copied().unwrap_or(", ");
    match value {
        Value::Array(items) => Ok(Value::String(
            items.iter().map(stringify).collect::<Vec<_>>().join(sep),
        )),
        other => Ok(Value::String(stringify(&other))),
    }
}

fn default(value: Value, args: &[&str]) -> Result<Value, FilterError> {
    let empty = match &value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        Ok(Value::String(args.first().copied().unwrap_or_default().to_string()))
    } else {
        Ok(value)
    }
}

fn escape(value: Value, _args: &[&str]) -> Result<Value, FilterError> {
    map_string(value, escape_html)
}

fn size(value: Value, _args: &[&str]) -> Result<Value, FilterError> {
    let n = match &value {
        Value::Null => 0,
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => stringify(other).chars().count(),
    };
    Ok(Value::from(n))
}

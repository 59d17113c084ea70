//! The slice of an inbound HTTP request that templates can see.

use serde_json::{Map, Value};

/// Headers and query parameters of the request being rendered.
///
/// Header names compare case-insensitively. Query parameters keep their
/// order and may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
}

impl RequestInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// First value of the named header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Query parameters as a JSON object. Repeated keys become arrays.
    pub fn query_object(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (key, value) in &self.query {
            match map.get_mut(key) {
                Some(Value::Array(values)) => values.push(Value::from(value.as_str())),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::from(value.as_str())]);
                }
                None => {
                    map.insert(key.clone(), Value::from(value.as_str()));
                }
            }
        }
        map
    }
}

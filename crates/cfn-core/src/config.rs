//! Configuration shared by every handler the router builds
//!
//! The framework does not care where the values come from (environment,
//! file, secret store); the daemon fills a [`HandlerConfig`] once at
//! startup and the router hands the same instance to each handler.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// String-keyed handler configuration
///
/// Keys are free-form and owned by the handlers that read them, e.g. the
/// CNAME handler looks up `cname-keytab` and `cname-principal`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerConfig {
    values: HashMap<String, String>,
}

impl HandlerConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a value, replacing any previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Look up a value, falling back to `default`
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Look up a value that must be present and non-empty
    pub fn require(&self, key: &str) -> Result<&str, crate::Error> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(crate::Error::config(format!("missing configuration key: {key}"))),
        }
    }

    /// Number of configured keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is configured
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HandlerConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

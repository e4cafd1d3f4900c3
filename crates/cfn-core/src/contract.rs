//! Declarative parameter contracts
//!
//! Each handler type declares which `ResourceProperties` it requires and
//! which it merely accepts. The orchestrator always adds its routing token
//! ([`SERVICE_TOKEN`]) to the properties, so that name is accepted by every
//! contract without being declared.
//!
//! ```rust
//! use cfn_core::contract::ParameterContract;
//! use serde_json::json;
//!
//! const CONTRACT: ParameterContract =
//!     ParameterContract::new(&["Zone", "RecordName"], &["Ttl"]);
//!
//! let props = json!({ "Zone": "example.com", "RecordName": "www" });
//! assert!(CONTRACT.check(props.as_object().unwrap()).is_ok());
//! ```

use crate::request::Properties;
use std::fmt;

/// Property name the orchestrator uses to route the request to us
pub const SERVICE_TOKEN: &str = "ServiceToken";

/// Mandatory and optional property names accepted by a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterContract {
    mandatory: &'static [&'static str],
    optional: &'static [&'static str],
}

impl ParameterContract {
    /// Contract with no declared parameters (only the service token passes)
    pub const EMPTY: Self = Self::new(&[], &[]);

    /// Declare a contract
    pub const fn new(mandatory: &'static [&'static str], optional: &'static [&'static str]) -> Self {
        Self {
            mandatory,
            optional,
        }
    }

    /// Names that must be present
    pub fn mandatory(&self) -> &'static [&'static str] {
        self.mandatory
    }

    /// Names that may be present
    pub fn optional(&self) -> &'static [&'static str] {
        self.optional
    }

    /// Whether `name` is declared by this contract or reserved
    pub fn permits(&self, name: &str) -> bool {
        name == SERVICE_TOKEN || self.mandatory.contains(&name) || self.optional.contains(&name)
    }

    /// Check a property set against the contract
    ///
    /// Missing names are reported in declaration order, unknown names in
    /// the order the property map yields them, so the same input always
    /// produces the same error.
    pub fn check(&self, properties: &Properties) -> Result<(), ValidationError> {
        let missing: Vec<String> = self
            .mandatory
            .iter()
            .filter(|name| !properties.contains_key(**name))
            .map(|name| (*name).to_string())
            .collect();

        let unknown: Vec<String> = properties
            .keys()
            .filter(|key| !self.permits(key))
            .cloned()
            .collect();

        if missing.is_empty() && unknown.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { missing, unknown })
        }
    }
}

/// Property set rejected by a [`ParameterContract`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Mandatory names that were absent
    pub missing: Vec<String>,
    /// Present names the contract does not declare
    pub unknown: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::with_capacity(2);
        if !self.missing.is_empty() {
            lines.push(format!(
                "Missing Mandatory Parameters: {}",
                self.missing.join(", ")
            ));
        }
        if !self.unknown.is_empty() {
            lines.push(format!("Unknown Parameters: {}", self.unknown.join(", ")));
        }
        f.write_str(&lines.join("\n"))
    }
}

impl std::error::Error for ValidationError {}

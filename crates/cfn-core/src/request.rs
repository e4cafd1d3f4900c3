//! Inbound custom resource requests
//!
//! Mirrors the JSON document the orchestrator sends. Keys the framework does
//! not use (`TopicArn`, ...) are ignored on deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Property map carried in `ResourceProperties` / `OldResourceProperties`
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Lifecycle action requested by the orchestrator
///
/// Values other than the three known actions are preserved so the
/// lifecycle can report them back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestType {
    /// Provision a new resource
    Create,
    /// Change an existing resource
    Update,
    /// Tear down a resource
    Delete,
    /// Anything else the orchestrator sent
    Other(String),
}

impl From<String> for RequestType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Create" => RequestType::Create,
            "Update" => RequestType::Update,
            "Delete" => RequestType::Delete,
            _ => RequestType::Other(value),
        }
    }
}

impl From<RequestType> for String {
    fn from(value: RequestType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestType::Create => f.write_str("Create"),
            RequestType::Update => f.write_str("Update"),
            RequestType::Delete => f.write_str("Delete"),
            RequestType::Other(other) => f.write_str(other),
        }
    }
}

/// A single custom resource lifecycle request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Request {
    /// Create, Update or Delete
    pub request_type: RequestType,

    /// Resource type string used for routing (e.g. `Custom::IPA-CNAME`)
    pub resource_type: String,

    /// Desired properties of the resource
    #[serde(default)]
    pub resource_properties: Properties,

    /// Previous properties (Update only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<Properties>,

    /// Unique id of this request
    pub request_id: String,

    /// Stack the resource belongs to
    pub stack_id: String,

    /// Template name of the resource
    pub logical_resource_id: String,

    /// Id assigned by a previous Create (absent on Create)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,

    /// Presigned URL the response must be delivered to
    #[serde(
        rename = "ResponseURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub response_url: Option<String>,
}

impl Request {
    /// Parse a request from a JSON string
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a request from any reader (stdin, a file, ...)
    pub fn from_reader(reader: impl Read) -> crate::Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load a request from a JSON file
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Previous properties, empty when the orchestrator sent none
    pub fn old_properties(&self) -> Properties {
        self.old_resource_properties.clone().unwrap_or_default()
    }
}

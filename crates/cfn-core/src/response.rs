//! Outbound result envelope

use serde::{Deserialize, Serialize};

/// Terminal status reported to the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    /// The resource action completed
    Success,
    /// The resource action was rejected or failed
    Failed,
}

/// Response document delivered to the `ResponseURL`
///
/// Absent fields are left out of the JSON entirely; the orchestrator treats
/// a present-but-null field differently from a missing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResponseStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_resource_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ResponseEnvelope {
    /// Serialize to the JSON body sent to the orchestrator
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Whether the envelope reports success
    pub fn is_success(&self) -> bool {
        self.status == Some(ResponseStatus::Success)
    }
}

//! Keyed entity attributes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

wire_enum! {
    /// Visibility scope of an attribute.
    pub enum AttributeScope ("attribute_scope") {
        /// Reported by the device.
        ClientScope => "CLIENT_SCOPE",
        /// Server-side only.
        ServerScope => "SERVER_SCOPE",
        /// Shared with the device.
        SharedScope => "SHARED_SCOPE",
    }
}

/// Attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum KvValue {
    /// Boolean.
    Bool(bool),
    /// 64-bit integer.
    Long(i64),
    /// Double.
    Double(f64),
    /// String.
    String(String),
    /// JSON document.
    Json(Value),
}

impl KvValue {
    /// Returns the JSON payload, parsing string values as JSON.
    ///
    /// Returns `None` for scalar values.
    pub fn to_json(&self) -> Option<Result<Value, serde_json::Error>> {
        match self {
            Self::Json(value) => Some(Ok(value.clone())),
            Self::String(raw) => Some(serde_json::from_str(raw)),
            Self::Bool(_) | Self::Long(_) | Self::Double(_) => None,
        }
    }
}

/// A stored attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeKv {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: KvValue,
    /// Last update time (unix millis).
    pub last_update_ts: i64,
}

impl AttributeKv {
    /// Creates an attribute stamped with the current time.
    pub fn new(key: impl Into<String>, value: KvValue) -> Self {
        Self {
            key: key.into(),
            value,
            last_update_ts: crate::id::now_millis(),
        }
    }
}

// src/protocol/response.rs

//! Inbound response inspection.

use serde_json::Value;

/// Diagnostic view over a response payload.
///
/// Responses are structurally untyped documents; the harness only inspects
/// three well-known optional fields for display. Each field is
/// presence-checked individually — absence is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseDigest {
    pub command: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
}

impl ResponseDigest {
    // ---
    /// Extract the well-known fields from a decoded payload.
    pub fn from_value(value: &Value) -> Self {
        // ---
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
        };

        Self {
            command: field("command"),
            status: field("status"),
            message: field("message"),
        }
    }
}

//! Per-command results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::BridgeError;

/// Department-specific key/value snapshot
pub type StatusMap = Map<String, Value>;

/// Outcome of one command; created fresh per call and never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub data: StatusMap,
}

impl CommandResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: StatusMap::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: StatusMap::new(),
        }
    }

    /// Attach a JSON object as `data`; non-object values land under "value"
    pub fn with_data(mut self, data: Value) -> Self {
        match data {
            Value::Object(map) => self.data = map,
            other => {
                self.data.insert("value".into(), other);
            }
        }
        self
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Fold an internal result into the boundary type
    pub fn from_result(result: Result<CommandResult, BridgeError>) -> Self {
        result.unwrap_or_else(Self::from)
    }
}

impl From<BridgeError> for CommandResult {
    fn from(err: BridgeError) -> Self {
        let kind = match &err {
            BridgeError::UnknownDepartment(_)
            | BridgeError::DepartmentOffline(_)
            | BridgeError::UnknownCommand(_) => "routing",
            BridgeError::InvalidParameter(_)
            | BridgeError::LowConfidence { .. }
            | BridgeError::Power(_) => "validation",
            BridgeError::Warp(_) | BridgeError::Rejected(_) => "rejected",
            BridgeError::Exhausted(_) => "exhausted",
            BridgeError::Configuration(_)
            | BridgeError::IoError(_)
            | BridgeError::TomlError(_)
            | BridgeError::SerdeError(_) => "internal",
        };
        Self::fail(err.to_string()).with_field("error", kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_data_object() {
        let result = CommandResult::ok("done").with_data(json!({"a": 1, "b": "two"}));
        assert_eq!(result.data["a"], 1);
        assert_eq!(result.data["b"], "two");
    }

    #[test]
    fn test_error_conversion_is_failure() {
        let result: CommandResult = BridgeError::UnknownDepartment("galley".into()).into();
        assert!(!result.success);
        assert!(result.message.contains("galley"));
        assert_eq!(result.data["error"], "routing");
    }

    #[test]
    fn test_serializes_to_wire_shape() {
        let json = serde_json::to_value(CommandResult::ok("Shields raising")).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Shields raising");
        assert!(json["data"].is_object());
    }
}

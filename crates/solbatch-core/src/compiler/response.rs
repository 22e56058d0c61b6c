use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostics::{Diagnostic, DiagnosticLevel};

/// The compiler's standard JSON output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerResponse {
    #[serde(default)]
    pub errors: Vec<ResponseError>,

    /// Source unit name -> compiler-assigned data
    #[serde(default)]
    pub sources: IndexMap<String, SourceOutput>,

    /// Source unit name -> construct name -> raw output
    #[serde(default)]
    pub contracts: IndexMap<String, IndexMap<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOutput {
    pub id: u32,
}

/// One entry of the response's `errors` list (warnings included)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseError {
    pub severity: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub component: String,

    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_message: Option<String>,
}

impl ResponseError {
    pub fn is_error(&self) -> bool {
        DiagnosticLevel::from_severity(&self.severity) == DiagnosticLevel::Error
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic {
            level: DiagnosticLevel::from_severity(&self.severity),
            kind: self.kind.clone(),
            message: self.message.clone(),
            formatted: self.formatted_message.clone(),
        }
    }
}

impl CompilerResponse {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Compiler-assigned id of a source unit
    pub fn source_id(&self, path: &str) -> Option<u32> {
        self.sources.get(path).map(|s| s.id)
    }

    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(ResponseError::is_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_ignores_unknown_fields() {
        let json = r#"{
            "errors": [{
                "severity": "warning",
                "type": "Warning",
                "component": "general",
                "message": "Unused variable",
                "formattedMessage": "Warning: Unused variable\n --> A.sol:3:5",
                "sourceLocation": {"file": "A.sol", "start": 10, "end": 20}
            }],
            "sources": {"A.sol": {"id": 0, "ast": {"nodeType": "SourceUnit"}}},
            "contracts": {"A.sol": {"A": {"abi": []}}}
        }"#;

        let response = CompilerResponse::from_json(json).unwrap();

        assert_eq!(response.source_id("A.sol"), Some(0));
        assert!(!response.has_errors());
        let diagnostic = response.errors[0].to_diagnostic();
        assert_eq!(diagnostic.level, DiagnosticLevel::Warning);
        assert_eq!(diagnostic.kind, "Warning");
        assert!(diagnostic.rendered().contains("A.sol:3:5"));
    }

    #[test]
    fn test_empty_response() {
        let response = CompilerResponse::from_json("{}").unwrap();
        assert!(response.contracts.is_empty());
        assert_eq!(response.source_id("A.sol"), None);
    }
}

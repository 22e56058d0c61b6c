use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ArtifactError, Result};

/// Persisted record of one compiled construct
///
/// Written wholesale after every successful compilation of its owning file
/// and read back by the change detector on the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildArtifact {
    /// Construct (contract, library, interface) name
    pub contract_name: String,

    /// Path of the file declaring the construct
    pub source: String,

    /// Compiler output for the construct, filtered by the output selection
    pub compiler_output: Value,

    /// Every file of the owning file's closure, ordered by compiler id
    pub sources: IndexMap<String, ArtifactSource>,

    pub compiler: CompilerRecord,
}

/// Closure entry of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSource {
    /// Fingerprint of the file content at compile time
    pub keccak256: String,

    /// Path the content was compiled under (canonical after remapping)
    pub file: String,

    /// Compiler-assigned source id
    pub id: Option<u32>,
}

/// Compiler identity recorded with an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerRecord {
    pub name: String,
    pub version: String,

    /// Fingerprint of the owning file
    pub keccak256: String,

    /// Request settings used for the compilation
    pub settings: Value,

    /// Hash of the output-shaping settings; absent in older artifacts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_hash: Option<String>,
}

impl BuildArtifact {
    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ArtifactError::from)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(ArtifactError::from)
    }

    /// Recorded fingerprint of `path`, falling back to its canonical alias target
    pub fn recorded_fingerprint(&self, path: &str, canonical: Option<&str>) -> Option<&str> {
        self.sources
            .get(path)
            .or_else(|| canonical.and_then(|c| self.sources.get(c)))
            .map(|s| s.keccak256.as_str())
    }
}

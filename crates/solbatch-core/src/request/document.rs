use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::{CompilationSettings, MetadataSettings, OptimizerSettings, OutputSelection};

/// The compiler request in the standard JSON input format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDocument {
    pub language: String,

    /// Source unit name -> entry, in registration order
    pub sources: IndexMap<String, SourceEntry>,

    pub settings: RequestSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub keccak256: String,
    pub content: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSettings {
    /// `alias=canonical` entries
    #[serde(default)]
    pub remappings: Vec<String>,
    pub optimizer: OptimizerSettings,
    pub metadata: MetadataSettings,
    pub output_selection: OutputSelection,
}

impl From<&CompilationSettings> for RequestSettings {
    fn from(settings: &CompilationSettings) -> Self {
        Self {
            remappings: Vec::new(),
            optimizer: settings.optimizer.clone(),
            metadata: settings.metadata.clone(),
            output_selection: settings.output_selection.clone(),
        }
    }
}

impl RequestDocument {
    /// An empty request for `language` with the given settings
    pub fn new(language: impl Into<String>, settings: &CompilationSettings) -> Self {
        Self {
            language: language.into(),
            sources: IndexMap::new(),
            settings: RequestSettings::from(settings),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.sources.contains_key(path)
    }
}

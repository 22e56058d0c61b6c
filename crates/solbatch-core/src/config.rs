use crate::errors::{BuildError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project manifest file name; its directory is the project base directory
pub const PROJECT_MANIFEST: &str = "solbatch.yaml";

/// Which compiler backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Try the subprocess compiler, fall back to the embedded one
    #[default]
    Auto,
    Process,
    Embedded,
}

/// External compiler selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    #[serde(default)]
    pub backend: Backend,

    /// Subprocess compiler executable (default: solc)
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Required compiler version prefix, e.g. `0.8.19`
    #[serde(default)]
    pub version: Option<String>,

    /// Value of the request's `language` field (default: Solidity)
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_binary() -> PathBuf {
    PathBuf::from("solc")
}

fn default_language() -> String {
    "Solidity".to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Auto,
            binary: default_binary(),
            version: None,
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_runs")]
    pub runs: u32,
}

fn default_runs() -> u32 {
    200
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            runs: default_runs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSettings {
    #[serde(default = "default_true")]
    pub use_literal_content: bool,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            use_literal_content: true,
        }
    }
}

/// `file -> construct -> [field]`; `"*"` keys apply to every file/construct
pub type OutputSelection = IndexMap<String, IndexMap<String, Vec<String>>>;

/// Compiler settings that shape the output of a compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationSettings {
    #[serde(default)]
    pub optimizer: OptimizerSettings,

    #[serde(default)]
    pub metadata: MetadataSettings,

    #[serde(default = "default_output_selection")]
    pub output_selection: OutputSelection,
}

fn default_output_selection() -> OutputSelection {
    let fields = [
        "abi",
        "evm.bytecode",
        "evm.deployedBytecode",
        "evm.methodIdentifiers",
        "metadata",
    ];
    let mut per_construct = IndexMap::new();
    per_construct.insert(
        "*".to_string(),
        fields.iter().map(|f| f.to_string()).collect(),
    );
    let mut selection = IndexMap::new();
    selection.insert("*".to_string(), per_construct);
    selection
}

impl Default for CompilationSettings {
    fn default() -> Self {
        Self {
            optimizer: OptimizerSettings::default(),
            metadata: MetadataSettings::default(),
            output_selection: default_output_selection(),
        }
    }
}

impl CompilationSettings {
    /// Replace the output selection with the same field list for every construct
    pub fn select_everywhere(&mut self, fields: &[&str]) {
        let mut per_construct = IndexMap::new();
        per_construct.insert(
            "*".to_string(),
            fields.iter().map(|f| f.to_string()).collect(),
        );
        self.output_selection.clear();
        self.output_selection.insert("*".to_string(), per_construct);
    }
}

/// Main build configuration, loaded from `solbatch.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Source file extension without the dot (default: sol)
    #[serde(default = "default_extension")]
    pub source_extension: String,

    /// Directory for per-construct artifacts (default: build/contracts)
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Directory for flattened sources (default: build/flattened)
    #[serde(default = "default_flat_dir")]
    pub flat_dir: PathBuf,

    /// Where to write the pruned compiler request before invocation
    #[serde(default = "default_debug_request")]
    pub debug_request: Option<PathBuf>,

    /// Directories searched for package-style imports (default: node_modules)
    #[serde(default = "default_search_paths")]
    pub search_paths: Vec<PathBuf>,

    /// Literal text substitutions applied to every loaded source, in order
    #[serde(default)]
    pub substitutions: IndexMap<String, String>,

    /// Boundary comment for flattened files; `{path}` is replaced by the file path
    #[serde(default = "default_boundary_marker")]
    pub file_boundary_marker: String,

    /// Annotate flattened files even when they hold a single file
    #[serde(default)]
    pub always_annotate: bool,

    /// Skip change detection and recompile every target
    #[serde(default)]
    pub force: bool,

    /// Target discovery patterns, relative to the base directory
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    #[serde(default)]
    pub compiler: CompilerConfig,

    #[serde(default)]
    pub settings: CompilationSettings,
}

fn default_true() -> bool {
    true
}

fn default_extension() -> String {
    "sol".to_string()
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("build/contracts")
}

fn default_flat_dir() -> PathBuf {
    PathBuf::from("build/flattened")
}

fn default_debug_request() -> Option<PathBuf> {
    Some(PathBuf::from("build/solc-input.json"))
}

fn default_search_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("node_modules")]
}

fn default_boundary_marker() -> String {
    "// File: {path}".to_string()
}

fn default_include() -> Vec<String> {
    vec!["contracts/**/*.sol".to_string()]
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_extension: default_extension(),
            artifacts_dir: default_artifacts_dir(),
            flat_dir: default_flat_dir(),
            debug_request: default_debug_request(),
            search_paths: default_search_paths(),
            substitutions: IndexMap::new(),
            file_boundary_marker: default_boundary_marker(),
            always_annotate: false,
            force: false,
            include: default_include(),
            compiler: CompilerConfig::default(),
            settings: CompilationSettings::default(),
        }
    }
}

/// Overrides collected from the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub artifacts_dir: Option<PathBuf>,
    pub flat_dir: Option<PathBuf>,
    pub debug_request: Option<PathBuf>,
    pub compiler_version: Option<String>,
    pub compiler_binary: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub force: Option<bool>,
    pub always_annotate: Option<bool>,
}

impl BuildConfig {
    /// Load configuration from a YAML (`.yaml`/`.yml`) or JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    /// Parse configuration text; the format is chosen by `path`'s extension
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
        let parsed = if is_json {
            serde_json::from_str(content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| BuildError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Create a default configuration and write it to a file
    pub fn init_file(path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(&BuildConfig::default()).map_err(|e| {
            BuildError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Merge CLI overrides into this configuration
    pub fn merge(&mut self, overrides: &CliOverrides) {
        if let Some(dir) = &overrides.artifacts_dir {
            self.artifacts_dir = dir.clone();
        }
        if let Some(dir) = &overrides.flat_dir {
            self.flat_dir = dir.clone();
        }
        if let Some(path) = &overrides.debug_request {
            self.debug_request = Some(path.clone());
        }
        if let Some(version) = &overrides.compiler_version {
            self.compiler.version = Some(version.clone());
        }
        if let Some(binary) = &overrides.compiler_binary {
            self.compiler.binary = binary.clone();
        }
        if let Some(backend) = overrides.backend {
            self.compiler.backend = backend;
        }
        if let Some(force) = overrides.force {
            self.force = force;
        }
        if let Some(annotate) = overrides.always_annotate {
            self.always_annotate = annotate;
        }
    }
}

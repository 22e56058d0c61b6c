//! Test fixtures - projects on disk and source snippets

use indoc::indoc;
use solbatch_core::artifacts::BuildArtifact;
use solbatch_core::config::BuildConfig;
use solbatch_core::diagnostics::DiagnosticHandler;
use solbatch_core::engine::BuildEngine;
use solbatch_core::fs::RealFileSystem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::mocks::{MockCompiler, MockDiagnosticHandler};

/// A project in a temporary directory
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write a file, creating parent directories
    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write file");
        self
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.join(relative)).expect("read file")
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.join(relative).exists()
    }

    /// Artifact `<name>.json` under the default artifacts directory
    pub fn artifact(&self, name: &str) -> BuildArtifact {
        let json = self.read(&format!("build/contracts/{}.json", name));
        BuildArtifact::from_json(&json).expect("parse artifact")
    }

    pub fn has_artifact(&self, name: &str) -> bool {
        self.exists(&format!("build/contracts/{}.json", name))
    }

    /// Engine on the real file system, bound to `compiler`
    pub fn engine(&self, config: BuildConfig, compiler: Arc<MockCompiler>) -> BuildEngine {
        self.engine_with_handler(config, compiler, MockDiagnosticHandler::new())
    }

    pub fn engine_with_handler(
        &self,
        config: BuildConfig,
        compiler: Arc<MockCompiler>,
        diagnostics: Arc<dyn DiagnosticHandler>,
    ) -> BuildEngine {
        BuildEngine::new(
            Arc::new(config),
            self.path().to_path_buf(),
            Arc::new(RealFileSystem::new()),
            diagnostics,
        )
        .with_compiler(compiler)
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Root contract importing `./Lib.sol`
pub fn root_source() -> &'static str {
    indoc! {r#"
        // SPDX-License-Identifier: MIT
        pragma solidity ^0.8.0;

        import "./Lib.sol";

        contract Root {
            function value() public pure returns (uint256) {
                return Lib.answer();
            }
        }
    "#}
}

/// Library imported by [`root_source`]
pub fn lib_source() -> &'static str {
    indoc! {r#"
        // SPDX-License-Identifier: MIT
        pragma solidity ^0.8.0;

        library Lib {
            function answer() internal pure returns (uint256) {
                return 42;
            }
        }
    "#}
}

/// [`lib_source`] with a one-byte change
pub fn lib_source_changed() -> &'static str {
    indoc! {r#"
        // SPDX-License-Identifier: MIT
        pragma solidity ^0.8.0;

        library Lib {
            function answer() internal pure returns (uint256) {
                return 43;
            }
        }
    "#}
}

/// A standalone contract with no imports
pub fn standalone_source(name: &str) -> String {
    format!(
        "// SPDX-License-Identifier: MIT\npragma solidity ^0.8.0;\n\ncontract {} {{}}\n",
        name
    )
}

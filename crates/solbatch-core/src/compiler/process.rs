use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, info};

use crate::request::RequestDocument;

use super::{Compiler, CompilerIdentity, CompilerResponse, ImportCallback, InvocationError};

/// Compiler run as a subprocess: `<binary> --standard-json`
///
/// The subprocess reads missing imports from disk itself, so the import
/// callback is never consulted. Requests are pruned to carry every source
/// a dirty target needs.
#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    binary: PathBuf,
    identity: CompilerIdentity,
}

impl ProcessCompiler {
    /// Run `<binary> --version` and build a compiler for the reported version
    pub fn detect(binary: impl Into<PathBuf>) -> Result<Self, InvocationError> {
        let binary = binary.into();
        let output = Command::new(&binary)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| InvocationError::Spawn {
                binary: binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(InvocationError::Exited {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = parse_version(&stdout).ok_or_else(|| {
            InvocationError::Protocol(format!("no version in `--version` output: {}", stdout.trim()))
        })?;

        let name = binary
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("solc")
            .to_string();
        info!("Found {} {} at {:?}", name, version, binary);

        Ok(Self {
            binary,
            identity: CompilerIdentity::new(name, version),
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

/// Version from `solc --version` style output
///
/// Prefers a `Version: <v>` line, else the first token starting with a digit
/// and containing a dot.
fn parse_version(output: &str) -> Option<String> {
    if let Some(line) = output.lines().find_map(|l| l.trim().strip_prefix("Version:")) {
        return line.split_whitespace().next().map(str::to_string);
    }
    output
        .split_whitespace()
        .map(|token| token.trim_start_matches('v'))
        .find(|token| token.starts_with(|c: char| c.is_ascii_digit()) && token.contains('.'))
        .map(str::to_string)
}

impl Compiler for ProcessCompiler {
    fn identity(&self) -> &CompilerIdentity {
        &self.identity
    }

    fn compile(
        &self,
        request: &RequestDocument,
        _imports: &mut dyn ImportCallback,
    ) -> Result<CompilerResponse, InvocationError> {
        let input = serde_json::to_vec(request).map_err(|e| InvocationError::Protocol(e.to_string()))?;
        debug!(
            "Invoking {:?} with {} sources ({} bytes)",
            self.binary,
            request.sources.len(),
            input.len()
        );

        let mut child = Command::new(&self.binary)
            .arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InvocationError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        let output = thread::scope(|scope| {
            // The child may fill stdout before it has read all of stdin.
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(&input),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            output.and_then(|output| written.map(|_| output))
        })
        .map_err(|source| InvocationError::Spawn {
            binary: self.binary.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Err(InvocationError::Exited {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        CompilerResponse::from_json(&stdout).map_err(|e| InvocationError::Protocol(e.to_string()))
    }
}

//! Mock implementations for testing

use indexmap::IndexMap;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use solbatch_core::compiler::{
    Compiler, CompilerIdentity, CompilerResponse, ImportCallback, InvocationError, ResponseError,
    SourceOutput,
};
use solbatch_core::diagnostics::{Diagnostic, DiagnosticHandler, DiagnosticLevel};
use solbatch_core::request::RequestDocument;
use solbatch_core::resolve::{is_relative, join_import};
use solbatch_core::scan::{RegexScanner, SourceScanner};

/// A mock diagnostic handler that collects diagnostics
#[derive(Debug, Default)]
pub struct MockDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl MockDiagnosticHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl DiagnosticHandler for MockDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.lock().unwrap().push(diagnostic);
    }

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn error_count(&self) -> usize {
        self.diagnostics
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .count()
    }

    fn warning_count(&self) -> usize {
        self.diagnostics
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warning)
            .count()
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().unwrap().clone()
    }
}

/// In-memory compiler speaking the standard JSON shapes
///
/// Source ids follow request order. Every declared construct gets an output
/// carrying the requested fields plus noise (assembly, opcodes, IR) that a
/// real compiler may add unasked. Imports missing from the request are
/// fetched through the import callback; unresolvable ones become errors.
pub struct MockCompiler {
    identity: CompilerIdentity,
    scanner: RegexScanner,
    invocations: AtomicUsize,
    requests: Mutex<Vec<RequestDocument>>,
    diagnostics: Mutex<Vec<ResponseError>>,
    fail_with: Mutex<Option<String>>,
}

impl MockCompiler {
    pub fn new(version: &str) -> Arc<Self> {
        Arc::new(Self {
            identity: CompilerIdentity::new("solc", version),
            scanner: RegexScanner::new(),
            invocations: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            diagnostics: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
        })
    }

    /// Number of `compile` calls so far
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RequestDocument> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Report an extra diagnostic on every following compilation
    pub fn add_diagnostic(&self, severity: &str, kind: &str, message: &str) {
        self.diagnostics.lock().unwrap().push(ResponseError {
            severity: severity.to_string(),
            kind: kind.to_string(),
            component: "general".to_string(),
            message: message.to_string(),
            formatted_message: Some(format!("{}: {}", kind, message)),
        });
    }

    /// Make every following invocation fail outright
    pub fn fail_invocations(&self, reason: &str) {
        *self.fail_with.lock().unwrap() = Some(reason.to_string());
    }

    fn construct_output(name: &str, content: &str) -> Value {
        let bytecode: String = content
            .bytes()
            .take(16)
            .map(|b| format!("{:02x}", b))
            .collect();
        let mut method_identifiers = serde_json::Map::new();
        method_identifiers.insert(format!("name{}()", name), json!("06fdde03"));
        json!({
            "abi": [{"type": "function", "name": format!("name{}", name), "inputs": [], "outputs": []}],
            "metadata": format!("{{\"compiler\":{{\"name\":\"{}\"}}}}", name),
            "evm": {
                "assembly": format!("    /* \"{}\" */\n  mstore(0x40, 0x80)", name),
                "legacyAssembly": {".code": [{"name": "PUSH", "value": "80"}]},
                "bytecode": {"object": bytecode, "opcodes": "PUSH1 0x80 PUSH1 0x40 MSTORE", "sourceMap": "0:0:0:-"},
                "deployedBytecode": {"object": bytecode, "opcodes": "PUSH1 0x80"},
                "methodIdentifiers": method_identifiers
            },
            "ir": format!("object \"{}\" {{ code {{ }} }}", name),
            "storageLayout": {"storage": [], "types": null}
        })
    }
}

impl Compiler for MockCompiler {
    fn identity(&self) -> &CompilerIdentity {
        &self.identity
    }

    fn compile(
        &self,
        request: &RequestDocument,
        imports: &mut dyn ImportCallback,
    ) -> Result<CompilerResponse, InvocationError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(reason) = self.fail_with.lock().unwrap().clone() {
            return Err(InvocationError::Backend(reason));
        }

        let remappings: IndexMap<&str, &str> = request
            .settings
            .remappings
            .iter()
            .filter_map(|r| r.split_once('='))
            .collect();

        let mut response = CompilerResponse {
            errors: self.diagnostics.lock().unwrap().clone(),
            ..Default::default()
        };

        for (id, (path, entry)) in request.sources.iter().enumerate() {
            response
                .sources
                .insert(path.clone(), SourceOutput { id: id as u32 });

            for import in self.scanner.imports(&entry.content) {
                let key = if is_relative(&import) {
                    join_import(path, &import)
                } else {
                    import
                };
                let key = remappings.get(key.as_str()).map(|c| c.to_string()).unwrap_or(key);
                if request.sources.contains_key(&key) {
                    continue;
                }
                if let Err(message) = imports.find_import(&key) {
                    response.errors.push(ResponseError {
                        severity: "error".to_string(),
                        kind: "ParserError".to_string(),
                        component: "general".to_string(),
                        message: format!("Source \"{}\" not found: {}", key, message),
                        formatted_message: None,
                    });
                }
            }

            let constructs: IndexMap<String, Value> = self
                .scanner
                .declarations(&entry.content)
                .into_iter()
                .map(|name| {
                    let output = Self::construct_output(&name, &entry.content);
                    (name, output)
                })
                .collect();
            if !constructs.is_empty() {
                response.contracts.insert(path.clone(), constructs);
            }
        }

        Ok(response)
    }
}

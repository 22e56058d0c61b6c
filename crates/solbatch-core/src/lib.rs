pub mod artifacts;
pub mod compiler;
pub mod config;
pub mod context;
pub mod di;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod output;
pub mod request;
pub mod resolve;
pub mod scan;
pub mod source;

pub use artifacts::{BuildArtifact, ChangeDetector, Classification};
pub use compiler::{
    select_compiler, Compiler, CompilerIdentity, CompilerResponse, EmbeddedBackend, EmbeddedLoader,
    ImportCallback, InvocationError,
};
pub use config::{Backend, BuildConfig, CliOverrides, CompilationSettings, PROJECT_MANIFEST};
pub use context::BuildContext;
pub use di::Container;
pub use diagnostics::{Diagnostic, DiagnosticHandler, DiagnosticLevel};
pub use engine::{BuildEngine, BuildOutcome, BuildReport};
pub use errors::BuildError;
pub use request::RequestDocument;

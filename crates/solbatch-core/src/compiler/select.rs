use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{Backend, CompilerConfig};
use crate::errors::{BuildError, Result};

use super::{Compiler, EmbeddedCompiler, EmbeddedLoader, ProcessCompiler};

/// Pick the compiler for a run
///
/// `auto` accepts the subprocess compiler when it runs and satisfies the
/// requested version, and otherwise falls back to the embedded loader.
pub fn select_compiler(
    config: &CompilerConfig,
    loader: Option<&dyn EmbeddedLoader>,
) -> Result<Arc<dyn Compiler>> {
    let requested = config.version.as_deref();
    let unavailable = |reason: String| BuildError::CompilerUnavailable {
        version: config.version.clone(),
        reason,
    };

    match config.backend {
        Backend::Process => process(config).map_err(unavailable),
        Backend::Embedded => embedded(loader, requested).map_err(unavailable),
        Backend::Auto => match process(config) {
            Ok(compiler) => Ok(compiler),
            Err(process_reason) => {
                warn!("Subprocess compiler unusable: {}", process_reason);
                embedded(loader, requested)
                    .map_err(|embedded_reason| unavailable(format!("{}; {}", process_reason, embedded_reason)))
            }
        },
    }
}

fn process(config: &CompilerConfig) -> std::result::Result<Arc<dyn Compiler>, String> {
    let compiler = ProcessCompiler::detect(&config.binary).map_err(|e| e.to_string())?;
    let requested = config.version.as_deref();
    if !compiler.identity().matches(requested) {
        return Err(format!(
            "{:?} is version {}, not {}",
            config.binary,
            compiler.identity().version,
            requested.unwrap_or_default()
        ));
    }
    info!("Using {}", compiler.identity());
    Ok(Arc::new(compiler))
}

fn embedded(
    loader: Option<&dyn EmbeddedLoader>,
    requested: Option<&str>,
) -> std::result::Result<Arc<dyn Compiler>, String> {
    let loader = loader.ok_or_else(|| "no embedded compiler is available".to_string())?;
    let backend = loader.load(requested)?;
    let compiler = EmbeddedCompiler::new(backend);
    if !compiler.identity().matches(requested) {
        return Err(format!(
            "embedded compiler is version {}, not {}",
            compiler.identity().version,
            requested.unwrap_or_default()
        ));
    }
    info!("Using {}", compiler.identity());
    Ok(Arc::new(compiler))
}

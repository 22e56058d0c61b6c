//! Helpers for driving engine runs in tests

use solbatch_core::engine::{BuildEngine, BuildOutcome, BuildReport};
use solbatch_core::errors::BuildError;

/// Owned target list from string slices
pub fn targets(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

pub fn run(engine: &BuildEngine, paths: &[&str]) -> Result<BuildOutcome, BuildError> {
    engine.run(&targets(paths))
}

/// Run and require a compiling outcome
pub fn run_compiled(engine: &BuildEngine, paths: &[&str]) -> BuildReport {
    match run(engine, paths) {
        Ok(BuildOutcome::Compiled(report)) => report,
        Ok(other) => panic!("expected a compilation, got {:?}", other),
        Err(e) => panic!("build failed: {}", e),
    }
}

/// Run and require that nothing was compiled; returns the unchanged targets
pub fn run_nothing_to_do(engine: &BuildEngine, paths: &[&str]) -> Vec<String> {
    match run(engine, paths) {
        Ok(BuildOutcome::NothingToDo { unchanged }) => unchanged,
        Ok(other) => panic!("expected nothing to do, got {:?}", other),
        Err(e) => panic!("build failed: {}", e),
    }
}

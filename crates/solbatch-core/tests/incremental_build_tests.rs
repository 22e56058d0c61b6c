use solbatch_core::config::BuildConfig;
use solbatch_core::engine::BuildOutcome;
use solbatch_core::errors::BuildError;
use solbatch_test_helpers::fixtures::{
    lib_source, lib_source_changed, root_source, standalone_source, TestProject,
};
use solbatch_test_helpers::mocks::MockCompiler;
use solbatch_test_helpers::run::{run, run_compiled, run_nothing_to_do};

const ROOT: &str = "contracts/Root.sol";
const LIB: &str = "contracts/Lib.sol";

fn root_lib_project() -> TestProject {
    let project = TestProject::new();
    project
        .write(ROOT, root_source())
        .write(LIB, lib_source());
    project
}

// ============================================================================
// FULL INCREMENTAL CYCLE
// ============================================================================

#[test]
fn test_root_lib_three_runs() {
    let project = root_lib_project();
    let compiler = MockCompiler::new("0.8.19");
    let engine = project.engine(BuildConfig::default(), compiler.clone());

    // First run compiles everything
    let report = run_compiled(&engine, &[ROOT, LIB]);
    assert_eq!(report.compiled, vec![ROOT, LIB]);
    assert!(report.unchanged.is_empty());
    assert!(project.has_artifact("Root"));
    assert!(project.has_artifact("Lib"));
    assert_eq!(compiler.invocations(), 1);

    // Second run finds nothing to do and never calls the compiler
    let unchanged = run_nothing_to_do(&engine, &[ROOT, LIB]);
    assert_eq!(unchanged, vec![ROOT, LIB]);
    assert_eq!(compiler.invocations(), 1);

    // Changing the library dirties both the library and its importer
    project.write(LIB, lib_source_changed());
    let report = run_compiled(&engine, &[ROOT, LIB]);
    assert_eq!(report.compiled, vec![ROOT, LIB]);
    assert_eq!(compiler.invocations(), 2);

    let root = project.artifact("Root");
    assert_eq!(root.sources.len(), 2);
    assert_eq!(
        root.sources[LIB].keccak256,
        solbatch_core::artifacts::fingerprint(lib_source_changed())
    );
}

#[test]
fn test_one_level_deep_change_dirties_root() {
    let project = root_lib_project();
    let compiler = MockCompiler::new("0.8.19");
    let engine = project.engine(BuildConfig::default(), compiler.clone());

    run_compiled(&engine, &[ROOT]);
    run_nothing_to_do(&engine, &[ROOT]);

    project.write(LIB, lib_source_changed());
    let report = run_compiled(&engine, &[ROOT]);

    assert_eq!(report.compiled, vec![ROOT]);
    assert_eq!(compiler.invocations(), 2);
    // Lib is only a dependency: it has no artifact of its own
    assert!(!project.has_artifact("Lib"));
}

#[test]
fn test_unchanged_target_is_pruned_from_request() {
    let project = root_lib_project();
    project.write("contracts/Other.sol", &standalone_source("Other"));
    let compiler = MockCompiler::new("0.8.19");
    let engine = project.engine(BuildConfig::default(), compiler.clone());
    let targets = [ROOT, "contracts/Other.sol"];

    run_compiled(&engine, &targets);
    project.write(
        "contracts/Other.sol",
        &standalone_source("Other").replace("{}", "{ }"),
    );
    let report = run_compiled(&engine, &targets);

    assert_eq!(report.compiled, vec!["contracts/Other.sol"]);
    assert_eq!(report.unchanged, vec![ROOT]);
    let request = compiler.last_request().unwrap();
    let sources: Vec<_> = request.sources.keys().cloned().collect();
    assert_eq!(sources, vec!["contracts/Other.sol"]);
    assert_eq!(report.request_sources, sources);
}

#[test]
fn test_file_without_constructs_always_recompiles() {
    let project = TestProject::new();
    project.write(
        "contracts/Constants.sol",
        "pragma solidity ^0.8.0;\n\nuint256 constant ANSWER = 42;\n",
    );
    let compiler = MockCompiler::new("0.8.19");
    let engine = project.engine(BuildConfig::default(), compiler.clone());

    run_compiled(&engine, &["contracts/Constants.sol"]);
    run_compiled(&engine, &["contracts/Constants.sol"]);

    assert_eq!(compiler.invocations(), 2);
}

#[test]
fn test_compact_import_is_tracked() {
    let project = TestProject::new();
    project
        .write("contracts/A.sol", "import{X}from\"./X.sol\";\ncontract A {}\n")
        .write("contracts/X.sol", "library X {}\n");
    let compiler = MockCompiler::new("0.8.19");
    let engine = project.engine(BuildConfig::default(), compiler.clone());

    let report = run_compiled(&engine, &["contracts/A.sol"]);
    assert_eq!(report.request_sources, vec!["contracts/X.sol", "contracts/A.sol"]);
    assert!(project
        .read("build/flattened/contracts/A.sol")
        .contains("library X"));

    project.write("contracts/X.sol", "library X { }\n");
    let report = run_compiled(&engine, &["contracts/A.sol"]);

    assert_eq!(report.compiled, vec!["contracts/A.sol"]);
    assert_eq!(compiler.invocations(), 2);
}

// ============================================================================
// INVALIDATION TRIGGERS
// ============================================================================

#[test]
fn test_compiler_version_change_recompiles() {
    let project = root_lib_project();
    let engine = project.engine(BuildConfig::default(), MockCompiler::new("0.8.19"));
    run_compiled(&engine, &[ROOT]);

    let newer = MockCompiler::new("0.8.20");
    let engine = project.engine(BuildConfig::default(), newer.clone());
    run_compiled(&engine, &[ROOT]);

    assert_eq!(newer.invocations(), 1);
    assert_eq!(project.artifact("Root").compiler.version, "0.8.20");
}

#[test]
fn test_settings_change_recompiles() {
    let project = root_lib_project();
    let compiler = MockCompiler::new("0.8.19");
    run_compiled(
        &project.engine(BuildConfig::default(), compiler.clone()),
        &[ROOT],
    );

    let mut optimized = BuildConfig::default();
    optimized.settings.optimizer.enabled = true;
    let engine = project.engine(optimized, compiler.clone());

    run_compiled(&engine, &[ROOT]);
    run_nothing_to_do(&engine, &[ROOT]);
    assert_eq!(compiler.invocations(), 2);
}

#[test]
fn test_force_skips_change_detection() {
    let project = root_lib_project();
    let compiler = MockCompiler::new("0.8.19");
    run_compiled(
        &project.engine(BuildConfig::default(), compiler.clone()),
        &[ROOT],
    );

    let mut config = BuildConfig::default();
    config.force = true;
    let report = run_compiled(&project.engine(config, compiler.clone()), &[ROOT]);

    assert_eq!(report.compiled, vec![ROOT]);
    assert_eq!(compiler.invocations(), 2);
}

#[test]
fn test_corrupt_artifact_triggers_rebuild() {
    let project = root_lib_project();
    let compiler = MockCompiler::new("0.8.19");
    let engine = project.engine(BuildConfig::default(), compiler.clone());
    run_compiled(&engine, &[ROOT]);

    project.write("build/contracts/Root.json", "{ \"contractName\": ");
    run_compiled(&engine, &[ROOT]);

    assert_eq!(compiler.invocations(), 2);
    assert_eq!(project.artifact("Root").contract_name, "Root");
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn test_cycle_is_reported_without_compiling() {
    let project = TestProject::new();
    project
        .write("contracts/A.sol", "import \"./B.sol\";\ncontract A {}\n")
        .write("contracts/B.sol", "import \"./A.sol\";\ncontract B {}\n");
    let compiler = MockCompiler::new("0.8.19");
    let engine = project.engine(BuildConfig::default(), compiler.clone());

    let err = run(&engine, &["contracts/A.sol"]).unwrap_err();

    match err {
        BuildError::DependencyCycle { cycle } => {
            assert_eq!(
                cycle,
                vec!["contracts/A.sol", "contracts/B.sol", "contracts/A.sol"]
            );
        }
        other => panic!("expected a cycle, got {}", other),
    }
    assert_eq!(compiler.invocations(), 0);
}

#[test]
fn test_unresolved_import_names_the_import() {
    let project = TestProject::new();
    project.write(
        "contracts/A.sol",
        "import \"@missing/token/ERC20.sol\";\ncontract A {}\n",
    );
    let engine = project.engine(BuildConfig::default(), MockCompiler::new("0.8.19"));

    let err = run(&engine, &["contracts/A.sol"]).unwrap_err();

    assert!(matches!(err, BuildError::UnresolvedImport { .. }));
    assert!(err.to_string().contains("@missing/token/ERC20.sol"));
}

#[test]
fn test_compilation_error_aborts_all_writes() {
    let project = root_lib_project();
    let compiler = MockCompiler::new("0.8.19");
    compiler.add_diagnostic("error", "TypeError", "Undeclared identifier");
    let engine = project.engine(BuildConfig::default(), compiler.clone());

    let err = run(&engine, &[ROOT]).unwrap_err();

    assert_eq!(err.diagnostics().len(), 1);
    assert_eq!(err.diagnostics()[0].kind, "TypeError");
    assert!(!project.has_artifact("Root"));
    assert!(!project.exists("build/flattened/contracts/Root.sol"));
    // The request is written before invocation for inspection
    assert!(project.exists("build/solc-input.json"));
}

#[test]
fn test_warnings_do_not_abort() {
    let project = root_lib_project();
    let compiler = MockCompiler::new("0.8.19");
    compiler.add_diagnostic("warning", "Warning", "Function state mutability can be restricted");
    let engine = project.engine(BuildConfig::default(), compiler.clone());

    let report = run_compiled(&engine, &[ROOT]);

    assert_eq!(report.warnings.len(), 1);
    assert!(project.has_artifact("Root"));
}

#[test]
fn test_invocation_failure_is_not_nothing_to_do() {
    let project = root_lib_project();
    let compiler = MockCompiler::new("0.8.19");
    compiler.fail_invocations("compiler crashed");
    let engine = project.engine(BuildConfig::default(), compiler.clone());

    let result = run(&engine, &[ROOT]);

    assert!(matches!(result, Err(BuildError::CompilerInvocation(_))));
    assert!(!matches!(result, Ok(BuildOutcome::NothingToDo { .. })));
}

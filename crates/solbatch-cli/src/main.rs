use anyhow::Context;
use clap::Parser;
use solbatch_core::config::{Backend, BuildConfig, CliOverrides, PROJECT_MANIFEST};
use solbatch_core::di::Container;
use solbatch_core::engine::BuildOutcome;
use solbatch_core::fs::RealFileSystem;
use solbatch_core::resolve::find_project_root;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// solbatch - incremental batch builds for Solidity contracts
#[derive(Parser, Debug, Clone)]
#[command(name = "solbatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Target files to build (default: the `include` patterns)
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Path to the solbatch.yaml configuration file
    #[arg(short, long, value_name = "FILE")]
    project: Option<PathBuf>,

    /// Directory for per-contract artifacts
    #[arg(long, value_name = "DIR")]
    artifacts_dir: Option<PathBuf>,

    /// Directory for flattened sources
    #[arg(long, value_name = "DIR")]
    flat_dir: Option<PathBuf>,

    /// Required compiler version, e.g. 0.8.19
    #[arg(long, value_name = "VERSION")]
    compiler_version: Option<String>,

    /// Compiler executable for the process backend
    #[arg(long, value_name = "PATH")]
    solc: Option<PathBuf>,

    /// Compiler backend (auto, process, embedded)
    #[arg(long, value_name = "BACKEND", value_parser = parse_backend)]
    backend: Option<Backend>,

    /// Recompile every target regardless of stored artifacts
    #[arg(short, long)]
    force: bool,

    /// Annotate flattened files even when they hold a single source
    #[arg(long)]
    annotate: bool,

    /// Where to write the compiler request before invocation
    #[arg(long, value_name = "FILE")]
    debug_request: Option<PathBuf>,

    /// Rebuild when sources change
    #[arg(short, long)]
    watch: bool,

    /// Initialize a new solbatch project
    #[arg(long)]
    init: bool,

    /// Pretty print diagnostics (`--pretty=false` for plain output)
    #[arg(
        long,
        default_value_t = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG=debug for per-file logs
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    if cli.init {
        return init_project();
    }

    let (config, base_dir) = load_config(&cli)?;
    let targets = resolve_targets(&cli, &config, &base_dir)?;
    if targets.is_empty() {
        eprintln!("Error: No target files found. Use --help for usage information.");
        std::process::exit(1);
    }

    info!("Project directory: {}", base_dir.display());
    info!("Targets: {} file(s)", targets.len());
    debug!("Watch mode: {}", cli.watch);

    let container = Container::new(config, base_dir, cli.pretty);

    if cli.watch {
        watch_mode(&container, &targets)
    } else {
        if !build(&container, &targets) {
            std::process::exit(1);
        }
        Ok(())
    }
}

fn parse_backend(value: &str) -> Result<Backend, String> {
    match value {
        "auto" => Ok(Backend::Auto),
        "process" => Ok(Backend::Process),
        "embedded" => Ok(Backend::Embedded),
        other => Err(format!(
            "invalid backend '{}'. Supported backends: auto, process, embedded",
            other
        )),
    }
}

/// Initialize a new project in the current directory
fn init_project() -> anyhow::Result<()> {
    println!("Initializing new solbatch project...");

    let manifest = PathBuf::from(PROJECT_MANIFEST);
    if manifest.exists() {
        anyhow::bail!("{} already exists", PROJECT_MANIFEST);
    }
    BuildConfig::init_file(&manifest)
        .with_context(|| format!("Failed to write {}", PROJECT_MANIFEST))?;
    println!("Created {}", PROJECT_MANIFEST);

    std::fs::create_dir_all("contracts").context("Failed to create contracts/")?;
    println!("Created contracts/ directory");

    println!("\nProject initialized successfully!");
    println!("Add sources under contracts/ and run 'solbatch' to build them.");
    Ok(())
}

/// Load the configuration and determine the project base directory
///
/// An explicit `--project` file wins; otherwise the nearest ancestor of the
/// working directory holding a manifest is used, falling back to defaults.
fn load_config(cli: &Cli) -> anyhow::Result<(BuildConfig, PathBuf)> {
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;

    let (mut config, base_dir) = match &cli.project {
        Some(path) => {
            let path = cwd.join(path);
            let config = BuildConfig::from_file(&path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?;
            let base_dir = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
            (config, base_dir)
        }
        None => {
            let root = find_project_root(&RealFileSystem::new(), &cwd, PROJECT_MANIFEST);
            let manifest = root.join(PROJECT_MANIFEST);
            if manifest.is_file() {
                let config = BuildConfig::from_file(&manifest)
                    .with_context(|| format!("Failed to load {}", manifest.display()))?;
                (config, root)
            } else {
                (BuildConfig::default(), cwd)
            }
        }
    };

    let overrides = CliOverrides {
        artifacts_dir: cli.artifacts_dir.clone(),
        flat_dir: cli.flat_dir.clone(),
        debug_request: cli.debug_request.clone(),
        compiler_version: cli.compiler_version.clone(),
        compiler_binary: cli.solc.clone(),
        backend: cli.backend,
        force: cli.force.then_some(true),
        always_annotate: cli.annotate.then_some(true),
    };
    config.merge(&overrides);

    Ok((config, base_dir))
}

/// Targets from the command line, or every file matching `include`
fn resolve_targets(cli: &Cli, config: &BuildConfig, base_dir: &Path) -> anyhow::Result<Vec<String>> {
    if !cli.files.is_empty() {
        let cwd = std::env::current_dir().context("Failed to read the working directory")?;
        return Ok(cli
            .files
            .iter()
            .map(|file| cwd.join(file).to_string_lossy().into_owned())
            .collect());
    }
    discover_targets(config, base_dir)
}

fn discover_targets(config: &BuildConfig, base_dir: &Path) -> anyhow::Result<Vec<String>> {
    use walkdir::WalkDir;

    let patterns = config
        .include
        .iter()
        .map(|p| glob::Pattern::new(p).with_context(|| format!("Invalid include pattern '{}'", p)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut targets = Vec::new();
    for entry in WalkDir::new(base_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let Ok(relative) = entry.path().strip_prefix(base_dir) else {
            continue;
        };
        let key = relative.to_string_lossy().replace('\\', "/");
        if patterns.iter().any(|p| p.matches(&key)) {
            targets.push(key);
        }
    }

    debug!("Discovered {} target(s)", targets.len());
    Ok(targets)
}

/// Run one build; returns false when it failed
fn build(container: &Container, targets: &[String]) -> bool {
    let engine = container.build_engine();
    match engine.run(targets) {
        Ok(BuildOutcome::NothingToDo { unchanged }) => {
            info!("{} target(s) up to date", unchanged.len());
            println!("Nothing to compile");
            true
        }
        Ok(BuildOutcome::Compiled(report)) => {
            info!(
                "Compiled {} target(s) with {}, {} unchanged",
                report.compiled.len(),
                report.compiler,
                report.unchanged.len()
            );
            for path in &report.artifacts {
                debug!("Wrote {}", path.display());
            }
            println!(
                "Compiled {} file(s), wrote {} artifact(s)",
                report.compiled.len(),
                report.artifacts.len()
            );
            true
        }
        Err(err) => {
            // Compiler diagnostics were already printed by the handler
            eprintln!("Error: {}", err);
            false
        }
    }
}

/// Watch mode - rebuild on source changes
fn watch_mode(container: &Container, targets: &[String]) -> anyhow::Result<()> {
    use notify::{
        event::{EventKind, ModifyKind},
        Event, RecursiveMode, Watcher,
    };
    use std::sync::mpsc::channel;
    use std::time::{Duration, Instant};

    println!("Watching for changes... (Press Ctrl+C to stop)");
    println!("\nInitial build:");
    build(container, targets);

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;
    watcher
        .watch(container.base_dir(), RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", container.base_dir().display()))?;

    let config = container.config();
    let output_dirs: Vec<PathBuf> = [&config.artifacts_dir, &config.flat_dir]
        .into_iter()
        .map(|dir| container.base_dir().join(dir))
        .collect();
    let extension = config.source_extension.clone();

    let mut last_build = Instant::now();
    let debounce_duration = Duration::from_millis(100);

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                let should_rebuild = matches!(
                    event.kind,
                    EventKind::Modify(ModifyKind::Data(_)) | EventKind::Create(_)
                );
                if !should_rebuild {
                    continue;
                }

                let touched_source = event.paths.iter().any(|path| {
                    path.extension().map(|e| e == extension.as_str()).unwrap_or(false)
                        && !output_dirs.iter().any(|dir| path.starts_with(dir))
                });

                if touched_source {
                    let now = Instant::now();
                    if now.duration_since(last_build) >= debounce_duration {
                        println!("\n\nSource changed, rebuilding...");
                        build(container, targets);
                        last_build = now;
                    }
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                return Err(anyhow::anyhow!("File watcher disconnected"));
            }
        }
    }
}

mod config;
mod global_args;
mod walk;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{CliPresence, FileConfig};
use global_args::{init_tracing, pb_spinner, print_output, GlobalArgs};
use index_core::Options;
use serde::Serialize;
use shard_builder::{Builder, FsShardMetadataSource, NullCompoundShardHandle};

#[derive(Parser)]
#[command(name = "zoekt-index", about = "Build and inspect zoekt-style search shards")]
struct Cli {
    #[command(flatten)]
    globals: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or rebuild) shards for a repository from a directory on disk.
    Build(BuildArgs),
    /// Report what a build would need to do without doing it.
    State(StateArgs),
    /// Run the document classification policy over a directory without
    /// writing any shards.
    Classify(ClassifyArgs),
    /// Show the tail of the shard-activity log.
    LogTail(LogTailArgs),
    /// Remove leftover `*.tmp` files from a previous aborted build.
    Sweep(SweepArgs),
}

#[derive(clap::Args)]
struct RepoArgs {
    /// Directory to walk for documents.
    source: PathBuf,

    /// Where shards are written.
    #[arg(long)]
    index_dir: Option<PathBuf>,

    /// Name of the repository being indexed.
    #[arg(long)]
    repo_name: Option<String>,

    #[arg(long)]
    repo_url: Option<String>,

    #[arg(long, default_value = "main")]
    branch: String,

    #[arg(long)]
    size_max: Option<usize>,

    #[arg(long)]
    trigram_max: Option<usize>,

    #[arg(long)]
    shard_max: Option<u64>,

    #[arg(long)]
    parallelism: Option<usize>,

    #[arg(long = "large-file")]
    large_files: Vec<String>,

    #[arg(long)]
    ctags_path: Option<PathBuf>,

    #[arg(long, action = clap::ArgAction::SetTrue)]
    ctags_must_succeed: bool,

    #[arg(long, action = clap::ArgAction::SetTrue)]
    disable_ctags: bool,
}

#[derive(clap::Args)]
struct BuildArgs {
    #[command(flatten)]
    repo: RepoArgs,

    #[arg(long, action = clap::ArgAction::SetTrue)]
    delta: bool,

    #[arg(long = "changed", value_name = "PATH")]
    changed_or_removed_files: Vec<String>,
}

#[derive(clap::Args)]
struct StateArgs {
    #[command(flatten)]
    repo: RepoArgs,

    #[arg(long, action = clap::ArgAction::SetTrue)]
    delta: bool,
}

#[derive(clap::Args)]
struct ClassifyArgs {
    #[command(flatten)]
    repo: RepoArgs,
}

#[derive(clap::Args)]
struct LogTailArgs {
    #[arg(long)]
    index_dir: PathBuf,

    #[arg(long, default_value_t = 20)]
    lines: usize,
}

#[derive(clap::Args)]
struct SweepArgs {
    #[arg(long)]
    index_dir: PathBuf,
}

/// Merge CLI flags, an optional TOML config file, and `Options::apply_defaults`
/// into a single ready-to-use `Options`.
fn resolve_options(repo: &RepoArgs, config_path: Option<&str>) -> Result<Options> {
    let mut options = Options::default();
    let mut presence = CliPresence::default();

    if let Some(path) = &repo.index_dir {
        options.index_dir = path.clone();
        presence.index_dir = true;
    }
    if let Some(name) = &repo.repo_name {
        options.repository_description.name = name.clone();
        presence.repository_name = true;
    }
    if let Some(url) = &repo.repo_url {
        options.repository_description.url = url.clone();
        presence.repository_url = true;
    }
    if let Some(v) = repo.size_max {
        options.size_max = v;
        presence.size_max = true;
    }
    if let Some(v) = repo.trigram_max {
        options.trigram_max = v;
        presence.trigram_max = true;
    }
    if let Some(v) = repo.shard_max {
        options.shard_max = v;
        presence.shard_max = true;
    }
    if let Some(v) = repo.parallelism {
        options.parallelism = v;
        presence.parallelism = true;
    }
    if !repo.large_files.is_empty() {
        options.large_files = repo.large_files.clone();
        presence.large_files = true;
    }
    if let Some(v) = &repo.ctags_path {
        options.ctags_path = Some(v.clone());
        presence.ctags_path = true;
    }
    if repo.ctags_must_succeed {
        options.ctags_must_succeed = true;
        presence.ctags_must_succeed = true;
    }
    if repo.disable_ctags {
        options.disable_ctags = true;
        presence.disable_ctags = true;
    }

    if let Some(path) = config_path {
        let file_config = FileConfig::load(std::path::Path::new(path))?;
        file_config.apply_to(&mut options, &presence);
    }

    options.apply_defaults();
    Ok(options)
}

#[derive(Serialize)]
struct BuildReport {
    repository: String,
    run_id_prefix_ms: i64,
    shard_max: String,
}

async fn cmd_build(args: BuildArgs, globals: &GlobalArgs) -> Result<()> {
    let mut options = resolve_options(&args.repo, globals.config.as_deref())?;
    options.is_delta = args.delta;
    options.changed_or_removed_files = args.changed_or_removed_files.clone();
    options.apply_defaults();

    shard_fs::sweep_stale_temp_files(&options.index_dir)
        .with_context(|| format!("sweeping stale temp files under {}", options.index_dir.display()))?;

    let spinner = pb_spinner(!globals.no_progress && !globals.quiet, "walking source tree");
    let documents = walk::collect_documents(&args.repo.source, &args.repo.branch)?;
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    tracing::info!(
        documents = documents.len(),
        shard_max = %bytesize::ByteSize(options.shard_max),
        "starting build"
    );

    let repo_name = options.repository_description.name.clone();
    let shard_max_human = bytesize::ByteSize(options.shard_max).to_string();
    let mut builder = Builder::new(options, Arc::new(NullCompoundShardHandle))?;
    for doc in documents {
        builder.add(doc);
    }
    builder.finish().await?;

    print_output(
        globals.json,
        &BuildReport { repository: repo_name, run_id_prefix_ms: chrono::Utc::now().timestamp_millis(), shard_max: shard_max_human },
    )
}

#[derive(Serialize)]
struct StateReport {
    state: String,
    incremental_skip_indexing: bool,
}

async fn cmd_state(args: StateArgs, globals: &GlobalArgs) -> Result<()> {
    let mut options = resolve_options(&args.repo, globals.config.as_deref())?;
    options.is_delta = args.delta;
    options.repository_description.index_options = index_core::hash_options(&options);

    let source = FsShardMetadataSource::new(options.index_dir.clone(), Arc::new(NullCompoundShardHandle));
    let state = index_core::classify(&source, &options);

    print_output(
        globals.json,
        &StateReport { state: state.as_str().to_string(), incremental_skip_indexing: state.incremental_skip_indexing() },
    )
}

#[derive(Serialize)]
struct ClassifyEntry {
    name: String,
    skip_reason: Option<String>,
    language: Option<String>,
    accounted_size: usize,
}

#[derive(Serialize)]
struct ClassifyReport {
    total: usize,
    skipped: usize,
    entries: Vec<ClassifyEntry>,
}

async fn cmd_classify(args: ClassifyArgs, globals: &GlobalArgs) -> Result<()> {
    let options = resolve_options(&args.repo, globals.config.as_deref())?;
    let documents = walk::collect_documents(&args.repo.source, &args.repo.branch)?;

    let mut entries = Vec::with_capacity(documents.len());
    let mut skipped = 0usize;
    for mut doc in documents {
        let size = shard_builder::classify::classify_and_accumulate(
            &mut doc,
            &options.large_files,
            options.size_max,
            options.trigram_max,
        );
        if doc.skip_reason.is_some() {
            skipped += 1;
        }
        entries.push(ClassifyEntry {
            name: doc.name,
            skip_reason: doc.skip_reason,
            language: doc.language,
            accounted_size: size,
        });
    }

    print_output(globals.json, &ClassifyReport { total: entries.len(), skipped, entries })
}

async fn cmd_log_tail(args: LogTailArgs) -> Result<()> {
    let path = args.index_dir.join("zoekt-builder-shard-log.tsv");
    let contents = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let lines: Vec<&str> = contents.lines().collect();
    let start = lines.len().saturating_sub(args.lines);
    for line in &lines[start..] {
        println!("{line}");
    }
    Ok(())
}

async fn cmd_sweep(args: SweepArgs) -> Result<()> {
    let removed = shard_fs::sweep_stale_temp_files(&args.index_dir)?;
    println!("removed {removed} stale temp file(s)");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.globals.quiet, cli.globals.json)?;

    match cli.command {
        Commands::Build(args) => cmd_build(args, &cli.globals).await,
        Commands::State(args) => cmd_state(args, &cli.globals).await,
        Commands::Classify(args) => cmd_classify(args, &cli.globals).await,
        Commands::LogTail(args) => cmd_log_tail(args).await,
        Commands::Sweep(args) => cmd_sweep(args).await,
    }
}

use std::time::Duration;

use anyhow::Result;
use clap::{ArgAction, Args};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::level_filters::LevelFilter;

/// Flags shared by every subcommand, flattened into `Cli` the way the
/// teacher's `cli_core::GlobalArgs` is flattened into its own top-level
/// parser.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub json: bool,

    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub quiet: bool,

    #[arg(long = "no-progress", global = true, action = ArgAction::SetTrue)]
    pub no_progress: bool,

    /// Path to a TOML file providing defaults for `Options`. Flags passed on
    /// the command line override whatever the file sets.
    #[arg(long, global = true)]
    pub config: Option<String>,
}

pub fn init_tracing(is_quiet: bool, as_json: bool) -> Result<()> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(env_filter);
    if as_json {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .with_ansi(false)
            .with_target(false)
            .with_current_span(false)
            .with_span_list(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    } else if !is_quiet {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .init();
    }
    Ok(())
}

pub fn pb_spinner(enabled: bool, message: &str) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠁", "⠂", "⠄", "⡀", "⢀", "⠠", "⠐", "⠈"]),
    );
    pb.set_message(message.to_string());
    Some(pb)
}

pub fn print_output<T: Serialize>(_json: bool, value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use courtportal_cli::cli::{
    cmd_metrics, cmd_notifications, cmd_policy, cmd_processes, cmd_run, cmd_status, cmd_sync,
    init_logging, load_policy, state_dir, Commands,
};
use courtportal_cli::{AppContext, TracingDisplay};
use courtportal_core_types::SystemClock;
use courtportal_event_bus::CrossInstanceChannel;
use courtportal_state_center::FileSlot;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("PORTAL_GIT_HASH"),
    ", built ",
    env!("PORTAL_BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "courtportal", version, long_version = LONG_VERSION, about)]
struct Cli {
    /// Policy file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the persisted portal state
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Policy override as section.key=value (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json)?;

    let loaded = load_policy(cli.config.as_ref(), &cli.overrides)?;
    if let Commands::Policy = cli.command {
        return cmd_policy(&loaded);
    }

    let policy = loaded.policy;
    let dir = state_dir(cli.state_dir, &policy)?;
    let storage = FileSlot::new(&dir)
        .with_context(|| format!("Failed to open state directory {}", dir.display()))?;
    let channel = CrossInstanceChannel::new(policy.channel.capacity);
    let ctx = AppContext::new(
        policy,
        storage,
        channel,
        SystemClock::shared(),
        Some(TracingDisplay::shared()),
    )
    .context("Failed to build portal context")?;

    let outcome = match cli.command {
        Commands::Run(args) => cmd_run(&ctx, args).await,
        Commands::Sync => cmd_sync(&ctx),
        Commands::Status => cmd_status(&ctx),
        Commands::Processes(args) => cmd_processes(&ctx, args),
        Commands::Notifications(args) => cmd_notifications(&ctx, args),
        Commands::Metrics => cmd_metrics(&ctx),
        Commands::Policy => Ok(()),
    };

    ctx.shutdown().await.context("Failed to shut down cleanly")?;
    outcome
}

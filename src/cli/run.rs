use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::info;

use courtportal_scheduler::TickReport;

use super::commands::RunArgs;
use crate::app_context::AppContext;

/// Drives sync ticks until the tick budget is spent or Ctrl-C arrives.
/// Each tick report is printed as one JSON line.
pub async fn cmd_run(ctx: &AppContext, args: RunArgs) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    ctx.sync().add_hook(Arc::new(move |report: &TickReport| {
        let _ = tx.send(report.clone());
    }));
    ctx.start_sync()
        .await
        .context("Failed to start sync driver")?;
    info!(
        period_secs = ctx.policy().sync.interval_secs,
        "sync driver running; press Ctrl-C to stop"
    );

    let mut seen = 0u64;
    loop {
        tokio::select! {
            report = rx.recv() => {
                let Some(report) = report else { break };
                println!("{}", serde_json::to_string(&report)?);
                seen += 1;
                if args.ticks.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            result = signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("interrupt received");
                break;
            }
        }
    }

    ctx.stop_sync().await;
    Ok(())
}

pub fn cmd_sync(ctx: &AppContext) -> Result<()> {
    let report = ctx.force_sync().context("Sync tick failed")?;
    ctx.save().context("Failed to save portal state")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

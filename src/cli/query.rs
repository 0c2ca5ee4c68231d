use anyhow::Result;
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;

use courtportal_core_types::UserId;
use courtportal_registry::{register_metrics, ProcessFilter};
use courtportal_scheduler::metrics as sync_metrics;

use super::commands::{NotificationsArgs, ProcessesArgs};
use crate::app_context::AppContext;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn cmd_status(ctx: &AppContext) -> Result<()> {
    print_json(&ctx.stats())
}

pub fn cmd_processes(ctx: &AppContext, args: ProcessesArgs) -> Result<()> {
    let filter = ProcessFilter {
        status: args.status.map(Into::into),
        assigned_judge: args.judge.map(UserId::from),
    };
    print_json(&ctx.registry().processes(&filter))
}

pub fn cmd_notifications(ctx: &AppContext, args: NotificationsArgs) -> Result<()> {
    let user = args.user.map(UserId::from);
    print_json(&ctx.registry().notifications_for(user.as_ref()))
}

pub fn cmd_metrics(ctx: &AppContext) -> Result<()> {
    let registry = prometheus::Registry::new();
    register_metrics(&registry);
    ctx.registry().refresh_stats();

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    print!("{}", String::from_utf8(buffer)?);

    let counters = sync_metrics::snapshot();
    println!("courtportal_sync_ticks_total {}", counters.ticks);
    println!("courtportal_sync_skipped_ticks_total {}", counters.skipped_ticks);
    println!("courtportal_sync_assigned_total {}", counters.assigned);
    Ok(())
}

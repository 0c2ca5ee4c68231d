use clap::{Args, Subcommand, ValueEnum};

use courtportal_registry::ProcessStatus;

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the periodic sync driver
    Run(RunArgs),

    /// Run one sync tick now and save the state
    Sync,

    /// Print the portal counters as JSON
    Status,

    /// List processes as JSON
    Processes(ProcessesArgs),

    /// List the notifications a user can see
    Notifications(NotificationsArgs),

    /// Show the effective policy and where each value came from
    Policy,

    /// Print metrics in the prometheus text format
    Metrics,
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Stop after this many ticks instead of waiting for Ctrl-C
    #[arg(long)]
    pub ticks: Option<u64>,
}

#[derive(Args, Clone, Debug)]
pub struct ProcessesArgs {
    /// Only processes in this status
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    /// Only processes assigned to this judge id
    #[arg(long)]
    pub judge: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct NotificationsArgs {
    /// Apply this user's visibility rules; omit for the whole log
    #[arg(long)]
    pub user: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StatusArg {
    Pending,
    InProgress,
    Concluded,
}

impl From<StatusArg> for ProcessStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Pending => ProcessStatus::Pending,
            StatusArg::InProgress => ProcessStatus::InProgress,
            StatusArg::Concluded => ProcessStatus::Concluded,
        }
    }
}

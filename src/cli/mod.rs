pub mod commands;
pub mod policy;
pub mod query;
pub mod run;
pub mod runtime;

pub use commands::{Commands, NotificationsArgs, ProcessesArgs, RunArgs, StatusArg};
pub use policy::cmd_policy;
pub use query::{cmd_metrics, cmd_notifications, cmd_processes, cmd_status};
pub use run::{cmd_run, cmd_sync};
pub use runtime::{init_logging, load_policy, state_dir, LoadedPolicy};

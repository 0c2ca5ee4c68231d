pub mod distribution;
pub mod driver;
pub mod error;
pub mod metrics;
pub mod model;
pub mod sync;

pub use distribution::AutoDistributor;
pub use driver::SyncDriver;
pub use error::SchedulerError;
pub use model::{Assignment, DriverState, TickReport};
pub use sync::{AfterTickHook, PortalSync};

#[cfg(test)]
pub(crate) mod testing;

pub mod defaults;
pub mod errors;
pub mod loader;
pub mod model;
pub mod overlay;

pub use defaults::default_policy;
pub use errors::PolicyError;
pub use loader::{load_policy, load_policy_with_options, LoadOptions};
pub use model::{
    ChannelPolicy, DistributionPolicy, NotificationPolicy, PortalPolicy, PolicySource,
    StoragePolicy, SyncPolicy,
};
pub use overlay::apply_override;

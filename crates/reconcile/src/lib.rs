mod cycle;
mod error;
mod file_provider;
mod normalize;
mod notify;
mod planner;
mod presence;
mod provider;
mod types;

pub use cycle::{refresh_device, refresh_tracked_devices};
pub use error::{EngineError, NotifyError, ProviderError, Result};
pub use file_provider::{JsonFileConnector, JsonFileProvider};
pub use normalize::{
    RawClient, RawNetworkDevice, attachment_names, descriptor_from_raw, snapshot_from_raw,
};
pub use notify::{DeviceUpdate, Dispatcher, LogNotifier, Notifier};
pub use planner::{DevicePlan, PlanInput, Transition, plan_device};
pub use presence::{PresenceSlot, aggregate_hourly_presence, next_hour_boundary};
pub use provider::{ClientSnapshot, ProviderConnector, ProviderSession, SnapshotProvider};
pub use types::CycleReport;

use crate::error::Result;
use crate::services::{SharedConfig, open_db};
use stalker_core::SystemStatus;

#[derive(Clone)]
pub struct StatusService {
    config: SharedConfig,
}

impl StatusService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    pub fn snapshot(&self) -> Result<SystemStatus> {
        let db = open_db(&self.config)?;
        Ok(SystemStatus {
            last_refresh: db.last_refresh()?,
            tracked_devices: db.count_devices()?,
            connected_devices: db.count_connected_devices()?,
            refresh_interval_seconds: self.config.refresh_interval.as_secs(),
        })
    }
}

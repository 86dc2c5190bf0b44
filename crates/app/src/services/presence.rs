use crate::error::Result;
use crate::services::{SharedConfig, open_db, require_device};
use stalker_core::OccupancyGrid;

#[derive(Clone)]
pub struct PresenceService {
    config: SharedConfig,
}

impl PresenceService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    pub fn heatmap(&self, mac: &str) -> Result<OccupancyGrid> {
        let db = open_db(&self.config)?;
        let device = require_device(&db, mac)?;
        let buckets = db.presence_buckets(device.id)?;
        Ok(OccupancyGrid::from_buckets(device.id, &buckets))
    }
}

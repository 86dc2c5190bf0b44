use crate::error::{AppError, Result};
use crate::services::{SharedConfig, open_db, parse_mac, require_device};
use stalker_core::{ConnectionInterval, NewTrackedDevice, TrackedDevice};
use stalker_db::Db;

#[derive(Clone)]
pub struct DevicesService {
    config: SharedConfig,
}

impl DevicesService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    pub fn list(&self) -> Result<Vec<TrackedDevice>> {
        let db = self.db()?;
        Ok(db.list_devices()?)
    }

    pub fn get(&self, mac: &str) -> Result<TrackedDevice> {
        let db = self.db()?;
        require_device(&db, mac)
    }

    /// Starts tracking `mac`. The site defaults to the configured one.
    pub fn track(
        &self,
        mac: &str,
        friendly_name: Option<&str>,
        site_id: Option<&str>,
    ) -> Result<TrackedDevice> {
        let mac_address = parse_mac(mac)?;
        let db = self.db()?;
        if db.get_device_by_mac(&mac_address)?.is_some() {
            return Err(AppError::InvalidInput(format!(
                "device {mac_address} is already tracked"
            )));
        }
        let friendly_name = friendly_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let site_id = site_id
            .map(str::trim)
            .filter(|site| !site.is_empty())
            .unwrap_or(self.config.site_id.as_str())
            .to_string();
        let device = db.add_device(&NewTrackedDevice {
            mac_address,
            friendly_name,
            site_id,
        })?;
        tracing::info!(device = %device.mac_address, id = device.id, "tracking device");
        Ok(device)
    }

    pub fn rename(&self, mac: &str, friendly_name: Option<&str>) -> Result<TrackedDevice> {
        let db = self.db()?;
        let device = require_device(&db, mac)?;
        let friendly_name = friendly_name.map(str::trim).filter(|name| !name.is_empty());
        db.rename_device(device.id, friendly_name)?;
        db.get_device(device.id)?
            .ok_or_else(|| AppError::NotFound(format!("device {} vanished", device.mac_address)))
    }

    /// Stops tracking and removes the device's history and presence data.
    pub fn untrack(&self, mac: &str) -> Result<()> {
        let mut db = self.db()?;
        let device = require_device(&db, mac)?;
        db.delete_device(device.id)?;
        tracing::info!(device = %device.mac_address, "stopped tracking device");
        Ok(())
    }

    /// Most recent intervals first.
    pub fn history(&self, mac: &str, limit: u32) -> Result<Vec<ConnectionInterval>> {
        let db = self.db()?;
        let device = require_device(&db, mac)?;
        Ok(db.list_intervals(device.id, limit)?)
    }
}

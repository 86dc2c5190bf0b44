mod devices;
mod presence;
mod status;

use std::sync::Arc;

use crate::app::AppConfig;
use crate::error::{AppError, Result};
use stalker_core::{TrackedDevice, normalize_mac};
use stalker_db::Db;

pub use devices::DevicesService;
pub use presence::PresenceService;
pub use status::StatusService;

type SharedConfig = Arc<AppConfig>;

/// Service registry for app-level operations.
#[derive(Clone)]
pub struct AppServices {
    pub devices: DevicesService,
    pub presence: PresenceService,
    pub status: StatusService,
}

impl AppServices {
    pub fn new(config: &AppConfig) -> Self {
        let shared = Arc::new(config.clone());
        Self {
            devices: DevicesService::new(shared.clone()),
            presence: PresenceService::new(shared.clone()),
            status: StatusService::new(shared),
        }
    }
}

fn open_db(config: &SharedConfig) -> Result<Db> {
    Ok(Db::open(&config.db_path)?)
}

fn parse_mac(value: &str) -> Result<String> {
    normalize_mac(value).map_err(|err| AppError::InvalidInput(err.to_string()))
}

fn require_device(db: &Db, mac: &str) -> Result<TrackedDevice> {
    let mac = parse_mac(mac)?;
    db.get_device_by_mac(&mac)?
        .ok_or_else(|| AppError::NotFound(format!("device {mac} is not tracked")))
}

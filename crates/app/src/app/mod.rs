use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::services::AppServices;
use stalker_db::Db;

pub const DEFAULT_SITE_ID: &str = "default";
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Runtime settings shared by the services and the scheduler.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub site_id: String,
    pub refresh_interval: Duration,
}

impl AppConfig {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path,
            site_id: DEFAULT_SITE_ID.to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// Application state shared by the CLI commands and the daemon.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let services = AppServices::new(&config);
        Self { config, services }
    }

    pub fn setup_db(&self) -> Result<()> {
        setup_db(&self.config.db_path)
    }

    pub fn open_db(&self) -> Result<Db> {
        Ok(Db::open(&self.config.db_path)?)
    }
}

pub fn setup_db(path: &std::path::Path) -> Result<()> {
    let mut db = Db::open(path)?;
    db.migrate()?;
    Ok(())
}

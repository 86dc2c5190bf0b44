use std::path::PathBuf;

use crate::Result;

const DB_FILE_NAME: &str = "wifi-stalker.sqlite";

#[derive(Clone, Debug)]
pub struct AppPaths {
    pub app_data_dir: PathBuf,
    pub db_path: PathBuf,
}

impl AppPaths {
    pub fn new(app_data_dir: PathBuf) -> Self {
        let db_path = app_data_dir.join(DB_FILE_NAME);
        Self {
            app_data_dir,
            db_path,
        }
    }

    /// Uses `db_path` instead of the default file inside the data dir.
    pub fn with_db_path(mut self, db_path: Option<PathBuf>) -> Self {
        if let Some(db_path) = db_path {
            self.db_path = db_path;
        }
        self
    }
}

pub fn ensure_app_data_dir(paths: &AppPaths) -> Result<()> {
    std::fs::create_dir_all(&paths.app_data_dir)?;
    if let Some(parent) = paths.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stalker_app::NotifierConfig;

const CONFIG_DIR_NAME: &str = "wifi-stalker";
const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
const DEFAULT_SNAPSHOT_FILE: &str = "snapshot.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub refresh_interval_secs: u64,
    pub site_id: String,
    /// Controller export read by the file provider. Relative paths resolve
    /// against the config file's directory.
    pub snapshot_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
    pub notifiers: Vec<NotifierConfig>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            site_id: "default".to_string(),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            db_path: None,
            notifiers: vec![NotifierConfig::default()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: CliConfig,
    pub paths: ConfigPaths,
    pub created: bool,
}

impl ConfigLoad {
    pub fn snapshot_path(&self) -> PathBuf {
        self.resolve(&self.config.snapshot_path)
    }

    pub fn db_path(&self) -> Option<PathBuf> {
        self.config.db_path.as_deref().map(|path| self.resolve(path))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.paths.file.parent() {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }
}

pub fn load_or_create(path: Option<&Path>) -> Result<ConfigLoad, String> {
    let file = match path {
        Some(path) => path.to_path_buf(),
        None => config_dir()?.join(CONFIG_FILE_NAME),
    };
    if let Some(dir) = file.parent() {
        fs::create_dir_all(dir)
            .map_err(|err| format!("create config dir {}: {}", dir.display(), err))?;
    }
    let paths = ConfigPaths { file };

    if paths.file.exists() {
        let contents = fs::read_to_string(&paths.file)
            .map_err(|err| format!("read config {}: {}", paths.file.display(), err))?;
        let config: CliConfig = toml::from_str(&contents)
            .map_err(|err| format!("parse config {}: {}", paths.file.display(), err))?;
        if config.refresh_interval_secs == 0 {
            return Err(format!(
                "refresh_interval_secs in {} must be positive",
                paths.file.display()
            ));
        }
        return Ok(ConfigLoad {
            config,
            paths,
            created: false,
        });
    }

    let config = CliConfig::default();
    let contents =
        toml::to_string_pretty(&config).map_err(|err| format!("serialize config: {}", err))?;
    fs::write(&paths.file, contents)
        .map_err(|err| format!("write config {}: {}", paths.file.display(), err))?;

    Ok(ConfigLoad {
        config,
        paths,
        created: true,
    })
}

fn config_dir() -> Result<PathBuf, String> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir).join(CONFIG_DIR_NAME));
    }
    let home = std::env::var("HOME").map_err(|err| format!("resolve HOME: {}", err))?;
    Ok(PathBuf::from(home).join(".config").join(CONFIG_DIR_NAME))
}

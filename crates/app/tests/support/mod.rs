#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reconcile::{JsonFileConnector, ProviderConnector, ProviderError, SnapshotProvider};
use stalker_app::{AppConfig, AppState};
use tempfile::TempDir;

pub struct TestApp {
    pub dir: TempDir,
    pub state: AppState,
    pub snapshot_path: PathBuf,
}

pub fn setup_app() -> TestApp {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut config = AppConfig::new(dir.path().join("app.sqlite"));
    config.refresh_interval = Duration::from_secs(3600);
    let state = AppState::new(config);
    state.setup_db().expect("setup db");
    let snapshot_path = dir.path().join("snapshot.json");
    TestApp {
        dir,
        state,
        snapshot_path,
    }
}

pub fn write_snapshot(path: &Path, clients: &str) {
    let document = format!(
        r#"{{"clients": [{clients}], "devices": [{{"mac": "00:00:00:00:00:0a", "name": "Office"}}], "blocked": []}}"#
    );
    std::fs::write(path, document).expect("write snapshot");
}

pub const PHONE_ON_OFFICE: &str =
    r#"{"mac": "aa:bb:cc:dd:ee:01", "ap_mac": "00:00:00:00:00:0a", "signal": -50}"#;

/// Wraps the file connector and counts how often a session connects.
pub struct CountingConnector {
    inner: JsonFileConnector,
    pub connects: Arc<AtomicUsize>,
}

impl CountingConnector {
    pub fn new(path: &Path) -> Self {
        Self {
            inner: JsonFileConnector::new(path),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl ProviderConnector for CountingConnector {
    async fn connect(&self) -> Result<Arc<dyn SnapshotProvider>, ProviderError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.inner.connect().await
    }
}

pub async fn wait_for<F>(mut check: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("condition not reached in time");
}

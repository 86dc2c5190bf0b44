use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use stalker_core::normalize_mac;

use crate::error::ProviderError;
use crate::normalize::{RawClient, RawNetworkDevice, snapshot_from_raw};
use crate::provider::{ClientSnapshot, ProviderConnector, SnapshotProvider};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ControllerDocument {
    clients: Vec<RawClient>,
    devices: Vec<RawNetworkDevice>,
    blocked: Vec<String>,
}

/// Reads a controller export from disk on every call.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<ControllerDocument, ProviderError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|err| unavailable(&self.path, err))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl SnapshotProvider for JsonFileProvider {
    async fn fetch_clients(&self) -> Result<ClientSnapshot, ProviderError> {
        let document = self.load().await?;
        Ok(snapshot_from_raw(&document.clients, &document.devices))
    }

    async fn is_blocked(&self, mac_address: &str) -> Result<bool, ProviderError> {
        let document = self.load().await?;
        Ok(document
            .blocked
            .iter()
            .filter_map(|value| normalize_mac(value).ok())
            .any(|value| value == mac_address))
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileConnector {
    path: PathBuf,
}

impl JsonFileConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProviderConnector for JsonFileConnector {
    async fn connect(&self) -> Result<Arc<dyn SnapshotProvider>, ProviderError> {
        tokio::fs::metadata(&self.path)
            .await
            .map_err(|err| unavailable(&self.path, err))?;
        Ok(Arc::new(JsonFileProvider::new(self.path.clone())))
    }
}

fn unavailable(path: &Path, err: std::io::Error) -> ProviderError {
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => {
            ProviderError::Unavailable(format!("{}: {}", path.display(), err))
        }
        _ => ProviderError::Io(err),
    }
}

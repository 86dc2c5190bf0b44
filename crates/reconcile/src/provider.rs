use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use stalker_core::ClientDescriptor;
use tokio::sync::Mutex;

use crate::error::ProviderError;

/// Every client the controller currently sees, keyed by normalized mac.
/// A tracked mac missing from the map is not attached.
#[derive(Debug, Clone, Default)]
pub struct ClientSnapshot {
    clients: HashMap<String, ClientDescriptor>,
}

impl ClientSnapshot {
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ClientDescriptor>) -> Self {
        let clients = descriptors
            .into_iter()
            .map(|descriptor| (descriptor.mac_address.clone(), descriptor))
            .collect();
        Self { clients }
    }

    pub fn get(&self, mac_address: &str) -> Option<&ClientDescriptor> {
        self.clients.get(mac_address)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn fetch_clients(&self) -> Result<ClientSnapshot, ProviderError>;

    async fn is_blocked(&self, mac_address: &str) -> Result<bool, ProviderError>;
}

#[async_trait]
pub trait ProviderConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn SnapshotProvider>, ProviderError>;
}

/// Lazily connected provider handle shared by the scheduled jobs.
pub struct ProviderSession {
    connector: Arc<dyn ProviderConnector>,
    cached: Mutex<Option<Arc<dyn SnapshotProvider>>>,
}

impl ProviderSession {
    pub fn new(connector: Arc<dyn ProviderConnector>) -> Self {
        Self {
            connector,
            cached: Mutex::new(None),
        }
    }

    pub async fn get(&self) -> Result<Arc<dyn SnapshotProvider>, ProviderError> {
        let mut cached = self.cached.lock().await;
        if let Some(provider) = cached.as_ref() {
            return Ok(Arc::clone(provider));
        }
        let provider = self.connector.connect().await?;
        tracing::info!("connected to snapshot provider");
        *cached = Some(Arc::clone(&provider));
        Ok(provider)
    }

    /// Drops the cached provider; the next `get` reconnects.
    pub async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            tracing::info!("discarded cached snapshot provider");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.cached.lock().await.is_some()
    }
}

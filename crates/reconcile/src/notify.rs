use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use stalker_core::{DeviceEvent, EventFilter, EventType, TrackedDevice};
use tokio::sync::broadcast;

use crate::error::NotifyError;

const UPDATE_CHANNEL_CAPACITY: usize = 64;

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, event: &DeviceEvent) -> Result<(), NotifyError>;
}

/// Writes every event as a structured log record.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, event: &DeviceEvent) -> Result<(), NotifyError> {
        tracing::info!(
            event = %event.event_type,
            device = %event.mac_address,
            name = %event.display_name,
            location = event.location_name.as_deref().unwrap_or("-"),
            signal = ?event.signal,
            offline_seconds = ?event.offline_duration,
            "device event"
        );
        Ok(())
    }
}

/// Current device state pushed to subscribers after each transition.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceUpdate {
    pub event_type: EventType,
    pub device: TrackedDevice,
}

struct Sink {
    notifier: Arc<dyn Notifier>,
    filter: EventFilter,
}

pub struct Dispatcher {
    sinks: Vec<Sink>,
    updates: broadcast::Sender<DeviceUpdate>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            sinks: Vec::new(),
            updates,
        }
    }

    pub fn with_sink(mut self, notifier: Arc<dyn Notifier>, filter: EventFilter) -> Self {
        self.add_sink(notifier, filter);
        self
    }

    pub fn add_sink(&mut self, notifier: Arc<dyn Notifier>, filter: EventFilter) {
        self.sinks.push(Sink { notifier, filter });
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeviceUpdate> {
        self.updates.subscribe()
    }

    /// Delivers one event to every sink that accepts it and pushes the
    /// device state. Returns the number of failed deliveries; failures are
    /// logged and otherwise ignored.
    pub async fn dispatch(&self, event: &DeviceEvent, device: &TrackedDevice) -> usize {
        let mut failures = 0;
        for sink in self
            .sinks
            .iter()
            .filter(|sink| sink.filter.accepts(event.event_type))
        {
            if let Err(err) = sink.notifier.notify(event).await {
                failures += 1;
                tracing::warn!(
                    sink = sink.notifier.name(),
                    event = %event.event_type,
                    device = %event.mac_address,
                    error = %err,
                    "notification delivery failed"
                );
            }
        }
        // No subscribers is fine.
        let _ = self.updates.send(DeviceUpdate {
            event_type: event.event_type,
            device: device.clone(),
        });
        failures
    }
}

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reconcile::{
    ClientSnapshot, Dispatcher, NotifyError, Notifier, ProviderError, SnapshotProvider,
};
use stalker_core::{
    Attachment, ClientDescriptor, DeviceEvent, EventFilter, EventType, NewTrackedDevice,
    TrackedDevice,
};
use stalker_db::Db;
use tempfile::TempDir;

pub struct TestDb {
    pub _dir: TempDir,
    pub db: Db,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut db = Db::open(dir.path().join("engine.sqlite")).expect("open db");
    db.migrate().expect("migrate db");
    TestDb { _dir: dir, db }
}

pub fn track(db: &Db, mac: &str, name: &str) -> TrackedDevice {
    db.add_device(&NewTrackedDevice {
        mac_address: mac.to_string(),
        friendly_name: Some(name.to_string()),
        site_id: "default".to_string(),
    })
    .expect("add device")
}

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, hour, minute, 0)
        .single()
        .expect("valid time")
}

pub fn on_ap(mac: &str, ap_mac: &str, ap_name: &str, signal: i64) -> ClientDescriptor {
    ClientDescriptor {
        mac_address: mac.to_string(),
        attachment: Attachment::Wireless {
            ap_mac: ap_mac.to_string(),
            ap_name: Some(ap_name.to_string()),
            ssid: Some("home".to_string()),
            radio: Some("na".to_string()),
            signal: Some(signal),
        },
        ip_address: Some("10.0.0.20".to_string()),
        hostname: None,
    }
}

pub fn on_port(mac: &str, switch_mac: &str, port: i64) -> ClientDescriptor {
    ClientDescriptor {
        mac_address: mac.to_string(),
        attachment: Attachment::Wired {
            switch_mac: switch_mac.to_string(),
            switch_name: Some("Core".to_string()),
            port: Some(port),
        },
        ip_address: Some("10.0.0.21".to_string()),
        hostname: None,
    }
}

#[derive(Default)]
struct ProviderState {
    clients: Vec<ClientDescriptor>,
    blocked: HashSet<String>,
    failing_lookups: HashSet<String>,
    unavailable: bool,
}

/// Provider whose snapshot the test rewrites between cycles.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl ScriptedProvider {
    pub fn set_clients(&self, clients: Vec<ClientDescriptor>) {
        self.state.lock().expect("provider state").clients = clients;
    }

    pub fn set_blocked(&self, mac: &str, blocked: bool) {
        let mut state = self.state.lock().expect("provider state");
        if blocked {
            state.blocked.insert(mac.to_string());
        } else {
            state.blocked.remove(mac);
        }
    }

    pub fn fail_lookup(&self, mac: &str) {
        self.state
            .lock()
            .expect("provider state")
            .failing_lookups
            .insert(mac.to_string());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().expect("provider state").unavailable = unavailable;
    }
}

#[async_trait]
impl SnapshotProvider for ScriptedProvider {
    async fn fetch_clients(&self) -> Result<ClientSnapshot, ProviderError> {
        let state = self.state.lock().expect("provider state");
        if state.unavailable {
            return Err(ProviderError::Unavailable("controller offline".to_string()));
        }
        Ok(ClientSnapshot::from_descriptors(state.clients.clone()))
    }

    async fn is_blocked(&self, mac_address: &str) -> Result<bool, ProviderError> {
        let state = self.state.lock().expect("provider state");
        if state.failing_lookups.contains(mac_address) {
            return Err(ProviderError::Lookup(format!("no such client {mac_address}")));
        }
        Ok(state.blocked.contains(mac_address))
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<DeviceEvent>>>,
}

impl RecordingNotifier {
    pub fn take(&self) -> Vec<DeviceEvent> {
        std::mem::take(&mut *self.events.lock().expect("events"))
    }

    pub fn types(&self) -> Vec<EventType> {
        self.take().into_iter().map(|event| event.event_type).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, event: &DeviceEvent) -> Result<(), NotifyError> {
        self.events.lock().expect("events").push(event.clone());
        Ok(())
    }
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    fn name(&self) -> &str {
        "failing"
    }

    async fn notify(&self, _event: &DeviceEvent) -> Result<(), NotifyError> {
        Err(NotifyError {
            sink: "failing".to_string(),
            message: "webhook returned 500".to_string(),
        })
    }
}

pub fn recording_dispatcher() -> (Dispatcher, RecordingNotifier) {
    let recorder = RecordingNotifier::default();
    let dispatcher = Dispatcher::new().with_sink(Arc::new(recorder.clone()), EventFilter::default());
    (dispatcher, recorder)
}

pub fn open_count(db: &Db, device_id: i64) -> usize {
    db.open_intervals(device_id).expect("open intervals").len()
}


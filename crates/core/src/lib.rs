use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DAYS_PER_WEEK: usize = 7;
pub const HOURS_PER_DAY: usize = 24;
/// Flat credit applied to a presence slot for every hourly sample.
pub const PRESENCE_SAMPLE_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacError(pub String);

impl fmt::Display for MacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid mac address: {}", self.0)
    }
}

impl std::error::Error for MacError {}

/// Normalizes a hardware address in any common notation to `aa:bb:cc:dd:ee:ff`.
pub fn normalize_mac(value: &str) -> Result<String, MacError> {
    let hex: Vec<char> = value
        .chars()
        .filter(|ch| !matches!(ch, ':' | '-' | '.' | ' '))
        .collect();
    if hex.len() != 12 || !hex.iter().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(MacError(value.to_string()));
    }
    let pairs: Vec<String> = hex
        .chunks(2)
        .map(|pair| pair.iter().collect::<String>().to_ascii_lowercase())
        .collect();
    Ok(pairs.join(":"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    Wired,
    Wireless,
}

impl Medium {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wired => "wired",
            Self::Wireless => "wireless",
        }
    }
}

/// Where a device is attached to the network. Exactly one shape is populated
/// while a device is connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "medium", rename_all = "lowercase")]
pub enum Attachment {
    Wireless {
        ap_mac: String,
        ap_name: Option<String>,
        ssid: Option<String>,
        radio: Option<String>,
        signal: Option<i64>,
    },
    Wired {
        switch_mac: String,
        switch_name: Option<String>,
        port: Option<i64>,
    },
}

impl Attachment {
    pub fn medium(&self) -> Medium {
        match self {
            Self::Wireless { .. } => Medium::Wireless,
            Self::Wired { .. } => Medium::Wired,
        }
    }

    /// True when both attachments name the same access point, or the same
    /// switch and port. Telemetry (signal, ssid, radio, names) is ignored.
    pub fn same_location(&self, other: &Attachment) -> bool {
        match (self, other) {
            (Self::Wireless { ap_mac: a, .. }, Self::Wireless { ap_mac: b, .. }) => a == b,
            (
                Self::Wired {
                    switch_mac: a,
                    port: port_a,
                    ..
                },
                Self::Wired {
                    switch_mac: b,
                    port: port_b,
                    ..
                },
            ) => a == b && port_a == port_b,
            _ => false,
        }
    }

    pub fn location_name(&self) -> String {
        match self {
            Self::Wireless { ap_mac, ap_name, .. } => {
                ap_name.clone().unwrap_or_else(|| ap_mac.clone())
            }
            Self::Wired {
                switch_mac,
                switch_name,
                port,
            } => {
                let switch = switch_name.as_deref().unwrap_or(switch_mac.as_str());
                match port {
                    Some(port) => format!("{} port {}", switch, port),
                    None => format!("{} port ?", switch),
                }
            }
        }
    }

    pub fn signal(&self) -> Option<i64> {
        match self {
            Self::Wireless { signal, .. } => *signal,
            Self::Wired { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedDevice {
    pub id: i64,
    pub mac_address: String,
    pub friendly_name: Option<String>,
    pub site_id: String,
    pub added_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
    pub is_connected: bool,
    pub is_blocked: bool,
    pub is_wired: bool,
    pub ip_address: Option<String>,
    pub attachment: Option<Attachment>,
}

impl TrackedDevice {
    pub fn display_name(&self) -> &str {
        self.friendly_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.mac_address.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct NewTrackedDevice {
    pub mac_address: String,
    pub friendly_name: Option<String>,
    pub site_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInterval {
    pub id: i64,
    pub device_id: i64,
    pub attachment: Attachment,
    pub connected_at: DateTime<Utc>,
    pub disconnected_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

impl ConnectionInterval {
    pub fn is_open(&self) -> bool {
        self.disconnected_at.is_none()
    }
}

/// Live attachment of one client as reported by the network controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientDescriptor {
    pub mac_address: String,
    pub attachment: Attachment,
    pub ip_address: Option<String>,
    pub hostname: Option<String>,
}

impl ClientDescriptor {
    pub fn is_wired(&self) -> bool {
        self.attachment.medium() == Medium::Wired
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Connected,
    Disconnected,
    Roamed,
    Blocked,
    Unblocked,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::Connected,
        EventType::Disconnected,
        EventType::Roamed,
        EventType::Blocked,
        EventType::Unblocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Roamed => "roamed",
            Self::Blocked => "blocked",
            Self::Unblocked => "unblocked",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transition notification, emitted exactly once per edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub event_type: EventType,
    pub device_id: i64,
    pub mac_address: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_duration: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

/// Per-sink event selection. Every event type is enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFilter {
    pub connected: bool,
    pub disconnected: bool,
    pub roamed: bool,
    pub blocked: bool,
    pub unblocked: bool,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            connected: true,
            disconnected: true,
            roamed: true,
            blocked: true,
            unblocked: true,
        }
    }
}

impl EventFilter {
    pub fn only(events: &[EventType]) -> Self {
        Self {
            connected: events.contains(&EventType::Connected),
            disconnected: events.contains(&EventType::Disconnected),
            roamed: events.contains(&EventType::Roamed),
            blocked: events.contains(&EventType::Blocked),
            unblocked: events.contains(&EventType::Unblocked),
        }
    }

    pub fn accepts(&self, event_type: EventType) -> bool {
        match event_type {
            EventType::Connected => self.connected,
            EventType::Disconnected => self.disconnected,
            EventType::Roamed => self.roamed,
            EventType::Blocked => self.blocked,
            EventType::Unblocked => self.unblocked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceBucket {
    pub device_id: i64,
    pub day_of_week: u8,
    pub hour_of_day: u8,
    pub total_minutes_connected: i64,
    pub sample_count: i64,
    pub last_updated: DateTime<Utc>,
}

impl PresenceBucket {
    pub fn average_minutes(&self) -> Option<f64> {
        if self.sample_count <= 0 {
            return None;
        }
        Some(self.total_minutes_connected as f64 / self.sample_count as f64)
    }
}

/// 7x24 average-occupancy map, indexed `[day_of_week][hour_of_day]` with
/// Monday as day 0. Empty slots are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyGrid {
    pub device_id: i64,
    pub slots: Vec<Vec<Option<f64>>>,
}

impl OccupancyGrid {
    pub fn from_buckets(device_id: i64, buckets: &[PresenceBucket]) -> Self {
        let mut slots = vec![vec![None; HOURS_PER_DAY]; DAYS_PER_WEEK];
        for bucket in buckets.iter().filter(|bucket| bucket.device_id == device_id) {
            let day = bucket.day_of_week as usize;
            let hour = bucket.hour_of_day as usize;
            if day < DAYS_PER_WEEK && hour < HOURS_PER_DAY {
                slots[day][hour] = bucket.average_minutes();
            }
        }
        Self { device_id, slots }
    }

    pub fn get(&self, day_of_week: u8, hour_of_day: u8) -> Option<f64> {
        self.slots
            .get(day_of_week as usize)
            .and_then(|hours| hours.get(hour_of_day as usize))
            .copied()
            .flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub last_refresh: Option<DateTime<Utc>>,
    pub tracked_devices: u64,
    pub connected_devices: u64,
    pub refresh_interval_seconds: u64,
}

/// Parses a stored timestamp. Values without an explicit offset are read as UTC.
pub fn normalize_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Whole seconds between two instants, never negative.
pub fn interval_duration_seconds(
    connected_at: DateTime<Utc>,
    disconnected_at: DateTime<Utc>,
) -> i64 {
    (disconnected_at - connected_at).num_seconds().max(0)
}

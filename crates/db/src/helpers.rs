use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use stalker_core::{
    Attachment, ConnectionInterval, PresenceBucket, TrackedDevice, normalize_timestamp,
};

use crate::error::DbError;

pub(crate) const DEVICE_COLUMNS: &str = r#"
    id, mac_address, friendly_name, site_id, added_at, last_seen,
    is_connected, is_blocked, is_wired, current_ip_address,
    current_ap_mac, current_ap_name, current_ssid, current_radio, current_signal_strength,
    current_switch_mac, current_switch_name, current_switch_port
"#;

pub(crate) const INTERVAL_COLUMNS: &str = r#"
    id, device_id, is_wired, ap_mac, ap_name, ssid, signal_strength,
    switch_mac, switch_name, switch_port, connected_at, disconnected_at, duration_seconds
"#;

pub(crate) const PRESENCE_COLUMNS: &str = r#"
    device_id, day_of_week, hour_of_day, total_minutes_connected, sample_count, last_updated
"#;

/// Canonical stored form: RFC 3339, millisecond precision, `Z` suffix.
pub fn format_ts(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn ts_at(row: &Row<'_>, idx: usize) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    normalize_timestamp(&raw).ok_or_else(|| invalid_ts(idx, raw))
}

fn opt_ts_at(
    row: &Row<'_>,
    idx: usize,
) -> std::result::Result<Option<DateTime<Utc>>, rusqlite::Error> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(raw) => match normalize_timestamp(&raw) {
            Some(value) => Ok(Some(value)),
            None => Err(invalid_ts(idx, raw)),
        },
        None => Ok(None),
    }
}

fn invalid_ts(idx: usize, raw: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        Box::new(DbError::InvalidTimestamp(raw)),
    )
}

pub(crate) fn row_to_device(row: &Row<'_>) -> std::result::Result<TrackedDevice, rusqlite::Error> {
    let is_connected: bool = row.get(6)?;
    let is_wired: bool = row.get(8)?;
    let ap_mac: Option<String> = row.get(10)?;
    let switch_mac: Option<String> = row.get(15)?;
    let attachment = match (is_wired, ap_mac, switch_mac) {
        (true, _, Some(switch_mac)) => Some(Attachment::Wired {
            switch_mac,
            switch_name: row.get(16)?,
            port: row.get(17)?,
        }),
        (false, Some(ap_mac), _) => Some(Attachment::Wireless {
            ap_mac,
            ap_name: row.get(11)?,
            ssid: row.get(12)?,
            radio: row.get(13)?,
            signal: row.get(14)?,
        }),
        _ => None,
    };
    Ok(TrackedDevice {
        id: row.get(0)?,
        mac_address: row.get(1)?,
        friendly_name: row.get(2)?,
        site_id: row.get(3)?,
        added_at: ts_at(row, 4)?,
        last_seen: opt_ts_at(row, 5)?,
        is_connected,
        is_blocked: row.get(7)?,
        is_wired,
        ip_address: row.get(9)?,
        attachment: if is_connected { attachment } else { None },
    })
}

pub(crate) fn row_to_interval(
    row: &Row<'_>,
) -> std::result::Result<ConnectionInterval, rusqlite::Error> {
    let is_wired: bool = row.get(2)?;
    let attachment = if is_wired {
        Attachment::Wired {
            switch_mac: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            switch_name: row.get(8)?,
            port: row.get(9)?,
        }
    } else {
        Attachment::Wireless {
            ap_mac: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            ap_name: row.get(4)?,
            ssid: row.get(5)?,
            radio: None,
            signal: row.get(6)?,
        }
    };
    Ok(ConnectionInterval {
        id: row.get(0)?,
        device_id: row.get(1)?,
        attachment,
        connected_at: ts_at(row, 10)?,
        disconnected_at: opt_ts_at(row, 11)?,
        duration_seconds: row.get(12)?,
    })
}

pub(crate) fn row_to_presence(
    row: &Row<'_>,
) -> std::result::Result<PresenceBucket, rusqlite::Error> {
    Ok(PresenceBucket {
        device_id: row.get(0)?,
        day_of_week: row.get(1)?,
        hour_of_day: row.get(2)?,
        total_minutes_connected: row.get(3)?,
        sample_count: row.get(4)?,
        last_updated: ts_at(row, 5)?,
    })
}

/// Flat column values for an optional attachment. Fields of the other medium
/// stay `None`, so writing them clears stale data.
#[derive(Debug, Default)]
pub(crate) struct AttachmentColumns {
    pub is_wired: bool,
    pub ap_mac: Option<String>,
    pub ap_name: Option<String>,
    pub ssid: Option<String>,
    pub radio: Option<String>,
    pub signal: Option<i64>,
    pub switch_mac: Option<String>,
    pub switch_name: Option<String>,
    pub switch_port: Option<i64>,
}

impl AttachmentColumns {
    pub(crate) fn from_attachment(attachment: Option<&Attachment>) -> Self {
        match attachment {
            Some(Attachment::Wireless {
                ap_mac,
                ap_name,
                ssid,
                radio,
                signal,
            }) => Self {
                is_wired: false,
                ap_mac: Some(ap_mac.clone()),
                ap_name: ap_name.clone(),
                ssid: ssid.clone(),
                radio: radio.clone(),
                signal: *signal,
                ..Self::default()
            },
            Some(Attachment::Wired {
                switch_mac,
                switch_name,
                port,
            }) => Self {
                is_wired: true,
                switch_mac: Some(switch_mac.clone()),
                switch_name: switch_name.clone(),
                switch_port: *port,
                ..Self::default()
            },
            None => Self::default(),
        }
    }
}

use std::collections::HashMap;

use serde::Deserialize;
use stalker_core::{Attachment, ClientDescriptor, normalize_mac};

use crate::provider::ClientSnapshot;

/// Client record in the controller's own shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawClient {
    pub mac: Option<String>,
    pub is_wired: bool,
    pub ap_mac: Option<String>,
    pub essid: Option<String>,
    pub radio: Option<String>,
    pub signal: Option<i64>,
    pub rssi: Option<i64>,
    pub sw_mac: Option<String>,
    pub sw_port: Option<i64>,
    pub ip: Option<String>,
    pub hostname: Option<String>,
}

/// Access point or switch from the controller's device list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawNetworkDevice {
    pub mac: Option<String>,
    pub name: Option<String>,
    pub model: Option<String>,
}

/// Display names for attachment points, keyed by normalized mac. Name wins
/// over model.
pub fn attachment_names(devices: &[RawNetworkDevice]) -> HashMap<String, String> {
    devices
        .iter()
        .filter_map(|device| {
            let mac = normalize_mac(device.mac.as_deref()?).ok()?;
            let label = non_empty(device.name.as_deref())
                .or_else(|| non_empty(device.model.as_deref()))?;
            Some((mac, label.to_string()))
        })
        .collect()
}

/// Converts one raw record. Returns `None` when the client mac or the
/// attachment identity is missing or malformed.
///
/// Signal prefers `signal` and falls back to `rssi`. Wired clients attach to
/// `sw_mac`/`sw_port`, wireless ones to `ap_mac`.
pub fn descriptor_from_raw(
    raw: &RawClient,
    names: &HashMap<String, String>,
) -> Option<ClientDescriptor> {
    let mac_address = normalize_mac(raw.mac.as_deref()?).ok()?;
    let attachment = if raw.is_wired {
        let switch_mac = normalize_mac(raw.sw_mac.as_deref()?).ok()?;
        Attachment::Wired {
            switch_name: names.get(&switch_mac).cloned(),
            switch_mac,
            port: raw.sw_port,
        }
    } else {
        let ap_mac = normalize_mac(raw.ap_mac.as_deref()?).ok()?;
        Attachment::Wireless {
            ap_name: names.get(&ap_mac).cloned(),
            ap_mac,
            ssid: non_empty(raw.essid.as_deref()).map(str::to_string),
            radio: non_empty(raw.radio.as_deref()).map(str::to_string),
            signal: raw.signal.or(raw.rssi),
        }
    };
    Some(ClientDescriptor {
        mac_address,
        attachment,
        ip_address: non_empty(raw.ip.as_deref()).map(str::to_string),
        hostname: non_empty(raw.hostname.as_deref()).map(str::to_string),
    })
}

pub fn snapshot_from_raw(clients: &[RawClient], devices: &[RawNetworkDevice]) -> ClientSnapshot {
    let names = attachment_names(devices);
    let mut dropped = 0usize;
    let descriptors: Vec<ClientDescriptor> = clients
        .iter()
        .filter_map(|raw| {
            let descriptor = descriptor_from_raw(raw, &names);
            if descriptor.is_none() {
                dropped += 1;
                tracing::debug!(mac = ?raw.mac, "dropping client record without usable attachment");
            }
            descriptor
        })
        .collect();
    if dropped > 0 {
        tracing::debug!(dropped, kept = descriptors.len(), "normalized client snapshot");
    }
    ClientSnapshot::from_descriptors(descriptors)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> HashMap<String, String> {
        attachment_names(&[
            RawNetworkDevice {
                mac: Some("00:00:00:00:00:0A".to_string()),
                name: Some("Office".to_string()),
                model: Some("U6-Lite".to_string()),
            },
            RawNetworkDevice {
                mac: Some("00:00:00:00:00:0b".to_string()),
                name: None,
                model: Some("USW-24".to_string()),
            },
        ])
    }

    #[test]
    fn signal_falls_back_to_rssi() {
        let raw = RawClient {
            mac: Some("AA:BB:CC:DD:EE:01".to_string()),
            ap_mac: Some("00:00:00:00:00:0a".to_string()),
            rssi: Some(-61),
            ..RawClient::default()
        };
        let descriptor = descriptor_from_raw(&raw, &names()).expect("descriptor");
        assert_eq!(descriptor.mac_address, "aa:bb:cc:dd:ee:01");
        assert_eq!(descriptor.attachment.signal(), Some(-61));
        assert_eq!(descriptor.attachment.location_name(), "Office");

        let both = RawClient {
            signal: Some(-48),
            ..raw
        };
        let descriptor = descriptor_from_raw(&both, &names()).expect("descriptor");
        assert_eq!(descriptor.attachment.signal(), Some(-48));
    }

    #[test]
    fn wired_clients_attach_to_switch_port() {
        let raw = RawClient {
            mac: Some("aa-bb-cc-dd-ee-02".to_string()),
            is_wired: true,
            ap_mac: Some("00:00:00:00:00:0a".to_string()),
            sw_mac: Some("00:00:00:00:00:0b".to_string()),
            sw_port: Some(7),
            ..RawClient::default()
        };
        let descriptor = descriptor_from_raw(&raw, &names()).expect("descriptor");
        assert!(descriptor.is_wired());
        assert_eq!(descriptor.attachment.location_name(), "USW-24 port 7");
    }

    #[test]
    fn records_without_attachment_are_dropped() {
        let clients = vec![
            RawClient {
                mac: Some("aa:bb:cc:dd:ee:03".to_string()),
                ..RawClient::default()
            },
            RawClient {
                mac: Some("not-a-mac".to_string()),
                ap_mac: Some("00:00:00:00:00:0a".to_string()),
                ..RawClient::default()
            },
            RawClient {
                mac: Some("aa:bb:cc:dd:ee:04".to_string()),
                ap_mac: Some("00:00:00:00:00:0c".to_string()),
                ..RawClient::default()
            },
        ];
        let snapshot = snapshot_from_raw(&clients, &[]);
        assert_eq!(snapshot.len(), 1);
        let kept = snapshot.get("aa:bb:cc:dd:ee:04").expect("kept");
        assert_eq!(kept.attachment.location_name(), "00:00:00:00:00:0c");
    }
}

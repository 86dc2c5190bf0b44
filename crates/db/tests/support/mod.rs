#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use stalker_core::{Attachment, NewTrackedDevice, TrackedDevice};
use stalker_db::Db;
use tempfile::TempDir;

pub struct TestDb {
    pub _dir: TempDir,
    pub db: Db,
    pub path: PathBuf,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("test.sqlite");
    let mut db = Db::open(&path).expect("open db");
    db.migrate().expect("migrate db");
    TestDb {
        _dir: dir,
        db,
        path,
    }
}

pub fn add_device(db: &Db, mac: &str, name: &str) -> TrackedDevice {
    db.add_device(&NewTrackedDevice {
        mac_address: mac.to_string(),
        friendly_name: Some(name.to_string()),
        site_id: "default".to_string(),
    })
    .expect("add device")
}

pub fn wireless(ap_mac: &str, ap_name: &str) -> Attachment {
    Attachment::Wireless {
        ap_mac: ap_mac.to_string(),
        ap_name: Some(ap_name.to_string()),
        ssid: Some("home".to_string()),
        radio: Some("na".to_string()),
        signal: Some(-55),
    }
}

pub fn wired(switch_mac: &str, port: i64) -> Attachment {
    Attachment::Wired {
        switch_mac: switch_mac.to_string(),
        switch_name: Some("Core Switch".to_string()),
        port: Some(port),
    }
}

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, hour, minute, 0)
        .single()
        .expect("valid time")
}

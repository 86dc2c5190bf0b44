use std::fs;
use std::sync::Arc;

use reconcile::{
    JsonFileConnector, JsonFileProvider, ProviderError, ProviderSession, SnapshotProvider,
};
use tempfile::tempdir;

const DOCUMENT: &str = r#"
{
  "clients": [
    {"mac": "AA:BB:CC:DD:EE:01", "ap_mac": "00:00:00:00:00:0a", "essid": "home", "radio": "na", "rssi": -58, "ip": "10.0.0.20"},
    {"mac": "aa:bb:cc:dd:ee:02", "is_wired": true, "sw_mac": "00:00:00:00:00:10", "sw_port": 12},
    {"mac": "aa:bb:cc:dd:ee:03"}
  ],
  "devices": [
    {"mac": "00:00:00:00:00:0a", "name": "Office"},
    {"mac": "00:00:00:00:00:10", "model": "USW-24"}
  ],
  "blocked": ["AA-BB-CC-DD-EE-02"]
}
"#;

#[tokio::test]
async fn file_provider_normalizes_controller_document() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("snapshot.json");
    fs::write(&path, DOCUMENT).expect("write snapshot");

    let provider = JsonFileProvider::new(&path);
    let snapshot = provider.fetch_clients().await.expect("fetch");
    assert_eq!(snapshot.len(), 2);

    let phone = snapshot.get("aa:bb:cc:dd:ee:01").expect("phone");
    assert_eq!(phone.attachment.location_name(), "Office");
    assert_eq!(phone.attachment.signal(), Some(-58));
    let desk = snapshot.get("aa:bb:cc:dd:ee:02").expect("desk");
    assert!(desk.is_wired());
    assert_eq!(desk.attachment.location_name(), "USW-24 port 12");
    assert!(snapshot.get("aa:bb:cc:dd:ee:03").is_none());

    assert!(provider.is_blocked("aa:bb:cc:dd:ee:02").await.expect("lookup"));
    assert!(!provider.is_blocked("aa:bb:cc:dd:ee:01").await.expect("lookup"));
}

#[tokio::test]
async fn missing_or_corrupt_file_is_an_error() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("snapshot.json");
    let provider = JsonFileProvider::new(&path);
    assert!(matches!(
        provider.fetch_clients().await,
        Err(ProviderError::Unavailable(_))
    ));

    fs::write(&path, "{ not json").expect("write snapshot");
    assert!(matches!(
        provider.fetch_clients().await,
        Err(ProviderError::Decode(_))
    ));
}

#[tokio::test]
async fn session_reconnects_after_invalidate() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("snapshot.json");
    let session = ProviderSession::new(Arc::new(JsonFileConnector::new(&path)));

    assert!(session.get().await.is_err());
    assert!(!session.is_connected().await);

    fs::write(&path, DOCUMENT).expect("write snapshot");
    let provider = session.get().await.expect("connect");
    assert_eq!(provider.fetch_clients().await.expect("fetch").len(), 2);
    assert!(session.is_connected().await);

    session.invalidate().await;
    assert!(!session.is_connected().await);
    assert!(session.get().await.is_ok());
}

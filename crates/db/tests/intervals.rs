mod support;

use rusqlite::{Connection, params};
use stalker_db::{CycleCommit, IntervalClose, IntervalOpen};
use support::{add_device, at, setup_db, wired, wireless};

#[test]
fn commit_cycle_closes_then_opens_in_one_transaction() {
    let mut test_db = setup_db();
    let db = &mut test_db.db;
    let device = add_device(db, "aa:bb:cc:dd:ee:01", "Phone");
    let first = db
        .insert_interval(&IntervalOpen {
            device_id: device.id,
            attachment: wireless("00:00:00:00:00:01", "Office"),
            connected_at: at(9, 0),
        })
        .expect("insert interval");

    let mut updated = device.clone();
    updated.is_connected = true;
    updated.attachment = Some(wireless("00:00:00:00:00:02", "Bedroom"));
    let stats = db
        .commit_cycle(&CycleCommit {
            closes: vec![IntervalClose {
                interval_id: first,
                disconnected_at: at(10, 30),
                duration_seconds: 5400,
            }],
            opens: vec![IntervalOpen {
                device_id: device.id,
                attachment: wireless("00:00:00:00:00:02", "Bedroom"),
                connected_at: at(10, 30),
            }],
            devices: vec![updated],
            refreshed_at: Some(at(10, 30)),
        })
        .expect("commit");
    assert_eq!(stats.intervals_closed, 1);
    assert_eq!(stats.intervals_opened, 1);
    assert_eq!(stats.devices_updated, 1);

    let open = db.open_intervals(device.id).expect("open intervals");
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].attachment.location_name(), "Bedroom");
    let history = db.list_intervals(device.id, 10).expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].duration_seconds, Some(5400));
    assert_eq!(
        db.last_disconnected_at(device.id).expect("last disconnect"),
        Some(at(10, 30))
    );
    let stored = db.get_device(device.id).expect("get").expect("device");
    assert!(stored.is_connected);
    assert_eq!(db.last_refresh().expect("last refresh"), Some(at(10, 30)));
}

#[test]
fn failed_commit_leaves_no_partial_writes() {
    let mut test_db = setup_db();
    let db = &mut test_db.db;
    let device = add_device(db, "aa:bb:cc:dd:ee:02", "Laptop");
    let first = db
        .insert_interval(&IntervalOpen {
            device_id: device.id,
            attachment: wireless("00:00:00:00:00:01", "Office"),
            connected_at: at(9, 0),
        })
        .expect("insert interval");

    let result = db.commit_cycle(&CycleCommit {
        closes: vec![IntervalClose {
            interval_id: first,
            disconnected_at: at(10, 0),
            duration_seconds: 3600,
        }],
        opens: vec![IntervalOpen {
            device_id: 9_999,
            attachment: wireless("00:00:00:00:00:02", "Bedroom"),
            connected_at: at(10, 0),
        }],
        devices: Vec::new(),
        refreshed_at: Some(at(10, 0)),
    });
    assert!(result.is_err());

    let open = db.open_intervals(device.id).expect("open intervals");
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, first);
    assert!(db.last_refresh().expect("last refresh").is_none());
}

#[test]
fn open_intervals_orders_by_instant_across_stored_formats() {
    let test_db = setup_db();
    let db = &test_db.db;
    let device = add_device(db, "aa:bb:cc:dd:ee:03", "Tablet");
    let conn = Connection::open(&test_db.path).expect("open conn");
    conn.execute(
        r#"
        INSERT INTO connection_interval (device_id, is_wired, ap_mac, connected_at)
        VALUES (?1, 0, '00:00:00:00:00:01', '2025-03-03T12:00:00')
        "#,
        params![device.id],
    )
    .expect("insert naive");
    conn.execute(
        r#"
        INSERT INTO connection_interval (device_id, is_wired, ap_mac, connected_at)
        VALUES (?1, 0, '00:00:00:00:00:02', '2025-03-03T13:30:00+02:00')
        "#,
        params![device.id],
    )
    .expect("insert offset");

    let open = db.open_intervals(device.id).expect("open intervals");
    assert_eq!(open.len(), 2);
    assert_eq!(open[0].connected_at, at(12, 0));
    assert_eq!(open[1].connected_at, at(11, 30));
}

#[test]
fn wired_intervals_round_trip_switch_and_port() {
    let test_db = setup_db();
    let db = &test_db.db;
    let device = add_device(db, "aa:bb:cc:dd:ee:04", "NAS");
    db.insert_interval(&IntervalOpen {
        device_id: device.id,
        attachment: wired("00:00:00:00:00:10", 7),
        connected_at: at(8, 0),
    })
    .expect("insert interval");

    let open = db.open_intervals(device.id).expect("open intervals");
    assert_eq!(open[0].attachment, wired("00:00:00:00:00:10", 7));
    assert_eq!(open[0].attachment.location_name(), "Core Switch port 7");
}

#[test]
fn last_disconnected_at_picks_newest_close_across_stored_formats() {
    let mut test_db = setup_db();
    let device = add_device(&test_db.db, "aa:bb:cc:dd:ee:05", "Watch");
    assert_eq!(
        test_db.db.last_disconnected_at(device.id).expect("no history"),
        None
    );

    let db = &mut test_db.db;
    let mut closes = Vec::new();
    for hour in [9, 14, 11] {
        let id = db
            .insert_interval(&IntervalOpen {
                device_id: device.id,
                attachment: wireless("00:00:00:00:00:01", "Office"),
                connected_at: at(hour, 0),
            })
            .expect("insert interval");
        closes.push(IntervalClose {
            interval_id: id,
            disconnected_at: at(hour, 30),
            duration_seconds: 1800,
        });
    }
    db.commit_cycle(&CycleCommit {
        closes,
        ..CycleCommit::default()
    })
    .expect("commit closes");
    assert_eq!(
        db.last_disconnected_at(device.id).expect("last disconnect"),
        Some(at(14, 30))
    );

    let conn = Connection::open(&test_db.path).expect("open conn");
    conn.execute(
        r#"
        INSERT INTO connection_interval (
          device_id, is_wired, ap_mac, connected_at, disconnected_at, duration_seconds
        ) VALUES (?1, 0, '00:00:00:00:00:01', '2025-03-03 15:00:00', '2025-03-03 16:45:00', 6300)
        "#,
        params![device.id],
    )
    .expect("insert legacy close");
    conn.execute(
        r#"
        INSERT INTO connection_interval (
          device_id, is_wired, ap_mac, connected_at, disconnected_at, duration_seconds
        ) VALUES (?1, 0, '00:00:00:00:00:01', '2025-03-03T12:00:00+02:00', '2025-03-03T12:10:00+02:00', 600)
        "#,
        params![device.id],
    )
    .expect("insert offset close");

    assert_eq!(
        test_db.db.last_disconnected_at(device.id).expect("last disconnect"),
        Some(at(16, 45))
    );
}

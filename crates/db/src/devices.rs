use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use stalker_core::{NewTrackedDevice, TrackedDevice};

use crate::Db;
use crate::error::{DbError, Result};
use crate::helpers::{AttachmentColumns, DEVICE_COLUMNS, format_ts, row_to_device};

impl Db {
    pub fn list_devices(&self) -> Result<Vec<TrackedDevice>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM tracked_device ORDER BY added_at ASC, id ASC",
            DEVICE_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], row_to_device)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_device(&self, id: i64) -> Result<Option<TrackedDevice>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM tracked_device WHERE id = ?1", DEVICE_COLUMNS),
                params![id],
                row_to_device,
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn get_device_by_mac(&self, mac_address: &str) -> Result<Option<TrackedDevice>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM tracked_device WHERE mac_address = ?1",
                    DEVICE_COLUMNS
                ),
                params![mac_address],
                row_to_device,
            )
            .optional()
            .map_err(DbError::from)
    }

    /// Inserts a device in the disconnected state. The mac must already be
    /// normalized; duplicates fail on the unique constraint.
    pub fn add_device(&self, device: &NewTrackedDevice) -> Result<TrackedDevice> {
        let now = format_ts(Utc::now());
        self.conn.execute(
            r#"
            INSERT INTO tracked_device (mac_address, friendly_name, site_id, added_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                device.mac_address,
                device.friendly_name,
                device.site_id,
                now
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_device(id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn rename_device(&self, id: i64, friendly_name: Option<&str>) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE tracked_device SET friendly_name = ?1 WHERE id = ?2",
            params![friendly_name, id],
        )?;
        Ok(rows > 0)
    }

    /// Removes the device together with its intervals and presence buckets.
    pub fn delete_device(&mut self, id: i64) -> Result<bool> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM connection_interval WHERE device_id = ?1",
            params![id],
        )?;
        tx.execute(
            "DELETE FROM hourly_presence WHERE device_id = ?1",
            params![id],
        )?;
        let rows = tx.execute("DELETE FROM tracked_device WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    pub fn count_devices(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM tracked_device", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|value| value as u64)
            .map_err(DbError::from)
    }

    pub fn count_connected_devices(&self) -> Result<u64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM tracked_device WHERE is_connected = 1",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map(|value| value as u64)
            .map_err(DbError::from)
    }
}

pub(crate) fn write_device_state(conn: &Connection, device: &TrackedDevice) -> Result<usize> {
    let columns = AttachmentColumns::from_attachment(device.attachment.as_ref());
    let rows = conn.execute(
        r#"
        UPDATE tracked_device SET
          last_seen = ?1,
          is_connected = ?2,
          is_blocked = ?3,
          is_wired = ?4,
          current_ip_address = ?5,
          current_ap_mac = ?6,
          current_ap_name = ?7,
          current_ssid = ?8,
          current_radio = ?9,
          current_signal_strength = ?10,
          current_switch_mac = ?11,
          current_switch_name = ?12,
          current_switch_port = ?13
        WHERE id = ?14
        "#,
        params![
            device.last_seen.map(format_ts),
            device.is_connected,
            device.is_blocked,
            device.is_wired,
            device.ip_address,
            columns.ap_mac,
            columns.ap_name,
            columns.ssid,
            columns.radio,
            columns.signal,
            columns.switch_mac,
            columns.switch_name,
            columns.switch_port,
            device.id,
        ],
    )?;
    Ok(rows)
}

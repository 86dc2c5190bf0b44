use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use stalker_core::{ConnectionInterval, normalize_timestamp};

use crate::Db;
use crate::devices::write_device_state;
use crate::error::{DbError, Result};
use crate::helpers::{AttachmentColumns, INTERVAL_COLUMNS, format_ts, row_to_interval};
use crate::settings::{LAST_REFRESH_KEY, write_setting};
use crate::types::{CommitStats, CycleCommit, IntervalOpen};

impl Db {
    /// Open intervals for a device, most recently opened first.
    pub fn open_intervals(&self, device_id: i64) -> Result<Vec<ConnectionInterval>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM connection_interval
            WHERE device_id = ?1 AND disconnected_at IS NULL
            "#,
            INTERVAL_COLUMNS
        ))?;
        let mut rows = stmt
            .query_map(params![device_id], row_to_interval)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.sort_by(|a, b| {
            b.connected_at
                .cmp(&a.connected_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(rows)
    }

    /// Rows written by this crate end in `Z` and sort lexically, so the
    /// newest of those comes straight off the index. Rows in any other
    /// stored format are few and compared after normalization.
    pub fn last_disconnected_at(&self, device_id: i64) -> Result<Option<DateTime<Utc>>> {
        let canonical: Option<String> = self
            .conn
            .query_row(
                r#"
                SELECT disconnected_at
                FROM connection_interval
                WHERE device_id = ?1 AND disconnected_at LIKE '%Z'
                ORDER BY disconnected_at DESC
                LIMIT 1
                "#,
                params![device_id],
                |row| row.get(0),
            )
            .optional()?;
        let mut latest = canonical.map(parse_stored).transpose()?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT disconnected_at
            FROM connection_interval
            WHERE device_id = ?1 AND disconnected_at NOT LIKE '%Z'
            "#,
        )?;
        let mut rows = stmt.query(params![device_id])?;
        while let Some(row) = rows.next()? {
            let value = parse_stored(row.get(0)?)?;
            if latest.is_none_or(|current| value > current) {
                latest = Some(value);
            }
        }
        Ok(latest)
    }

    /// Connection history, newest first.
    pub fn list_intervals(&self, device_id: i64, limit: u32) -> Result<Vec<ConnectionInterval>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM connection_interval
            WHERE device_id = ?1
            ORDER BY connected_at DESC, id DESC
            LIMIT ?2
            "#,
            INTERVAL_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![device_id, limit], row_to_interval)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn insert_interval(&self, open: &IntervalOpen) -> Result<i64> {
        insert_interval(&self.conn, open)
    }

    /// Applies one cycle's writes atomically. Nothing is written if any
    /// statement fails.
    pub fn commit_cycle(&mut self, commit: &CycleCommit) -> Result<CommitStats> {
        let mut stats = CommitStats::default();
        if commit.is_empty() {
            return Ok(stats);
        }
        let tx = self.conn.transaction()?;
        {
            let mut close_stmt = tx.prepare(
                r#"
                UPDATE connection_interval
                SET disconnected_at = ?1, duration_seconds = ?2
                WHERE id = ?3 AND disconnected_at IS NULL
                "#,
            )?;
            for close in &commit.closes {
                stats.intervals_closed += close_stmt.execute(params![
                    format_ts(close.disconnected_at),
                    close.duration_seconds,
                    close.interval_id,
                ])?;
            }
        }
        for open in &commit.opens {
            insert_interval(&tx, open)?;
            stats.intervals_opened += 1;
        }
        for device in &commit.devices {
            stats.devices_updated += write_device_state(&tx, device)?;
        }
        if let Some(refreshed_at) = commit.refreshed_at {
            write_setting(&tx, LAST_REFRESH_KEY, &format_ts(refreshed_at))?;
        }
        tx.commit()?;
        Ok(stats)
    }
}

fn parse_stored(raw: String) -> Result<DateTime<Utc>> {
    normalize_timestamp(&raw).ok_or(DbError::InvalidTimestamp(raw))
}

fn insert_interval(conn: &rusqlite::Connection, open: &IntervalOpen) -> Result<i64> {
    let columns = AttachmentColumns::from_attachment(Some(&open.attachment));
    conn.execute(
        r#"
        INSERT INTO connection_interval (
          device_id, is_wired, ap_mac, ap_name, ssid, signal_strength,
          switch_mac, switch_name, switch_port, connected_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            open.device_id,
            columns.is_wired,
            columns.ap_mac,
            columns.ap_name,
            columns.ssid,
            columns.signal,
            columns.switch_mac,
            columns.switch_name,
            columns.switch_port,
            format_ts(open.connected_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

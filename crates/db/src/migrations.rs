use rusqlite::Connection;

use crate::Db;
use crate::error::Result;

const MIGRATION_0001: &str = include_str!("../migrations/0001_init.sql");
const MIGRATION_0002: &str = include_str!("../migrations/0002_add_wired_devices.sql");
const MIGRATION_0003: &str = include_str!("../migrations/0003_add_hourly_presence.sql");

const MIGRATIONS: &[(&str, &str)] = &[
    ("0001_init", MIGRATION_0001),
    ("0002_add_wired_devices", MIGRATION_0002),
    ("0003_add_hourly_presence", MIGRATION_0003),
];

impl Db {
    pub fn migrate(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        for (name, sql) in MIGRATIONS {
            if *name == "0002_add_wired_devices" {
                if table_has_column(&tx, "tracked_device", "is_wired")? {
                    continue;
                }
                tx.execute_batch(sql)?;
                continue;
            }
            tx.execute_batch(sql)?;
        }
        ensure_interval_indexes(&tx)?;
        tx.commit()?;
        Ok(())
    }
}

pub(crate) fn table_has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn ensure_interval_indexes(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_connection_interval_open ON connection_interval (device_id) WHERE disconnected_at IS NULL",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_connection_interval_closed ON connection_interval (device_id, disconnected_at)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_connection_interval_legacy_close ON connection_interval (device_id) WHERE disconnected_at NOT LIKE '%Z'",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_hourly_presence_device ON hourly_presence (device_id)",
        [],
    )?;
    Ok(())
}

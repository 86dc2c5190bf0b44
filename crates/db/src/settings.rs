use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use stalker_core::normalize_timestamp;

use crate::Db;
use crate::error::Result;
use crate::helpers::format_ts;

pub(crate) const LAST_REFRESH_KEY: &str = "last_refresh";

impl Db {
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM app_setting WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get::<_, String>(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        write_setting(&self.conn, key, value)
    }

    pub fn last_refresh(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .get_setting(LAST_REFRESH_KEY)?
            .and_then(|value| normalize_timestamp(&value)))
    }

    pub fn set_last_refresh(&self, at: DateTime<Utc>) -> Result<()> {
        self.set_setting(LAST_REFRESH_KEY, &format_ts(at))
    }
}

pub(crate) fn write_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO app_setting (key, value)
        VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
        params![key, value],
    )?;
    Ok(())
}

use chrono::{DateTime, Utc};
use rusqlite::params;
use stalker_core::{PRESENCE_SAMPLE_MINUTES, PresenceBucket};

use crate::Db;
use crate::error::Result;
use crate::helpers::{PRESENCE_COLUMNS, format_ts, row_to_presence};

impl Db {
    /// Credits one sample to the given slot for every connected wireless
    /// device. Returns the number of devices sampled.
    pub fn record_presence_samples(
        &mut self,
        day_of_week: u8,
        hour_of_day: u8,
        at: DateTime<Utc>,
    ) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let device_ids = {
            let mut stmt = tx.prepare(
                "SELECT id FROM tracked_device WHERE is_connected = 1 AND is_wired = 0 ORDER BY id ASC",
            )?;
            stmt.query_map([], |row| row.get::<_, i64>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };
        {
            let mut upsert = tx.prepare(
                r#"
                INSERT INTO hourly_presence (
                  device_id, day_of_week, hour_of_day, total_minutes_connected,
                  sample_count, last_updated
                ) VALUES (?1, ?2, ?3, ?4, 1, ?5)
                ON CONFLICT(device_id, day_of_week, hour_of_day) DO UPDATE SET
                  total_minutes_connected = total_minutes_connected + excluded.total_minutes_connected,
                  sample_count = sample_count + 1,
                  last_updated = excluded.last_updated
                "#,
            )?;
            let updated = format_ts(at);
            for device_id in &device_ids {
                upsert.execute(params![
                    device_id,
                    day_of_week,
                    hour_of_day,
                    PRESENCE_SAMPLE_MINUTES,
                    updated
                ])?;
            }
        }
        tx.commit()?;
        Ok(device_ids.len())
    }

    pub fn presence_buckets(&self, device_id: i64) -> Result<Vec<PresenceBucket>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM hourly_presence
            WHERE device_id = ?1
            ORDER BY day_of_week ASC, hour_of_day ASC
            "#,
            PRESENCE_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![device_id], row_to_presence)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

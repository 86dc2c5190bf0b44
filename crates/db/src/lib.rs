mod devices;
mod error;
mod helpers;
mod intervals;
mod migrations;
mod presence;
mod settings;
mod types;

use std::path::Path;

use rusqlite::Connection;

pub use error::{DbError, Result};
pub use helpers::format_ts;
pub use types::{CommitStats, CycleCommit, IntervalClose, IntervalOpen};

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self { conn })
    }
}

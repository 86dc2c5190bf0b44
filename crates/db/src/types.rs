use chrono::{DateTime, Utc};
use stalker_core::{Attachment, TrackedDevice};

/// Close of a single open interval, computed before the commit.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalClose {
    pub interval_id: i64,
    pub disconnected_at: DateTime<Utc>,
    pub duration_seconds: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalOpen {
    pub device_id: i64,
    pub attachment: Attachment,
    pub connected_at: DateTime<Utc>,
}

/// Everything one reconciliation cycle writes. Applied in one transaction:
/// closes first, then opens, then device rows, then the refresh marker.
#[derive(Debug, Clone, Default)]
pub struct CycleCommit {
    pub closes: Vec<IntervalClose>,
    pub opens: Vec<IntervalOpen>,
    pub devices: Vec<TrackedDevice>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl CycleCommit {
    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
            && self.opens.is_empty()
            && self.devices.is_empty()
            && self.refreshed_at.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub intervals_closed: usize,
    pub intervals_opened: usize,
    pub devices_updated: usize,
}

use chrono::{DateTime, Datelike, DurationRound, TimeDelta, Timelike, Utc};
use stalker_db::Db;

use crate::error::Result;

/// Hour-of-week slot, Monday = day 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceSlot {
    pub day_of_week: u8,
    pub hour_of_day: u8,
}

impl PresenceSlot {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            day_of_week: now.weekday().num_days_from_monday() as u8,
            hour_of_day: now.hour() as u8,
        }
    }
}

/// First top-of-hour strictly after `now`.
pub fn next_hour_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let hour = TimeDelta::hours(1);
    now.duration_trunc(hour).unwrap_or(now) + hour
}

/// Credits the slot containing `now` for every connected wireless device.
/// Returns how many devices were sampled.
pub fn aggregate_hourly_presence(db: &mut Db, now: DateTime<Utc>) -> Result<usize> {
    let slot = PresenceSlot::at(now);
    let sampled = db.record_presence_samples(slot.day_of_week, slot.hour_of_day, now)?;
    tracing::info!(
        day = slot.day_of_week,
        hour = slot.hour_of_day,
        sampled,
        "recorded hourly presence"
    );
    Ok(sampled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn slot_uses_monday_as_day_zero() {
        let monday = Utc.with_ymd_and_hms(2025, 3, 3, 14, 0, 0).unwrap();
        let sunday = Utc.with_ymd_and_hms(2025, 3, 9, 23, 59, 59).unwrap();
        assert_eq!(
            PresenceSlot::at(monday),
            PresenceSlot {
                day_of_week: 0,
                hour_of_day: 14
            }
        );
        assert_eq!(
            PresenceSlot::at(sunday),
            PresenceSlot {
                day_of_week: 6,
                hour_of_day: 23
            }
        );
    }

    #[test]
    fn next_boundary_is_strictly_later() {
        let mid = Utc.with_ymd_and_hms(2025, 3, 3, 14, 12, 30).unwrap();
        let exact = Utc.with_ymd_and_hms(2025, 3, 3, 14, 0, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 3, 3, 15, 0, 0).unwrap();
        assert_eq!(next_hour_boundary(mid), expected);
        assert_eq!(next_hour_boundary(exact), expected);
    }
}

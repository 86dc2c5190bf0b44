use chrono::{DateTime, Utc};
use stalker_core::{
    Attachment, ClientDescriptor, ConnectionInterval, DeviceEvent, EventType, TrackedDevice,
    interval_duration_seconds,
};
use stalker_db::{IntervalClose, IntervalOpen};

/// Stored state of one device, read before anything in the cycle is written.
#[derive(Debug, Clone, Copy)]
pub struct PlanInput<'a> {
    pub device: &'a TrackedDevice,
    /// Open intervals, most recently opened first.
    pub open_intervals: &'a [ConnectionInterval],
    pub last_disconnected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Disconnected and still absent.
    Idle,
    Connected,
    Disconnected,
    Roamed,
    /// Still at the same location; telemetry only.
    Refreshed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DevicePlan {
    /// Device row as it should be stored after the cycle.
    pub device: TrackedDevice,
    pub transition: Transition,
    pub closes: Vec<IntervalClose>,
    pub open: Option<IntervalOpen>,
    pub events: Vec<DeviceEvent>,
    /// Stale open intervals closed to restore the single-open invariant.
    pub healed: usize,
    device_changed: bool,
}

impl DevicePlan {
    pub fn device_changed(&self) -> bool {
        self.device_changed
    }

    pub fn mutates_intervals(&self) -> bool {
        !self.closes.is_empty() || self.open.is_some()
    }
}

/// Decides what happens to one device given its stored state, its entry in
/// the snapshot (`None` = not attached) and a blocked-status lookup (`None`
/// = lookup failed, skip the check). Pure: the result depends only on the
/// arguments.
pub fn plan_device(
    input: PlanInput<'_>,
    descriptor: Option<&ClientDescriptor>,
    blocked: Option<bool>,
    now: DateTime<Utc>,
) -> DevicePlan {
    let prior = input.device;
    let mut next = prior.clone();
    let mut closes = Vec::new();
    let mut open = None;
    let mut events = Vec::new();

    // While connected the newest open interval is the live one. Everything
    // else still open is stale.
    let (current, stale_from) = match (prior.is_connected, input.open_intervals.first()) {
        (true, Some(first)) => (Some(first), 1),
        _ => (None, 0),
    };
    let mut heal_end: Option<DateTime<Utc>> = None;
    for (idx, interval) in input.open_intervals.iter().enumerate().skip(stale_from) {
        let close_at = if idx == 0 {
            prior.last_seen.unwrap_or(now)
        } else {
            input.open_intervals[idx - 1].connected_at
        }
        .max(interval.connected_at);
        tracing::warn!(
            device = %prior.mac_address,
            interval_id = interval.id,
            "closing stale open interval"
        );
        closes.push(close_interval(interval, close_at));
        heal_end = heal_end.max(Some(close_at));
    }
    let healed = closes.len();

    let transition = match (prior.is_connected, descriptor) {
        (false, None) => Transition::Idle,
        (false, Some(descriptor)) => {
            let offline_since = input.last_disconnected_at.max(heal_end);
            apply_descriptor(&mut next, descriptor, now);
            open = Some(open_interval(prior.id, &descriptor.attachment, now));
            events.push(event(
                EventType::Connected,
                &next,
                Some(&descriptor.attachment),
                offline_since.map(|since| (now - since).num_seconds().max(0)),
                now,
            ));
            Transition::Connected
        }
        (true, None) => {
            if let Some(current) = current {
                closes.push(close_interval(current, now));
            }
            let last_location = prior
                .attachment
                .clone()
                .or_else(|| current.map(|interval| interval.attachment.clone()));
            next.is_connected = false;
            next.attachment = None;
            next.ip_address = None;
            events.push(event(
                EventType::Disconnected,
                &next,
                last_location.as_ref(),
                None,
                now,
            ));
            Transition::Disconnected
        }
        (true, Some(descriptor)) => {
            let stored_location = current
                .map(|interval| &interval.attachment)
                .or(prior.attachment.as_ref());
            let same_location = stored_location
                .is_some_and(|location| location.same_location(&descriptor.attachment));
            apply_descriptor(&mut next, descriptor, now);
            match current {
                Some(_) if same_location => Transition::Refreshed,
                None if same_location => {
                    // Connected with nothing open: reopen quietly.
                    tracing::warn!(
                        device = %prior.mac_address,
                        "connected device had no open interval"
                    );
                    open = Some(open_interval(prior.id, &descriptor.attachment, now));
                    Transition::Refreshed
                }
                _ => {
                    if let Some(current) = current {
                        closes.push(close_interval(current, now));
                    }
                    open = Some(open_interval(prior.id, &descriptor.attachment, now));
                    events.push(event(
                        EventType::Roamed,
                        &next,
                        Some(&descriptor.attachment),
                        None,
                        now,
                    ));
                    Transition::Roamed
                }
            }
        }
    };

    if let Some(blocked) = blocked.filter(|blocked| *blocked != prior.is_blocked) {
        next.is_blocked = blocked;
        let event_type = if blocked {
            EventType::Blocked
        } else {
            EventType::Unblocked
        };
        let location = next.attachment.clone();
        events.push(event(event_type, &next, location.as_ref(), None, now));
    }

    let device_changed = next != *prior;
    DevicePlan {
        device: next,
        transition,
        closes,
        open,
        events,
        healed,
        device_changed,
    }
}

fn apply_descriptor(device: &mut TrackedDevice, descriptor: &ClientDescriptor, now: DateTime<Utc>) {
    device.is_connected = true;
    device.is_wired = descriptor.is_wired();
    device.attachment = Some(descriptor.attachment.clone());
    device.ip_address = descriptor.ip_address.clone();
    device.last_seen = Some(now);
}

fn close_interval(interval: &ConnectionInterval, at: DateTime<Utc>) -> IntervalClose {
    IntervalClose {
        interval_id: interval.id,
        disconnected_at: at,
        duration_seconds: interval_duration_seconds(interval.connected_at, at),
    }
}

fn open_interval(device_id: i64, attachment: &Attachment, at: DateTime<Utc>) -> IntervalOpen {
    IntervalOpen {
        device_id,
        attachment: attachment.clone(),
        connected_at: at,
    }
}

fn event(
    event_type: EventType,
    device: &TrackedDevice,
    location: Option<&Attachment>,
    offline_duration: Option<i64>,
    now: DateTime<Utc>,
) -> DeviceEvent {
    DeviceEvent {
        event_type,
        device_id: device.id,
        mac_address: device.mac_address.clone(),
        display_name: device.display_name().to_string(),
        location_name: location.map(Attachment::location_name),
        signal: location.and_then(Attachment::signal),
        offline_duration,
        occurred_at: now,
    }
}

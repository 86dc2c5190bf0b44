use chrono::{DateTime, Utc};
use stalker_core::{EventType, TrackedDevice};
use stalker_db::{CycleCommit, Db};

use crate::error::{EngineError, Result};
use crate::notify::Dispatcher;
use crate::planner::{DevicePlan, PlanInput, Transition, plan_device};
use crate::provider::SnapshotProvider;
use crate::types::CycleReport;

/// Reconciles every tracked device against one fresh snapshot. All writes
/// land in a single transaction; notifications go out only after it commits.
pub async fn refresh_tracked_devices(
    db: &mut Db,
    provider: &dyn SnapshotProvider,
    dispatcher: &Dispatcher,
    now: DateTime<Utc>,
) -> Result<CycleReport> {
    let devices = db.list_devices()?;
    if devices.is_empty() {
        tracing::debug!("no tracked devices, skipping refresh");
        return Ok(CycleReport::default());
    }
    reconcile(db, provider, dispatcher, devices, now, Some(now)).await
}

/// Same transition logic for a single device, e.g. right after it is
/// tracked. Does not touch the last-refresh marker.
pub async fn refresh_device(
    db: &mut Db,
    provider: &dyn SnapshotProvider,
    dispatcher: &Dispatcher,
    device_id: i64,
    now: DateTime<Utc>,
) -> Result<CycleReport> {
    let device = db
        .get_device(device_id)?
        .ok_or(EngineError::DeviceNotFound(device_id))?;
    reconcile(db, provider, dispatcher, vec![device], now, None).await
}

async fn reconcile(
    db: &mut Db,
    provider: &dyn SnapshotProvider,
    dispatcher: &Dispatcher,
    devices: Vec<TrackedDevice>,
    now: DateTime<Utc>,
    refreshed_at: Option<DateTime<Utc>>,
) -> Result<CycleReport> {
    let snapshot = provider
        .fetch_clients()
        .await
        .map_err(EngineError::ProviderUnavailable)?;
    tracing::debug!(
        tracked = devices.len(),
        visible = snapshot.len(),
        "fetched client snapshot"
    );

    let mut report = CycleReport {
        devices_checked: devices.len(),
        ..CycleReport::default()
    };

    let mut blocked = Vec::with_capacity(devices.len());
    for device in &devices {
        match provider.is_blocked(&device.mac_address).await {
            Ok(value) => blocked.push(Some(value)),
            Err(err) => {
                report.lookup_failures += 1;
                tracing::debug!(
                    device = %device.mac_address,
                    error = %err,
                    "blocked lookup failed, skipping check"
                );
                blocked.push(None);
            }
        }
    }

    // Every plan reads only stored state, so the order devices are planned
    // in does not matter.
    let mut plans = Vec::with_capacity(devices.len());
    for (device, blocked) in devices.iter().zip(blocked) {
        let open_intervals = db.open_intervals(device.id)?;
        let last_disconnected_at = db.last_disconnected_at(device.id)?;
        let plan = plan_device(
            PlanInput {
                device,
                open_intervals: &open_intervals,
                last_disconnected_at,
            },
            snapshot.get(&device.mac_address),
            blocked,
            now,
        );
        log_plan(device, &plan);
        plans.push(plan);
    }

    let mut commit = CycleCommit {
        refreshed_at,
        ..CycleCommit::default()
    };
    for plan in &plans {
        report.count(plan.transition);
        report.intervals_healed += plan.healed;
        report.blocked_changes += plan
            .events
            .iter()
            .filter(|event| matches!(event.event_type, EventType::Blocked | EventType::Unblocked))
            .count();
        commit.closes.extend(plan.closes.iter().cloned());
        commit.opens.extend(plan.open.iter().cloned());
        if plan.device_changed() {
            commit.devices.push(plan.device.clone());
        }
    }
    let stats = db.commit_cycle(&commit)?;
    report.intervals_closed = stats.intervals_closed;
    report.intervals_opened = stats.intervals_opened;

    for plan in &plans {
        for event in &plan.events {
            report.events_emitted += 1;
            report.delivery_failures += dispatcher.dispatch(event, &plan.device).await;
        }
    }

    if report.has_transitions() || report.intervals_healed > 0 {
        tracing::info!(
            checked = report.devices_checked,
            connected = report.connected,
            disconnected = report.disconnected,
            roamed = report.roamed,
            blocked_changes = report.blocked_changes,
            healed = report.intervals_healed,
            "reconciliation cycle finished"
        );
    } else {
        tracing::debug!(checked = report.devices_checked, "reconciliation cycle finished");
    }
    Ok(report)
}

fn log_plan(device: &TrackedDevice, plan: &DevicePlan) {
    let location = plan
        .device
        .attachment
        .as_ref()
        .map(|attachment| attachment.location_name());
    match plan.transition {
        Transition::Idle | Transition::Refreshed => {
            tracing::debug!(device = %device.mac_address, transition = ?plan.transition, "no transition");
        }
        Transition::Connected | Transition::Roamed => {
            tracing::info!(
                device = %device.mac_address,
                transition = ?plan.transition,
                location = location.as_deref().unwrap_or("-"),
                "device transition"
            );
        }
        Transition::Disconnected => {
            tracing::info!(device = %device.mac_address, "device disconnected");
        }
    }
}

use std::sync::Arc;

use chrono::Utc;
use reconcile::{
    CycleReport, Dispatcher, EngineError, ProviderSession, aggregate_hourly_presence,
    next_hour_boundary, refresh_device, refresh_tracked_devices,
};
use tokio::runtime::Handle;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::app::AppState;
use crate::error::{AppError, Result};

#[derive(Clone, Copy)]
enum RefreshTarget {
    All,
    Device(i64),
}

struct Jobs {
    state: AppState,
    session: Arc<ProviderSession>,
    dispatcher: Arc<Dispatcher>,
    // Held for the whole of a refresh so scheduled and ad hoc runs never
    // overlap.
    refresh_lock: Mutex<()>,
}

/// Owns the periodic refresh and hourly presence jobs.
pub struct Scheduler {
    jobs: Arc<Jobs>,
    cancel_token: Option<CancellationToken>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(state: AppState, session: Arc<ProviderSession>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            jobs: Arc::new(Jobs {
                state,
                session,
                dispatcher,
                refresh_lock: Mutex::new(()),
            }),
            cancel_token: None,
            handles: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel_token.is_some()
    }

    /// Spawns both jobs. Each runs once right away, presence after the first
    /// refresh has finished.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(AppError::Message("scheduler already running".to_string()));
        }
        let cancel_token = CancellationToken::new();
        let (first_refresh_tx, first_refresh_rx) = oneshot::channel();
        self.handles.push(tokio::spawn(refresh_loop(
            Arc::clone(&self.jobs),
            cancel_token.clone(),
            first_refresh_tx,
        )));
        self.handles.push(tokio::spawn(presence_loop(
            Arc::clone(&self.jobs),
            cancel_token.clone(),
            first_refresh_rx,
        )));
        self.cancel_token = Some(cancel_token);
        tracing::info!(
            refresh_interval_secs = self.jobs.state.config.refresh_interval.as_secs(),
            "scheduler started"
        );
        Ok(())
    }

    /// Stops both jobs. A cycle in progress finishes first.
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        for handle in self.handles.drain(..) {
            handle
                .await
                .map_err(|err| AppError::Message(format!("scheduler task failed: {err}")))?;
        }
        tracing::info!("scheduler stopped");
        Ok(())
    }

    pub async fn refresh_now(&self) -> Result<CycleReport> {
        run_refresh(&self.jobs, RefreshTarget::All).await
    }

    /// Reconciles one device immediately, e.g. right after it is tracked.
    pub async fn refresh_device(&self, device_id: i64) -> Result<CycleReport> {
        run_refresh(&self.jobs, RefreshTarget::Device(device_id)).await
    }

    pub async fn aggregate_now(&self) -> Result<usize> {
        run_presence(&self.jobs).await
    }
}

async fn refresh_loop(jobs: Arc<Jobs>, cancel: CancellationToken, first: oneshot::Sender<()>) {
    let mut first = Some(first);
    let mut ticker = tokio::time::interval(jobs.state.config.refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = run_refresh(&jobs, RefreshTarget::All).await {
                    tracing::error!(error = %err, "device refresh failed");
                }
                if let Some(first) = first.take() {
                    let _ = first.send(());
                }
            }
            _ = cancel.cancelled() => {
                tracing::info!("refresh loop shutting down");
                break;
            }
        }
    }
}

async fn presence_loop(jobs: Arc<Jobs>, cancel: CancellationToken, first: oneshot::Receiver<()>) {
    // A dropped sender means the refresh loop stopped before its first
    // cycle, so there is nothing fresh to sample.
    tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        first = first => {
            if first.is_err() {
                return;
            }
            if let Err(err) = run_presence(&jobs).await {
                tracing::error!(error = %err, "presence aggregation failed");
            }
        }
    }

    loop {
        let now = Utc::now();
        let wait = (next_hour_boundary(now) - now)
            .to_std()
            .unwrap_or(Duration::ZERO);
        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                if let Err(err) = run_presence(&jobs).await {
                    tracing::error!(error = %err, "presence aggregation failed");
                }
            }
            _ = cancel.cancelled() => {
                tracing::info!("presence loop shutting down");
                break;
            }
        }
    }
}

/// Runs one cycle on the blocking pool since every rusqlite call in it
/// blocks. The provider and notifier futures are driven from there through
/// the runtime handle.
async fn run_refresh(jobs: &Arc<Jobs>, target: RefreshTarget) -> Result<CycleReport> {
    let _guard = jobs.refresh_lock.lock().await;
    let provider = connect(jobs).await?;
    let cycle_jobs = Arc::clone(jobs);
    let handle = Handle::current();
    let result = tokio::task::spawn_blocking(move || -> Result<_> {
        let mut db = cycle_jobs.state.open_db()?;
        let dispatcher = cycle_jobs.dispatcher.as_ref();
        let now = Utc::now();
        Ok(handle.block_on(async {
            match target {
                RefreshTarget::All => {
                    refresh_tracked_devices(&mut db, provider.as_ref(), dispatcher, now).await
                }
                RefreshTarget::Device(device_id) => {
                    refresh_device(&mut db, provider.as_ref(), dispatcher, device_id, now).await
                }
            }
        }))
    })
    .await
    .map_err(|err| AppError::Message(format!("refresh task failed: {err}")))??;
    settle(jobs, result).await
}

async fn connect(jobs: &Jobs) -> Result<Arc<dyn reconcile::SnapshotProvider>> {
    match jobs.session.get().await {
        Ok(provider) => Ok(provider),
        Err(err) => {
            tracing::warn!(error = %err, "snapshot provider unreachable");
            Err(EngineError::ProviderUnavailable(err).into())
        }
    }
}

async fn settle(
    jobs: &Jobs,
    result: std::result::Result<CycleReport, EngineError>,
) -> Result<CycleReport> {
    match result {
        Ok(report) => Ok(report),
        Err(err) => {
            if err.should_reconnect() {
                tracing::warn!(error = %err, "dropping provider session");
                jobs.session.invalidate().await;
            }
            Err(err.into())
        }
    }
}

async fn run_presence(jobs: &Jobs) -> Result<usize> {
    let state = jobs.state.clone();
    tokio::task::spawn_blocking(move || -> Result<usize> {
        let mut db = state.open_db()?;
        Ok(aggregate_hourly_presence(&mut db, Utc::now())?)
    })
    .await
    .map_err(|err| AppError::Message(format!("presence task failed: {err}")))?
}

mod args;
mod config;
mod dirs;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use args::Command;
use config::ConfigLoad;
use reconcile::{JsonFileConnector, ProviderSession};
use stalker_app::{AppConfig, AppPaths, AppState, Scheduler, build_dispatcher, ensure_app_data_dir};
use stalker_core::{DAYS_PER_WEEK, HOURS_PER_DAY, TrackedDevice};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_FILTER: &str = "wifi_stalker=info,reconcile=info,stalker_app=info,warn";
const WEEKDAYS: [&str; DAYS_PER_WEEK] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let args = args::parse_args().map_err(|err| {
        eprintln!("{err}");
        args::print_help();
        io::Error::new(io::ErrorKind::InvalidInput, "invalid arguments")
    })?;

    let config = config::load_or_create(args.config.as_deref()).map_err(io::Error::other)?;
    if config.created {
        println!("Created config at {}.", config.paths.file.display());
    }

    let data_dir = dirs::resolve_data_dir().map_err(io::Error::other)?;
    let paths = AppPaths::new(data_dir).with_db_path(config.db_path());
    ensure_app_data_dir(&paths).map_err(|err| io::Error::other(err.to_string()))?;

    let mut app_config = AppConfig::new(paths.db_path);
    app_config.site_id = config.config.site_id.clone();
    app_config.refresh_interval = Duration::from_secs(config.config.refresh_interval_secs);
    let app_state = AppState::new(app_config);
    app_state.setup_db().map_err(|err| {
        io::Error::other(format!("failed to initialize database: {}", err))
    })?;
    tracing::info!(db = %app_state.config.db_path.display(), "database ready");

    match args.command {
        Command::Run => run(app_state, &config).await?,
        Command::Track { mac, name, site } => {
            let device = app_state.services.devices.track(
                &mac,
                name.as_deref(),
                site.as_deref(),
            )?;
            println!("Tracking {} ({}).", device.display_name(), device.mac_address);
            let scheduler = scheduler(app_state, &config)?;
            match scheduler.refresh_device(device.id).await {
                Ok(report) if report.connected > 0 => println!("Device is online now."),
                Ok(_) => println!("Device is not currently attached."),
                Err(err) => eprintln!("initial refresh skipped: {}", err),
            }
        }
        Command::Untrack { mac } => {
            app_state.services.devices.untrack(&mac)?;
            println!("Stopped tracking {mac}.");
        }
        Command::Rename { mac, name } => {
            let device = app_state.services.devices.rename(&mac, name.as_deref())?;
            println!("{} is now {}.", device.mac_address, device.display_name());
        }
        Command::Devices => {
            let devices = app_state.services.devices.list()?;
            if devices.is_empty() {
                println!("No tracked devices.");
            }
            for device in &devices {
                println!("{}", describe_device(device));
            }
        }
        Command::History { mac, limit } => {
            for interval in app_state.services.devices.history(&mac, limit)? {
                let until = interval
                    .disconnected_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "now".to_string());
                let duration = interval
                    .duration_seconds
                    .map(|secs| format!(" ({}m)", secs / 60))
                    .unwrap_or_default();
                println!(
                    "{} .. {}{}  {}",
                    interval.connected_at.to_rfc3339(),
                    until,
                    duration,
                    interval.attachment.location_name()
                );
            }
        }
        Command::Heatmap { mac } => {
            let grid = app_state.services.presence.heatmap(&mac)?;
            let header: String = (0..HOURS_PER_DAY).map(|hour| format!("{hour:>4}")).collect();
            println!("    {header}");
            for (day, hours) in grid.slots.iter().enumerate() {
                let row: String = hours
                    .iter()
                    .map(|slot| match slot {
                        Some(avg) => format!("{:>4.0}", avg),
                        None => "   .".to_string(),
                    })
                    .collect();
                println!("{} {row}", WEEKDAYS[day]);
            }
        }
        Command::Status => {
            let status = app_state.services.status.snapshot()?;
            let last = status
                .last_refresh
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "never".to_string());
            println!("Tracked devices:   {}", status.tracked_devices);
            println!("Connected devices: {}", status.connected_devices);
            println!("Last refresh:      {}", last);
            println!("Refresh interval:  {}s", status.refresh_interval_seconds);
        }
    }

    Ok(())
}

fn scheduler(app_state: AppState, config: &ConfigLoad) -> Result<Scheduler, Box<dyn std::error::Error>> {
    let connector = JsonFileConnector::new(config.snapshot_path());
    let session = Arc::new(ProviderSession::new(Arc::new(connector)));
    let dispatcher = Arc::new(build_dispatcher(&config.config.notifiers)?);
    Ok(Scheduler::new(app_state, session, dispatcher))
}

async fn run(app_state: AppState, config: &ConfigLoad) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Polling {} every {}s. Press Ctrl+C to stop.",
        config.snapshot_path().display(),
        config.config.refresh_interval_secs
    );
    let mut scheduler = scheduler(app_state, config)?;
    scheduler.start()?;
    shutdown_signal().await;
    scheduler.shutdown().await?;
    Ok(())
}

fn describe_device(device: &TrackedDevice) -> String {
    let state = if device.is_connected {
        device
            .attachment
            .as_ref()
            .map(|attachment| format!("online @ {}", attachment.location_name()))
            .unwrap_or_else(|| "online".to_string())
    } else {
        "offline".to_string()
    };
    let blocked = if device.is_blocked { " [blocked]" } else { "" };
    format!(
        "{}  {:<24} {}{}",
        device.mac_address,
        device.display_name(),
        state,
        blocked
    )
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

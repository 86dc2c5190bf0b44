pub mod app;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod services;
pub mod startup;

pub use app::{AppConfig, AppState};
pub use config::{NotifierConfig, NotifierKind, build_dispatcher};
pub use error::{AppError, Result};
pub use scheduler::Scheduler;
pub use services::AppServices;
pub use startup::{AppPaths, ensure_app_data_dir};

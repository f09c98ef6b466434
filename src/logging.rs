//! Logging setup. The terminal belongs to the UI, so logs go to a file.

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::app_dirs::AppDirs;

fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "focusbeat=warn",
        1 => "focusbeat=info",
        2 => "focusbeat=debug",
        _ => "focusbeat=trace",
    }
}

/// Start file logging. `RUST_LOG` wins over the verbosity count. Logging
/// is skipped when no log file can be opened.
pub fn init_logging(verbose: u8) {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(verbose >= 2)
        .init();

    tracing::debug!("focusbeat started with verbosity level: {}", verbose);
}

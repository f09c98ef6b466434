use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "focusbeat";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "focusbeat.log";

/// Where focusbeat keeps its files. Saved defaults go to the platform config
/// dir; the log goes to the state dir where there is one, else local data.
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(format!("{APP_NAME}_{CONFIG_FILE}")))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::project().map(|pd| {
            pd.state_dir()
                .unwrap_or_else(|| pd.data_local_dir())
                .join(LOG_FILE)
        })
    }
}

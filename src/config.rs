use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::phase::{PhasePlan, DEFAULT_BREAK_SECS, DEFAULT_STUDY_SECS, DEFAULT_UNIT_MINUTES};
use crate::sync::DEFAULT_VOLUME;

/// Saved defaults. Preferences only; no session state is ever written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub total_minutes: u32,
    pub video_reference: Option<String>,
    pub volume: u8,
    pub unit_minutes: u32,
    pub study_minutes: u32,
    pub review_minutes: Option<u32>,
    pub break_minutes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            total_minutes: 120,
            video_reference: None,
            volume: DEFAULT_VOLUME,
            unit_minutes: DEFAULT_UNIT_MINUTES,
            study_minutes: DEFAULT_STUDY_SECS / 60,
            review_minutes: None,
            break_minutes: DEFAULT_BREAK_SECS / 60,
        }
    }
}

/// Longest accepted study, review or break phase: one day
pub const MAX_PHASE_MINUTES: u32 = 24 * 60;

fn phase_secs(minutes: u32) -> u32 {
    minutes.min(MAX_PHASE_MINUTES) * 60
}

impl Config {
    /// Phase lengths from a hand-edited file are clamped to
    /// [`MAX_PHASE_MINUTES`].
    pub fn phase_plan(&self) -> PhasePlan {
        PhasePlan {
            unit_minutes: self.unit_minutes.max(1),
            study_secs: phase_secs(self.study_minutes.max(1)),
            review_secs: self.review_minutes.filter(|m| *m > 0).map(phase_secs),
            break_secs: phase_secs(self.break_minutes),
            ..PhasePlan::default()
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => tracing::warn!(path = %self.path.display(), "ignoring bad config: {e}"),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            total_minutes: 90,
            video_reference: Some("https://youtu.be/dQw4w9WgXcQ".into()),
            volume: 70,
            unit_minutes: 45,
            study_minutes: 35,
            review_minutes: Some(5),
            break_minutes: 5,
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_or_corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"total_minutes": 60}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.total_minutes, 60);
        assert_eq!(cfg.volume, DEFAULT_VOLUME);
    }

    #[test]
    fn oversized_phases_are_clamped() {
        let cfg = Config {
            study_minutes: 80_000_000,
            review_minutes: Some(u32::MAX),
            break_minutes: 5_000,
            ..Config::default()
        };
        let plan = cfg.phase_plan();
        assert_eq!(plan.study_secs, MAX_PHASE_MINUTES * 60);
        assert_eq!(plan.review_secs, Some(MAX_PHASE_MINUTES * 60));
        assert_eq!(plan.break_secs, MAX_PHASE_MINUTES * 60);
    }

    #[test]
    fn oversized_file_values_load_without_panicking() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"study_minutes": 4000000000, "break_minutes": 90000000}"#).unwrap();
        let plan = FileConfigStore::with_path(&path).load().phase_plan();
        assert_eq!(plan.study_secs, 86_400);
        assert_eq!(plan.break_secs, 86_400);
    }

    #[test]
    fn plan_from_config() {
        let cfg = Config {
            review_minutes: Some(5),
            ..Config::default()
        };
        let plan = cfg.phase_plan();
        assert_eq!(plan.study_secs, 25 * 60);
        assert_eq!(plan.review_secs, Some(300));
        assert_eq!(plan.break_secs, 300);
        assert_eq!(plan.unit_minutes, 30);

        let no_review = Config {
            review_minutes: Some(0),
            ..Config::default()
        };
        assert!(!no_review.phase_plan().has_review());
    }
}

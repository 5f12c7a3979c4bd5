// Settings storage
// JSON file persistence for settings and stats counters, with
// defaults-merge on load, validation at the save boundary, version
// backups and in-process change notification.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::warn;

use crate::models::{Settings, Stats, SuspicionTier, ThresholdError};

const BACKUP_KEEP: usize = 10;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ThresholdError),
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreFile {
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    stats: Stats,
}

pub struct SettingsStore {
    config_dir: PathBuf,
    config_file: PathBuf,
    changes: watch::Sender<Settings>,
}

impl SettingsStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("settings.json");
        let initial = read_file(&config_file)
            .map(|f| f.settings)
            .unwrap_or_default();
        let (changes, _) = watch::channel(initial);
        Self { config_dir, config_file, changes }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("slopsift"))
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.config_dir)?;
        Ok(())
    }

    /// Load settings from file; a missing file yields defaults and a
    /// partial file is merged over them.
    pub fn load(&self) -> Result<Settings, StoreError> {
        Ok(self.load_file()?.settings)
    }

    pub fn load_stats(&self) -> Result<Stats, StoreError> {
        Ok(self.load_file()?.stats)
    }

    fn load_file(&self) -> Result<StoreFile, StoreError> {
        if !self.config_file.exists() {
            return Ok(StoreFile::default());
        }
        read_file(&self.config_file)
    }

    /// Persist a settings snapshot and notify subscribers. Malformed
    /// thresholds are rejected here; the file is left untouched.
    pub fn save(&self, settings: Settings) -> Result<(), StoreError> {
        settings.thresholds.validate()?;

        let mut file = self.load_file().unwrap_or_default();
        file.settings = settings;
        self.write_file(&file, true)?;

        self.changes.send_replace(settings);
        Ok(())
    }

    /// Subscribe to settings changes. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.changes.subscribe()
    }

    /// Bump a tier counter. Best-effort telemetry: failures are logged
    /// and swallowed so a store problem can never affect classification.
    pub fn increment_stat(&self, tier: SuspicionTier) {
        if tier == SuspicionTier::Clean {
            return;
        }
        let result = self.load_file().and_then(|mut file| {
            file.stats.increment(tier);
            self.write_file(&file, false)
        });
        if let Err(e) = result {
            warn!(tier = %tier, "failed to persist stat increment: {e}");
        }
    }

    pub fn reset_stats(&self) -> Result<(), StoreError> {
        let mut file = self.load_file()?;
        file.stats = Stats::default();
        self.write_file(&file, false)
    }

    fn write_file(&self, file: &StoreFile, backup: bool) -> Result<(), StoreError> {
        self.ensure_dir()?;
        if backup && self.config_file.exists() {
            self.create_backup()?;
        }
        let content = serde_json::to_string_pretty(file)?;
        fs::write(&self.config_file, content)?;
        Ok(())
    }

    fn create_backup(&self) -> Result<(), StoreError> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%3f");
        let backup_file = backup_dir.join(format!("settings_{}.json", timestamp));
        fs::copy(&self.config_file, &backup_file)?;

        self.cleanup_old_backups(&backup_dir, BACKUP_KEEP);
        Ok(())
    }

    fn cleanup_old_backups(&self, backup_dir: &PathBuf, keep: usize) {
        let mut entries: Vec<_> = match fs::read_dir(backup_dir) {
            Ok(rd) => rd
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                .collect(),
            Err(_) => return,
        };

        if entries.len() <= keep {
            return;
        }

        entries.sort_by_key(|e| {
            e.metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        });

        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }
    }
}

fn read_file(path: &PathBuf) -> Result<StoreFile, StoreError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

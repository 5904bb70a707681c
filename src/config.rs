use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timing: TimingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// CPU measurement window in milliseconds. Doubles as the throttle:
    /// repeat samples for a pid inside this window return zeros.
    pub cpu_sample_ms: u64,
    /// Minimum seconds between full stale-entry sweeps of the process cache.
    pub cache_cleanup_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            cpu_sample_ms: 250,
            cache_cleanup_secs: 60,
        }
    }
}

impl TimingConfig {
    pub fn cpu_sample_interval(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_ms)
    }

    pub fn cache_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cache_cleanup_secs)
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("focustat").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

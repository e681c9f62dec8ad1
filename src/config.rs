//! Probe settings, persisted as JSON next to the other probe files.

use crate::collaborators::DEFAULT_BEACON_URL;
use crate::paths::{config_file, PathConfig, SETTINGS_FILE};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

/// Probe settings
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ProbeSettings {
    // Tracking beacon
    pub beacon_enabled: bool,
    pub beacon_url: String,
    pub beacon_timeout_ms: u64,
    pub beacon_queue: usize, // Pending hits before new ones are dropped

    // Control panel server
    pub server_port: u16,

    // Scenario host
    pub host_version: String, // Offered in handshakeVersion
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            beacon_enabled: true,
            beacon_url: DEFAULT_BEACON_URL.to_string(),
            beacon_timeout_ms: 2000,
            beacon_queue: 64,
            server_port: 9876,
            host_version: "2.0".to_string(),
        }
    }
}

impl ProbeSettings {
    /// Load from the resolved config dir. Missing file means defaults.
    pub fn load(paths: &PathConfig) -> Result<Self> {
        Self::load_from(&config_file(SETTINGS_FILE, paths))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write settings: {}", path.display()))
    }

    pub fn beacon_timeout(&self) -> Duration {
        Duration::from_millis(self.beacon_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("vpaid_probe_{}_{}", name, std::process::id()));
        let _ = std::fs::create_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = temp_dir("missing");
        let paths = PathConfig { config_dir: Some(dir.join("nowhere")) };
        assert_eq!(ProbeSettings::load(&paths).unwrap(), ProbeSettings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = temp_dir("partial");
        std::fs::write(dir.join(SETTINGS_FILE), r#"{"server_port": 8080, "beacon_enabled": false}"#)
            .unwrap();

        let settings = ProbeSettings::load(&PathConfig { config_dir: Some(dir.clone()) }).unwrap();
        assert_eq!(settings.server_port, 8080);
        assert!(!settings.beacon_enabled);
        assert_eq!(settings.beacon_url, DEFAULT_BEACON_URL);
        assert_eq!(settings.beacon_timeout(), Duration::from_millis(2000));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_then_load() {
        let dir = temp_dir("save");
        let path = dir.join(SETTINGS_FILE);
        let settings = ProbeSettings { host_version: "1.1".into(), ..Default::default() };
        settings.save_to(&path).unwrap();
        assert_eq!(ProbeSettings::load_from(&path).unwrap(), settings);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let dir = temp_dir("bad");
        let path = dir.join(SETTINGS_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        let err = ProbeSettings::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

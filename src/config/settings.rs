//! Application settings and paths.
//!
//! Settings live in `settings.json` under the XDG config directory. A missing
//! file means defaults; command-line flags override whatever is loaded.

use crate::discovery::ProbeKind;
use crate::error::{ConfigError, ConfigResult};
use crate::progress::ProgressMode;
use crate::types::PortRange;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/netsweep)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the per-user directories.
    pub fn resolve() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "netsweep", "netsweep")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Maximum concurrent connection attempts across all hosts.
    pub concurrency: usize,
    /// Per-connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Per-probe liveness timeout in milliseconds.
    pub ping_timeout_ms: u64,
    /// Liveness probes in flight at once.
    pub discovery_concurrency: usize,
    /// Port range to sweep, "START-END".
    pub ports: String,
    /// Liveness probe implementation.
    pub probe: ProbeKind,
    /// Progress display.
    pub progress: ProgressMode,
    /// Where the per-host checkpoint files go.
    pub output_dir: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            concurrency: 500,
            connect_timeout_ms: 1000,
            ping_timeout_ms: 1000,
            discovery_concurrency: 64,
            ports: PortRange::full().to_string(),
            probe: ProbeKind::default(),
            progress: ProgressMode::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl AppSettings {
    /// Load settings from the default location.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::resolve()?.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to the default location, returning the file written.
    pub fn save(&self) -> ConfigResult<PathBuf> {
        let paths = Paths::resolve()?;
        fs::create_dir_all(&paths.config_dir)?;
        let file = paths.settings_file();
        self.save_to(&file)?;
        Ok(file)
    }

    /// Save settings to a specific file.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// The configured port range.
    pub fn port_range(&self) -> ConfigResult<PortRange> {
        self.ports.parse().map_err(|e: crate::types::PortError| ConfigError::InvalidValue {
            field: "ports",
            reason: e.to_string(),
        })
    }

    /// Reject values the scanner cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.discovery_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "discovery_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.connect_timeout_ms == 0 || self.ping_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                reason: "timeouts must be positive".to_string(),
            });
        }
        self.port_range()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.concurrency, 500);
        assert_eq!(settings.connect_timeout_ms, 1000);
        assert_eq!(settings.port_range().unwrap(), PortRange::full());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "concurrency": 64, "probe": "icmp", "ports": "1-1024" }"#).unwrap();

        let settings = AppSettings::load_from(&path).unwrap();
        assert_eq!(settings.concurrency, 64);
        assert_eq!(settings.probe, ProbeKind::Icmp);
        assert_eq!(settings.port_range().unwrap().len(), 1024);
        assert_eq!(settings.ping_timeout_ms, 1000);
        assert_eq!(settings.progress, ProgressMode::Rows);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        fs::write(&path, r#"{ "concurrency": 0 }"#).unwrap();
        assert!(matches!(
            AppSettings::load_from(&path),
            Err(ConfigError::InvalidValue { field: "concurrency", .. })
        ));

        fs::write(&path, r#"{ "ports": "100-1" }"#).unwrap();
        assert!(matches!(
            AppSettings::load_from(&path),
            Err(ConfigError::InvalidValue { field: "ports", .. })
        ));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            AppSettings::load_from(&path),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let settings = AppSettings {
            concurrency: 128,
            output_dir: PathBuf::from("/tmp/sweeps"),
            ..AppSettings::default()
        };

        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path).unwrap(), settings);
    }
}

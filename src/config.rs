//! Application configuration.
//!
//! Compiled-in defaults live on the `Default` impls; a TOML file under the
//! platform config directory overrides them. Saves are atomic: the file is
//! written to a temporary sibling first and renamed into place, so a crash
//! mid-save never leaves a torn config behind.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::calibration::CalibrationConfig;
use crate::error::ConfigError;
use crate::orientation::{DEFAULT_DECLINATION_DEG, FLAT_THRESHOLD_DEG, SIGNIFICANT_CHANGE_DEG};

/// Orientation-service tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Constant declination correction for the deployment region, degrees.
    pub magnetic_declination_deg: f64,
    /// Tilt threshold for the generic flatness query, degrees.
    pub flat_threshold_deg: f64,
    /// Per-angle threshold for the significant-change query, degrees.
    pub significant_change_deg: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            magnetic_declination_deg: DEFAULT_DECLINATION_DEG,
            flat_threshold_deg: FLAT_THRESHOLD_DEG,
            significant_change_deg: SIGNIFICANT_CHANGE_DEG,
        }
    }
}

/// Root configuration for the core subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sensors: SensorConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
}

impl AppConfig {
    /// Default config file location: `<config_dir>/terralens/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("terralens")
            .join("config.toml")
    }

    /// Loads from `path`, falling back to compiled-in defaults when the
    /// file is missing or does not parse. A bad config file is never fatal.
    pub async fn load(path: &Path) -> Self {
        match fs::read_to_string(path).await {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(config) => {
                    info!("configuration loaded from {}", path.display());
                    config
                }
                Err(err) => {
                    warn!("configuration parse failed, using defaults: {err}");
                    Self::default()
                }
            },
            Err(_) => {
                info!("no configuration at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Saves atomically via a temporary sibling and rename.
    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let serialized = toml::to_string_pretty(self)?;
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, serialized.as_bytes()).await?;
        fs::rename(&tmp, path).await?;
        info!("configuration saved to {}", path.display());
        Ok(())
    }
}

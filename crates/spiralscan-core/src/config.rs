//! Configuration management for Spiralscan.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Coordinate, SpeciesId};
use crate::watch::{SpeciesNames, WatchList};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/spiralscan/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Display names for species ids
    pub species: Vec<SpeciesEntry>,
    /// Accounts handed to the external session provider
    pub accounts: Vec<AccountConfig>,
    /// Centre of the spiral
    pub origin: OriginConfig,
    /// Spiral and polling settings
    pub scanning: ScanningConfig,
    /// Species flagged as wanted
    pub watch: WatchConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults
    /// if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `SPIRALSCAN_STEP_LIMIT`: Override the number of spiral steps
    /// - `SPIRALSCAN_CADENCE_MS`: Override the per-worker query cadence
    /// - `SPIRALSCAN_RETRY_ATTEMPTS`: Override the per-coordinate retry budget
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SPIRALSCAN_STEP_LIMIT") {
            if let Ok(step_limit) = val.parse() {
                self.scanning.step_limit = step_limit;
                tracing::debug!("Override scanning.step_limit from env: {}", step_limit);
            }
        }

        if let Ok(val) = std::env::var("SPIRALSCAN_CADENCE_MS") {
            if let Ok(cadence_ms) = val.parse() {
                self.scanning.cadence_ms = cadence_ms;
                tracing::debug!("Override scanning.cadence_ms from env: {}", cadence_ms);
            }
        }

        if let Ok(val) = std::env::var("SPIRALSCAN_RETRY_ATTEMPTS") {
            if let Ok(attempts) = val.parse() {
                self.scanning.retry_attempts = attempts;
                tracing::debug!("Override scanning.retry_attempts from env: {}", attempts);
            }
        }
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let config_dir = path.parent().ok_or_else(|| ConfigError::InvalidValue {
            field: "config_path".to_string(),
            reason: "no parent directory".to_string(),
        })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check values that the type system cannot.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.origin.coordinate().is_valid() {
            return Err(invalid(
                "origin",
                format!(
                    "({}, {}) is not a valid coordinate",
                    self.origin.latitude, self.origin.longitude
                ),
            ));
        }

        let scanning = &self.scanning;
        if !scanning.step_size.is_finite() || scanning.step_size < 0.0 {
            return Err(invalid(
                "scanning.step_size",
                "must be a finite, non-negative number of degrees",
            ));
        }
        if !scanning.jitter_degrees.is_finite() || scanning.jitter_degrees < 0.0 {
            return Err(invalid(
                "scanning.jitter_degrees",
                "must be a finite, non-negative number of degrees",
            ));
        }
        if scanning.retry_attempts == 0 {
            return Err(invalid("scanning.retry_attempts", "must be at least 1"));
        }
        if scanning.request_timeout_secs == 0 {
            return Err(invalid("scanning.request_timeout_secs", "must be at least 1"));
        }

        Ok(())
    }

    /// The configured watch list.
    #[must_use]
    pub fn watch_list(&self) -> WatchList {
        WatchList::from(self.watch.species.clone())
    }

    /// The configured species names.
    #[must_use]
    pub fn species_names(&self) -> SpeciesNames {
        self.species
            .iter()
            .map(|entry| (SpeciesId(entry.id), entry.name.clone()))
            .collect()
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/spiralscan/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "spiralscan", "spiralscan")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Centre of the spiral. Resolving a place name into coordinates happens
/// outside this crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl OriginConfig {
    /// The origin as a [`Coordinate`].
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Spiral and polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// Distance between neighbouring spiral points in degrees
    pub step_size: f64,
    /// Number of spiral steps after the origin
    pub step_limit: usize,
    /// Upper bound of the random offset added to each spiral point, in degrees
    pub jitter_degrees: f64,
    /// Minimum interval between two queries of one worker
    pub cadence_ms: u64,
    /// Attempts per coordinate before it is skipped
    pub retry_attempts: u32,
    /// Cells queried on each side of the centre cell
    pub cell_radius: u32,
    /// Upper bound on a single query
    pub request_timeout_secs: u64,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            step_size: 0.0015,
            step_limit: 3000,
            jitter_degrees: 0.0005,
            cadence_ms: 5000,
            retry_attempts: 3,
            cell_radius: 10,
            request_timeout_secs: 30,
        }
    }
}

/// Species flagged as wanted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Species ids on the watch list
    pub species: Vec<u32>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            species: vec![130, 131, 143, 149],
        }
    }
}

/// A `[[species]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesEntry {
    /// Species id
    pub id: u32,
    /// Display name
    pub name: String,
}

/// A `[[accounts]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Account user name
    pub username: String,
    /// Service the account authenticates against
    pub auth_service: AuthService,
}

/// Authentication services an account may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthService {
    /// Trainer club accounts
    Ptc,
    /// Google accounts
    Google,
}

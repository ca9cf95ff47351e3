//! Simulation configuration
//!
//! Settings are read once at startup from `config.json` in the platform
//! config directory:
//! - macOS: ~/Library/Application Support/orrery/
//! - Linux: ~/.config/orrery/
//! - Windows: %APPDATA%\orrery\config\
//!
//! A missing file means defaults. A file that cannot be read or parsed is
//! reported once and defaults are used instead.

use anyhow::Context;
use bevy::prelude::*;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const CATALOG_FILE_NAME: &str = "catalog.json";

/// Options that shape the body hierarchy. Changing any of them requires a
/// full rebuild.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Shrink bodies towards true proportions instead of the readable default.
    pub realistic_scale: bool,
    /// Moons are still built when false, but excluded from updates and output.
    pub show_moons: bool,
    pub scale: f64,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            realistic_scale: false,
            show_moons: true,
            scale: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub initial_time_scale: f64,
    /// Multiplier applied to physical spin rates so that rotation is visible
    /// next to orbital motion. Coupled to the time scale.
    pub spin_acceleration: f64,
    /// Orbital direction sign for planets.
    pub planet_orbit_sign: f64,
    /// Orbital direction sign for prograde moons; a negative catalog period flips it.
    pub moon_orbit_sign: f64,
    /// Labels stay hidden this long after a follow transition starts.
    pub label_transition_delay_secs: f64,
    /// Duration of the label fade-in once the delay has elapsed.
    pub label_fade_secs: f64,
    pub default_min_camera_distance: f64,
    pub max_camera_distance: f64,
    pub trail_max_points: usize,
    pub display: DisplayOptions,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_time_scale: 0.05,
            spin_acceleration: 200_000.0,
            planet_orbit_sign: -1.0,
            moon_orbit_sign: -1.0,
            label_transition_delay_secs: 0.35,
            label_fade_secs: 0.8,
            default_min_camera_distance: 2.0,
            max_camera_distance: 300.0,
            trail_max_points: 100,
            display: DisplayOptions::default(),
        }
    }
}

impl SimulationConfig {
    /// Platform config directory for this application, if one can be resolved.
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "orrery").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Read `config.json` from `dir`.
    ///
    /// Returns Ok(None) if the file doesn't exist.
    pub fn load_from_dir(dir: &Path) -> anyhow::Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("invalid config in {}", path.display()))?;
        Ok(Some(config.sanitized()))
    }

    /// Load from the platform config directory, falling back to defaults.
    pub fn load_or_default() -> Self {
        let Some(dir) = Self::config_dir() else {
            warn!("Could not resolve a config directory; using default settings");
            return Self::default();
        };
        match Self::load_from_dir(&dir) {
            Ok(Some(config)) => {
                info!("Loaded settings from {}", dir.join(CONFIG_FILE_NAME).display());
                config
            }
            Ok(None) => Self::default(),
            Err(err) => {
                warn!("{:#}; using default settings", err);
                Self::default()
            }
        }
    }

    /// Replace values that would break the simulation with their defaults.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.spin_acceleration.is_finite() || self.spin_acceleration < 0.0 {
            self.spin_acceleration = defaults.spin_acceleration;
        }
        if self.planet_orbit_sign == 0.0 || !self.planet_orbit_sign.is_finite() {
            self.planet_orbit_sign = defaults.planet_orbit_sign;
        }
        if self.moon_orbit_sign == 0.0 || !self.moon_orbit_sign.is_finite() {
            self.moon_orbit_sign = defaults.moon_orbit_sign;
        }
        self.planet_orbit_sign = self.planet_orbit_sign.signum();
        self.moon_orbit_sign = self.moon_orbit_sign.signum();
        if !(self.label_transition_delay_secs >= 0.0) {
            self.label_transition_delay_secs = defaults.label_transition_delay_secs;
        }
        if !(self.label_fade_secs > 0.0) {
            self.label_fade_secs = defaults.label_fade_secs;
        }
        if !(self.default_min_camera_distance > 0.0) {
            self.default_min_camera_distance = defaults.default_min_camera_distance;
        }
        if !(self.max_camera_distance > self.default_min_camera_distance) {
            self.max_camera_distance = defaults.max_camera_distance;
        }
        if !(self.display.scale > 0.0) {
            self.display.scale = defaults.display.scale;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(test_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "orrery-config-{}-{}-{}",
            test_name,
            std::process::id(),
            nanos
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = unique_temp_dir("missing");
        assert!(SimulationConfig::load_from_dir(&dir).unwrap().is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = unique_temp_dir("partial");
        fs::write(
            dir.join(CONFIG_FILE_NAME),
            r#"{ "initial_time_scale": 0.2, "display": { "show_moons": false } }"#,
        )
        .unwrap();

        let config = SimulationConfig::load_from_dir(&dir).unwrap().unwrap();
        assert_eq!(config.initial_time_scale, 0.2);
        assert!(!config.display.show_moons);
        assert_eq!(config.display.scale, 1.0);
        assert_eq!(config.spin_acceleration, 200_000.0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = unique_temp_dir("invalid");
        fs::write(dir.join(CONFIG_FILE_NAME), "{ not json").unwrap();
        let err = SimulationConfig::load_from_dir(&dir).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid config"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_sanitize_replaces_broken_values() {
        let dir = unique_temp_dir("sanitize");
        fs::write(
            dir.join(CONFIG_FILE_NAME),
            r#"{ "planet_orbit_sign": 0.0, "moon_orbit_sign": 3.0, "label_fade_secs": -1.0 }"#,
        )
        .unwrap();
        let config = SimulationConfig::load_from_dir(&dir).unwrap().unwrap();
        assert_eq!(config.planet_orbit_sign, -1.0);
        assert_eq!(config.moon_orbit_sign, 1.0);
        assert_eq!(config.label_fade_secs, 0.8);
        let _ = fs::remove_dir_all(&dir);
    }
}

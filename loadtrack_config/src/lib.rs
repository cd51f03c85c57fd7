#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the load tracker.
//!
//! `Config` and sub-structs are deserialized from TOML and validated. Every
//! section is defaulted so an empty file is a complete, sane configuration.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MonitorCfg {
    /// Raw magnitudes below this (kg) normalize to exactly 0.
    pub zero_epsilon_kg: f32,
    /// Loop iteration interval in milliseconds. This is both the sampling
    /// period and the input debounce window.
    pub loop_period_ms: u64,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            zero_epsilon_kg: 0.5,
            loop_period_ms: 200,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Raw samples averaged when deriving a scale factor.
    pub sample_count: u32,
    /// Substituted when the persisted factor is missing, zero, or NaN.
    pub default_scale_factor: f32,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            sample_count: 10,
            default_scale_factor: -7050.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Hardware {
    /// Max time to wait for HX711 data-ready (DT low) before failing.
    pub sensor_read_timeout_ms: u64,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            sensor_read_timeout_ms: 150,
        }
    }
}

/// GPIO pins; only consulted when built with the `hardware` feature.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    pub hx711_dt: u8,
    pub hx711_sck: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            hx711_dt: 3,
            hx711_sck: 2,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Storage {
    /// Path of the persistent field file.
    pub path: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            path: "loadtrack_store.toml".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub monitor: MonitorCfg,
    pub calibration: CalibrationCfg,
    pub hardware: Hardware,
    pub pins: Pins,
    pub storage: Storage,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Monitor
        if !self.monitor.zero_epsilon_kg.is_finite() || self.monitor.zero_epsilon_kg < 0.0 {
            eyre::bail!("monitor.zero_epsilon_kg must be a finite value >= 0");
        }
        if self.monitor.loop_period_ms == 0 {
            eyre::bail!("monitor.loop_period_ms must be >= 1");
        }
        if self.monitor.loop_period_ms > 60_000 {
            eyre::bail!("monitor.loop_period_ms is unreasonably large (>60s)");
        }

        // Calibration
        if self.calibration.sample_count == 0 {
            eyre::bail!("calibration.sample_count must be >= 1");
        }
        if !self.calibration.default_scale_factor.is_finite()
            || self.calibration.default_scale_factor == 0.0
        {
            eyre::bail!("calibration.default_scale_factor must be finite and nonzero");
        }

        // Hardware
        if self.hardware.sensor_read_timeout_ms == 0 {
            eyre::bail!("hardware.sensor_read_timeout_ms must be >= 1");
        }

        // Storage
        if self.storage.path.is_empty() {
            eyre::bail!("storage.path must not be empty");
        }

        Ok(())
    }
}

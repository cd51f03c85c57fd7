//! Runtime configuration types for the tracker.
//!
//! These are the structs `Tracker` actually consumes. They are separate from
//! the TOML-deserialized schema in `loadtrack_config`; `From` impls bridge
//! the two.

/// Monitoring loop configuration.
#[derive(Debug, Clone)]
pub struct MonitorCfg {
    /// Samples with magnitude below this (kg) normalize to exactly 0.
    pub zero_epsilon_kg: f32,
    /// Loop iteration interval (ms); also the input debounce window.
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

/// Calibration workflow configuration.
#[derive(Debug, Clone)]
pub struct CalibrationCfg {
    /// Raw samples averaged when deriving a scale factor.
    pub sample_count: u32,
    /// Substituted when the persisted factor is missing or invalid.
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

/// Timeouts and watchdogs.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Max sensor wait per read (ms).
    pub sensor_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { sensor_ms: 150 }
    }
}

impl From<&loadtrack_config::MonitorCfg> for MonitorCfg {
    fn from(c: &loadtrack_config::MonitorCfg) -> Self {
        Self {
            zero_epsilon_kg: c.zero_epsilon_kg,
            loop_period_ms: c.loop_period_ms,
        }
    }
}

impl From<&loadtrack_config::CalibrationCfg> for CalibrationCfg {
    fn from(c: &loadtrack_config::CalibrationCfg) -> Self {
        Self {
            sample_count: c.sample_count,
            default_scale_factor: c.default_scale_factor,
        }
    }
}

impl From<&loadtrack_config::Hardware> for Timeouts {
    fn from(c: &loadtrack_config::Hardware) -> Self {
        Self {
            sensor_ms: c.sensor_read_timeout_ms,
        }
    }
}

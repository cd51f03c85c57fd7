//! Hardware and host-side implementations of the seam traits.
//!
//! `SimulatedScale` and `FileStore` run anywhere and back the default CLI
//! mode; `HardwareScale` drives a real HX711 load-cell amplifier over GPIO
//! and is gated behind the `hardware` feature.

pub mod error;
pub mod file_store;
#[cfg(feature = "hardware")]
pub mod hx711;

pub use error::HwError;
pub use file_store::FileStore;

use std::time::Duration;

use loadtrack_traits::{BoxError, Scale};

/// Default raw-counts-per-kg sensitivity of the simulated sensor. Matches
/// the fallback conversion factor so an uncalibrated run still reads in kg.
pub const SIM_COUNTS_PER_KG: f32 = -7050.0;

/// Host-side scale that replays a load profile.
///
/// The profile holds true platform weights in kilograms; each `read` advances
/// one step and wraps around. Raw counts are synthesized from a fixed
/// sensitivity, so calibration against the simulator converges on
/// `SIM_COUNTS_PER_KG`.
pub struct SimulatedScale {
    profile: Vec<f32>,
    idx: usize,
    counts_per_kg: f32,
    base_counts: f32,
    tare_counts: f32,
    factor: f32,
    last_kg: f32,
}

impl SimulatedScale {
    pub fn new() -> Self {
        // One full truck cycle: approach, load growing, hold, departure.
        Self::with_profile(vec![
            0.0, 0.0, 1200.0, 2400.0, 3600.0, 3600.0, 3600.0, 0.0, 0.0,
        ])
    }

    pub fn with_profile(profile: Vec<f32>) -> Self {
        SimulatedScale {
            profile,
            idx: 0,
            counts_per_kg: SIM_COUNTS_PER_KG,
            base_counts: 87_231.0,
            tare_counts: 0.0,
            factor: 1.0,
            last_kg: 0.0,
        }
    }

    fn raw_counts(&self, kg: f32) -> f32 {
        self.base_counts + kg * self.counts_per_kg
    }
}

impl Default for SimulatedScale {
    fn default() -> Self {
        Self::new()
    }
}

impl Scale for SimulatedScale {
    fn read(&mut self, _timeout: Duration) -> Result<f32, BoxError> {
        if !self.profile.is_empty() {
            self.last_kg = self.profile[self.idx % self.profile.len()];
            self.idx = self.idx.wrapping_add(1);
        }
        let raw = self.raw_counts(self.last_kg);
        let kg = (raw - self.tare_counts) / self.factor;
        tracing::trace!(raw, kg, "simulated sample");
        Ok(kg)
    }

    fn read_raw_average(&mut self, _samples: u32, _timeout: Duration) -> Result<f32, BoxError> {
        // The simulated sensor is noiseless; the average is the point value.
        Ok(self.raw_counts(self.last_kg))
    }

    fn set_scale_factor(&mut self, factor: f32) -> Result<(), BoxError> {
        self.factor = factor;
        Ok(())
    }

    fn zero(&mut self) -> Result<(), BoxError> {
        self.tare_counts = self.raw_counts(self.last_kg);
        Ok(())
    }
}

#[cfg(feature = "hardware")]
pub use hardware_scale::HardwareScale;

#[cfg(feature = "hardware")]
mod hardware_scale {
    use std::time::Duration;

    use loadtrack_traits::{BoxError, Scale};

    use crate::error::HwError;
    use crate::hx711::Hx711;

    const READ_RETRIES: u32 = 3;

    /// HX711-backed scale. Conversion follows the usual load-cell shape:
    /// `kg = (raw - offset) / factor`, with the offset captured by `zero`.
    pub struct HardwareScale {
        hx711: Hx711,
        factor: f32,
        offset: f32,
    }

    impl HardwareScale {
        pub fn new(dt_pin: u8, sck_pin: u8, gain_pulses: u8) -> Result<Self, HwError> {
            let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
            let dt = gpio
                .get(dt_pin)
                .map_err(|e| HwError::Gpio(e.to_string()))?
                .into_input();
            let sck = gpio
                .get(sck_pin)
                .map_err(|e| HwError::Gpio(e.to_string()))?
                .into_output();
            Ok(HardwareScale {
                hx711: Hx711::new(dt, sck, gain_pulses)?,
                factor: 1.0,
                offset: 0.0,
            })
        }

        fn read_raw(&mut self, timeout: Duration) -> Result<i32, HwError> {
            let mut attempts = 0;
            loop {
                match self.hx711.read_with_timeout(timeout) {
                    Ok(raw) => {
                        tracing::trace!(raw, "hx711 sample");
                        return Ok(raw);
                    }
                    Err(HwError::DataReadyTimeout) if attempts < READ_RETRIES => {
                        attempts += 1;
                        tracing::warn!(retries = attempts, "hx711 not ready, retrying");
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }

    impl Scale for HardwareScale {
        fn read(&mut self, timeout: Duration) -> Result<f32, BoxError> {
            let raw = self.read_raw(timeout)?;
            Ok((raw as f32 - self.offset) / self.factor)
        }

        fn read_raw_average(&mut self, samples: u32, timeout: Duration) -> Result<f32, BoxError> {
            let n = samples.max(1);
            let mut sum = 0.0f64;
            for _ in 0..n {
                sum += f64::from(self.read_raw(timeout)?);
            }
            Ok((sum / f64::from(n)) as f32)
        }

        fn set_scale_factor(&mut self, factor: f32) -> Result<(), BoxError> {
            self.factor = factor;
            Ok(())
        }

        fn zero(&mut self) -> Result<(), BoxError> {
            self.offset = self.read_raw_average(10, Duration::from_millis(500))?;
            tracing::debug!(offset = self.offset, "scale tared");
            Ok(())
        }
    }
}

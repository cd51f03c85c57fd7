//! The calibration controller: a keypad-driven state machine that derives a
//! new scale factor from a known test weight and commits it to the sensor
//! and the persistent store.
//!
//! Side effects are observable only at commit; partial digit entry touches
//! neither the sensor nor the store.

use std::time::Duration;

use loadtrack_traits::{Scale, Store, StoreField, StoreValue};

use crate::config::CalibrationCfg;
use crate::error::Result;
use crate::hw_error::{map_hw_error, map_store_error};

/// Compiled-in fallback when both the persisted factor and the configured
/// default are unusable.
pub const FALLBACK_SCALE_FACTOR: f32 = -7050.0;

/// A validated raw-counts-per-kg conversion factor: finite and nonzero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(f32);

impl ScaleFactor {
    pub fn new(v: f32) -> Option<Self> {
        if v.is_finite() && v != 0.0 {
            Some(Self(v))
        } else {
            None
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// Resolve the startup factor: persisted value if valid, else the
    /// configured default, else the compiled-in fallback. An invalid
    /// persisted value is substituted, not overwritten; the bad bytes stay
    /// in the store until the next successful calibration or store.
    pub fn from_stored(stored: Option<f32>, default: f32) -> Self {
        if let Some(f) = stored.and_then(Self::new) {
            return f;
        }
        if stored.is_some() {
            tracing::warn!(?stored, default, "invalid persisted scale factor, using default");
        }
        Self::new(default).unwrap_or(Self(FALLBACK_SCALE_FACTOR))
    }
}

/// Digits entered so far. Exists only while the controller is active.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightEntry {
    digits: String,
}

impl WeightEntry {
    pub fn as_str(&self) -> &str {
        &self.digits
    }

    fn push_digit(&mut self, c: char) {
        if c.is_ascii_digit() {
            self.digits.push(c);
        }
    }

    /// Append a decimal point only if none is present; duplicate presses are
    /// silently ignored, not an error.
    fn push_decimal_point(&mut self) {
        if !self.digits.contains('.') {
            self.digits.push('.');
        }
    }

    fn clear(&mut self) {
        self.digits.clear();
    }

    fn parse_kg(&self) -> Option<f32> {
        self.digits.parse::<f32>().ok()
    }
}

/// Controller state. `Committing` is not a stored state: commit runs
/// synchronously inside the Enter transition and lands back in `Idle`.
#[derive(Debug, Clone, PartialEq)]
pub enum CalState {
    Idle,
    EnteringWeight(WeightEntry),
}

/// Calibration keys, a subset of the input alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalKey {
    Digit(char),
    DecimalPoint,
    Clear,
    Enter,
}

/// A committed calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Commit {
    pub known_kg: f32,
    pub factor: ScaleFactor,
}

#[derive(Debug)]
pub struct Calibrator {
    state: CalState,
    sample_count: u32,
}

impl Calibrator {
    pub fn new(cfg: &CalibrationCfg) -> Self {
        Self {
            state: CalState::Idle,
            sample_count: cfg.sample_count.max(1),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, CalState::EnteringWeight(_))
    }

    /// Digits entered so far; `None` while idle.
    pub fn entry(&self) -> Option<&str> {
        match &self.state {
            CalState::Idle => None,
            CalState::EnteringWeight(e) => Some(e.as_str()),
        }
    }

    /// Begin calibration: `Idle -> EnteringWeight` with an empty entry.
    /// No-op if already active.
    pub fn begin(&mut self) {
        if let CalState::Idle = self.state {
            self.state = CalState::EnteringWeight(WeightEntry::default());
            tracing::info!("calibration started");
        }
    }

    /// Handle one key while active. Returns `Ok(Some(commit))` when Enter
    /// completes a calibration; `Ok(None)` otherwise.
    ///
    /// Enter on an empty entry is a no-op. Enter whose parse is zero or
    /// negative, or whose derived factor is not a valid `ScaleFactor`,
    /// rejects the commit: the entry is cleared and the controller stays in
    /// `EnteringWeight` so the operator can retype.
    ///
    /// On a sensor or store error the state (digits included) is left
    /// intact and the error propagates; Enter can simply be pressed again.
    pub fn handle_key<S, P>(
        &mut self,
        key: CalKey,
        scale: &mut S,
        store: &mut P,
        sensor_timeout: Duration,
    ) -> Result<Option<Commit>>
    where
        S: Scale + ?Sized,
        P: Store + ?Sized,
    {
        let CalState::EnteringWeight(entry) = &mut self.state else {
            return Ok(None);
        };

        match key {
            CalKey::Digit(c) => {
                entry.push_digit(c);
                Ok(None)
            }
            CalKey::DecimalPoint => {
                entry.push_decimal_point();
                Ok(None)
            }
            CalKey::Clear => {
                entry.clear();
                Ok(None)
            }
            CalKey::Enter => {
                if entry.as_str().is_empty() {
                    // Guard against committing an empty calibration.
                    return Ok(None);
                }
                let known_kg = entry.parse_kg().unwrap_or(0.0);
                if known_kg <= 0.0 {
                    tracing::warn!(entry = entry.as_str(), "rejecting non-positive test weight");
                    entry.clear();
                    return Ok(None);
                }

                let raw_average = scale
                    .read_raw_average(self.sample_count, sensor_timeout)
                    .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
                let Some(factor) = ScaleFactor::new(raw_average / known_kg) else {
                    tracing::warn!(raw_average, known_kg, "derived factor invalid, rejecting");
                    entry.clear();
                    return Ok(None);
                };

                scale
                    .set_scale_factor(factor.get())
                    .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
                store
                    .write(StoreField::ScaleFactor, StoreValue::Real(factor.get()))
                    .map_err(|e| eyre::Report::new(map_store_error(&*e)))?;

                tracing::info!(known_kg, factor = factor.get(), "calibration committed");
                self.state = CalState::Idle;
                Ok(Some(Commit { known_kg, factor }))
            }
        }
    }
}

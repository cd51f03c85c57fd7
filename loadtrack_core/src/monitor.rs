//! The load event detector.
//!
//! Consumes one calibrated weight sample per monitoring cycle and decides
//! when a complete load/unload cycle has happened. The detector owns no
//! ledger state; it emits a `LoadEvent` at each unload edge and the caller
//! commits it.

/// Detector phase. A tagged variant rather than a bare flag plus a stale
/// weight field, so match arms stay exhaustive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadPhase {
    /// Scale reads zero; nothing latched.
    Empty,
    /// Nonzero weight seen; `last_kg` tracks the most recent reading.
    Loaded { last_kg: f32 },
}

/// One completed load/unload cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadEvent {
    /// Weight latched immediately before the unload edge (kg, > 0).
    pub weight_kg: f32,
}

/// Per-cycle detector state. Ephemeral; never persisted.
#[derive(Debug, Clone)]
pub struct LoadMonitor {
    phase: LoadPhase,
    zero_epsilon_kg: f32,
}

impl LoadMonitor {
    pub fn new(zero_epsilon_kg: f32) -> Self {
        Self {
            phase: LoadPhase::Empty,
            zero_epsilon_kg,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// Normalize sensor noise: magnitudes below epsilon become exactly 0.
    pub fn normalize(&self, sample_kg: f32) -> f32 {
        if sample_kg.abs() < self.zero_epsilon_kg {
            0.0
        } else {
            sample_kg
        }
    }

    /// Process one sample. Returns the committed load event, if this sample
    /// is an unload edge.
    ///
    /// Rules (on the normalized sample `w`):
    /// - `w > 0`: latch `Loaded { last_kg: w }`; no event.
    /// - `w == 0` while `Loaded`: unload edge — emit the latched weight and
    ///   return to `Empty`.
    /// - `w == 0` while `Empty`: steady zero, no-op.
    /// - `w < 0`: no-op in either phase. A reading below `-epsilon` means
    ///   the baseline drifted; only a tare corrects that.
    ///
    /// Exactly one event is produced per true unload edge regardless of how
    /// many cycles the weight stayed elevated.
    pub fn observe(&mut self, sample_kg: f32) -> Option<LoadEvent> {
        let w = self.normalize(sample_kg);
        if w > 0.0 {
            self.phase = LoadPhase::Loaded { last_kg: w };
            return None;
        }
        if w == 0.0
            && let LoadPhase::Loaded { last_kg } = self.phase
        {
            self.phase = LoadPhase::Empty;
            tracing::debug!(weight_kg = last_kg, "unload edge");
            return Some(LoadEvent { weight_kg: last_kg });
        }
        None
    }

    /// Manual tare: forget any latched load. The caller re-zeros the sensor;
    /// the ledger is never touched.
    pub fn tare(&mut self) {
        self.phase = LoadPhase::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> LoadMonitor {
        LoadMonitor::new(0.5)
    }

    #[test]
    fn single_cycle_produces_one_event_with_last_weight() {
        let mut m = monitor();
        let samples = [0.0, 0.0, 12.3, 12.5, 12.0, 0.0, 0.0];
        let mut events = Vec::new();
        for s in samples {
            if let Some(e) = m.observe(s) {
                events.push(e);
            }
        }
        assert_eq!(events.len(), 1);
        assert!((events[0].weight_kg - 12.0).abs() < f32::EPSILON);
    }

    #[test]
    fn sub_epsilon_noise_is_zero() {
        let mut m = monitor();
        assert!(m.observe(0.3).is_none());
        assert_eq!(m.phase(), LoadPhase::Empty);
        assert!(m.observe(-0.49).is_none());
        assert_eq!(m.phase(), LoadPhase::Empty);
    }

    #[test]
    fn holding_weight_does_not_double_count() {
        let mut m = monitor();
        for _ in 0..50 {
            assert!(m.observe(8.0).is_none());
        }
        assert!(m.observe(0.0).is_some());
        assert!(m.observe(0.0).is_none());
    }

    #[test]
    fn negative_reading_neither_latches_nor_commits() {
        let mut m = monitor();
        m.observe(5.0);
        assert!(m.observe(-2.0).is_none());
        assert_eq!(m.phase(), LoadPhase::Loaded { last_kg: 5.0 });
        // Back to zero still commits the latched weight.
        let e = m.observe(0.1).expect("unload edge");
        assert!((e.weight_kg - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn tare_forgets_latched_load() {
        let mut m = monitor();
        m.observe(20.0);
        m.tare();
        assert!(m.observe(0.0).is_none());
    }
}

//! The cooperative control loop (`Tracker`).
//!
//! One logical thread of control. Each iteration: read one sample (or
//! service one calibration key, mutually exclusive with monitoring), step
//! the detector or controller, refresh the panel, poll at most one input
//! event, sleep one loop period. The period is both the sampling interval
//! and the input debounce window.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use loadtrack_traits::clock::{Clock, MonotonicClock};
use loadtrack_traits::{CalibrationView, IdleView, InputEvent, Notice, Panel, Scale, Store};

use crate::calibration::{CalKey, Calibrator, Commit, ScaleFactor};
use crate::config::{CalibrationCfg, MonitorCfg, Timeouts};
use crate::error::{BuildError, Result};
use crate::hw_error::map_hw_error;
use crate::ledger::Ledger;
use crate::monitor::{LoadEvent, LoadMonitor};

/// What one loop iteration did; hosts and tests observe this instead of
/// reaching into tracker internals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Normal monitoring: the normalized sample and the load event it
    /// committed, if this iteration saw an unload edge.
    Monitored {
        weight_kg: f32,
        event: Option<LoadEvent>,
    },
    /// Calibration active; monitoring suspended for this iteration.
    Calibrating { committed: Option<Commit> },
}

pub struct Tracker<S: Scale, P: Store, U: Panel> {
    scale: S,
    store: P,
    panel: U,
    monitor: LoadMonitor,
    ledger: Ledger,
    calibrator: Calibrator,
    scale_factor: ScaleFactor,
    period: Duration,
    sensor_timeout: Duration,
    clock: Arc<dyn Clock + Send + Sync>,
    current_kg: f32,
}

impl<S: Scale, P: Store, U: Panel> core::fmt::Debug for Tracker<S, P, U> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracker")
            .field("load_count", &self.ledger.load_count())
            .field("total_kg", &self.ledger.total_kg())
            .field("calibrating", &self.calibrator.is_active())
            .finish()
    }
}

impl<S: Scale, P: Store, U: Panel> Tracker<S, P, U> {
    /// Start building a Tracker.
    pub fn builder() -> TrackerBuilder<S, P, U> {
        TrackerBuilder::default()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn scale_factor(&self) -> ScaleFactor {
        self.scale_factor
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrator.is_active()
    }

    /// Last normalized weight reading (kg).
    pub fn current_kg(&self) -> f32 {
        self.current_kg
    }

    /// Tear down the tracker and hand the ports back to the host.
    pub fn into_parts(self) -> (S, P, U) {
        (self.scale, self.store, self.panel)
    }

    /// One loop iteration. Never exits on its own; errors surface only when
    /// the sensor or store fails.
    pub fn step(&mut self) -> Result<StepOutcome> {
        let outcome = if self.calibrator.is_active() {
            self.step_calibration()?
        } else {
            self.step_monitoring()?
        };
        self.clock.sleep(self.period);
        Ok(outcome)
    }

    /// Run until the shutdown flag is raised (power loss is the only other
    /// way out on the device; the host flag stands in for it).
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<()> {
        tracing::info!(
            load_count = self.ledger.load_count(),
            total_kg = self.ledger.total_kg(),
            scale_factor = self.scale_factor.get(),
            "tracker started"
        );
        while !shutdown.load(Ordering::Relaxed) {
            self.step()?;
        }
        tracing::info!("tracker stopped by host");
        Ok(())
    }

    fn step_monitoring(&mut self) -> Result<StepOutcome> {
        let raw_kg = self
            .scale
            .read(self.sensor_timeout)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
        let weight_kg = self.monitor.normalize(raw_kg);
        let event = self.monitor.observe(raw_kg);
        if let Some(e) = event {
            self.ledger.commit(e);
        }
        self.current_kg = weight_kg;

        self.panel.render_idle(&IdleView {
            current_kg: weight_kg,
            load_count: self.ledger.load_count(),
            total_kg: self.ledger.total_kg(),
        });

        if let Some(ev) = self.panel.poll() {
            self.dispatch_idle(ev)?;
        }
        Ok(StepOutcome::Monitored { weight_kg, event })
    }

    fn step_calibration(&mut self) -> Result<StepOutcome> {
        let committed = match self.panel.poll().and_then(cal_key) {
            Some(key) => self.calibrator.handle_key(
                key,
                &mut self.scale,
                &mut self.store,
                self.sensor_timeout,
            )?,
            None => None,
        };

        if let Some(c) = committed {
            self.scale_factor = c.factor;
            self.panel.notify(Notice::Calibrated {
                known_kg: c.known_kg,
                factor: c.factor.get(),
            });
        } else {
            let entry = self.calibrator.entry().unwrap_or("");
            self.panel.render_calibration(&CalibrationView { entry });
        }
        Ok(StepOutcome::Calibrating { committed })
    }

    fn dispatch_idle(&mut self, ev: InputEvent) -> Result<()> {
        match ev {
            InputEvent::Tare => {
                self.monitor.tare();
                self.current_kg = 0.0;
                self.scale
                    .zero()
                    .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
                tracing::info!("tared");
            }
            InputEvent::Store => {
                self.ledger.store(&mut self.store)?;
                self.panel.notify(Notice::Stored);
            }
            InputEvent::Reset => {
                self.monitor.tare();
                self.current_kg = 0.0;
                self.ledger.reset(&mut self.store)?;
                self.panel.notify(Notice::Reset);
            }
            InputEvent::BeginCalibration => {
                self.calibrator.begin();
            }
            InputEvent::Digit(_)
            | InputEvent::DecimalPoint
            | InputEvent::Clear
            | InputEvent::Enter => {
                tracing::trace!(?ev, "calibration key ignored while idle");
            }
        }
        Ok(())
    }
}

/// Calibration-alphabet subset of the input events.
fn cal_key(ev: InputEvent) -> Option<CalKey> {
    match ev {
        InputEvent::Digit(c) => Some(CalKey::Digit(c)),
        InputEvent::DecimalPoint => Some(CalKey::DecimalPoint),
        InputEvent::Clear => Some(CalKey::Clear),
        InputEvent::Enter => Some(CalKey::Enter),
        InputEvent::Tare | InputEvent::Store | InputEvent::Reset | InputEvent::BeginCalibration => {
            None
        }
    }
}

/// Runtime-checked builder for `Tracker`.
///
/// `build()` performs the startup sequence: resolve the scale factor from
/// the store (substituting the default for invalid values), push it to the
/// sensor, tare, and load the persisted ledger.
pub struct TrackerBuilder<S, P, U> {
    scale: Option<S>,
    store: Option<P>,
    panel: Option<U>,
    monitor_cfg: MonitorCfg,
    calibration_cfg: CalibrationCfg,
    timeouts: Timeouts,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
}

impl<S, P, U> Default for TrackerBuilder<S, P, U> {
    fn default() -> Self {
        Self {
            scale: None,
            store: None,
            panel: None,
            monitor_cfg: MonitorCfg::default(),
            calibration_cfg: CalibrationCfg::default(),
            timeouts: Timeouts::default(),
            clock: None,
        }
    }
}

impl<S: Scale, P: Store, U: Panel> TrackerBuilder<S, P, U> {
    pub fn with_scale(mut self, scale: S) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_store(mut self, store: P) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_panel(mut self, panel: U) -> Self {
        self.panel = Some(panel);
        self
    }

    pub fn with_monitor_cfg(mut self, cfg: MonitorCfg) -> Self {
        self.monitor_cfg = cfg;
        self
    }

    pub fn with_calibration_cfg(mut self, cfg: CalibrationCfg) -> Self {
        self.calibration_cfg = cfg;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Tracker<S, P, U>> {
        let mut scale = self
            .scale
            .ok_or_else(|| eyre::Report::new(BuildError::MissingScale))?;
        let mut store = self
            .store
            .ok_or_else(|| eyre::Report::new(BuildError::MissingStore))?;
        let panel = self
            .panel
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPanel))?;
        if self.monitor_cfg.loop_period_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "loop_period_ms must be >= 1",
            )));
        }
        if !(self.monitor_cfg.zero_epsilon_kg.is_finite()
            && self.monitor_cfg.zero_epsilon_kg >= 0.0)
        {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "zero_epsilon_kg must be finite and >= 0",
            )));
        }
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));

        // Startup: persisted scale factor (or default), applied to the
        // sensor before the first read; then tare; then the ledger.
        let stored = store
            .read(loadtrack_traits::StoreField::ScaleFactor)
            .map_err(|e| eyre::Report::new(crate::hw_error::map_store_error(&*e)))?
            .and_then(loadtrack_traits::StoreValue::as_real);
        let scale_factor =
            ScaleFactor::from_stored(stored, self.calibration_cfg.default_scale_factor);
        scale
            .set_scale_factor(scale_factor.get())
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
        scale
            .zero()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
        let ledger = Ledger::load(&mut store)?;

        Ok(Tracker {
            scale,
            store,
            panel,
            monitor: LoadMonitor::new(self.monitor_cfg.zero_epsilon_kg),
            ledger,
            calibrator: Calibrator::new(&self.calibration_cfg),
            scale_factor,
            period: Duration::from_millis(self.monitor_cfg.loop_period_ms),
            sensor_timeout: Duration::from_millis(self.timeouts.sensor_ms),
            clock,
            current_kg: 0.0,
        })
    }
}

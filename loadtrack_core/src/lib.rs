#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core load-tracking logic (hardware-agnostic).
//!
//! Turns a stream of weight-sensor samples into discrete, countable load
//! events, maintains a durable count/total ledger, and runs the in-field
//! calibration workflow. All hardware interactions go through the
//! `loadtrack_traits` seams (`Scale`, `Store`, `Panel`).
//!
//! ## Architecture
//!
//! - **Detection**: unload-edge state machine (`monitor` module)
//! - **Ledger**: aggregate count/total with the persistence contract
//!   (`ledger` module)
//! - **Calibration**: keypad FSM deriving and committing the scale factor
//!   (`calibration` module)
//! - **Loop**: single cooperative control loop pacing sampling, input
//!   debounce, and rendering (`runner` module)
//! - **Input**: line-reader pump feeding discrete events (`pump` module)

pub mod calibration;
pub mod config;
pub mod error;
pub mod hw_error;
pub mod ledger;
pub mod mocks;
pub mod monitor;
pub mod pump;
pub mod runner;

pub use calibration::{CalKey, CalState, Calibrator, Commit, ScaleFactor, WeightEntry};
pub use config::{CalibrationCfg, MonitorCfg, Timeouts};
pub use error::{BuildError, TrackerError};
pub use ledger::Ledger;
pub use monitor::{LoadEvent, LoadMonitor, LoadPhase};
pub use runner::{StepOutcome, Tracker, TrackerBuilder};

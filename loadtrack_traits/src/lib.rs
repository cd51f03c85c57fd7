//! Seam traits for the load tracking stack.
//!
//! The core is hardware-agnostic: the weight sensor, the persistent field
//! store, and the operator panel are all reached through the traits in this
//! crate. Implementations return `Box<dyn Error + Send + Sync>` at the seam;
//! the core maps those to typed errors.

pub mod clock;

pub use clock::{Clock, MonotonicClock, TestClock};

use std::time::Duration;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Weight sensor port.
///
/// `read` returns a calibrated weight in kilograms (signed; the driver has
/// already applied tare offset and scale factor). `read_raw_average` returns
/// the mean of `samples` unfiltered raw counts and is only used during
/// calibration.
pub trait Scale {
    fn read(&mut self, timeout: Duration) -> Result<f32, BoxError>;

    fn read_raw_average(&mut self, samples: u32, timeout: Duration) -> Result<f32, BoxError>;

    /// Install a new raw-counts-per-kg scale factor.
    fn set_scale_factor(&mut self, factor: f32) -> Result<(), BoxError>;

    /// Tare: re-zero the physical baseline. Does not affect any ledger.
    fn zero(&mut self) -> Result<(), BoxError>;
}

/// Logical fields of the persistent store.
///
/// Addressing is by field, not byte offset; the backing layout is an
/// implementation detail of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreField {
    LoadCount,
    TotalWeight,
    ScaleFactor,
}

/// Typed value held by a store field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreValue {
    Count(u32),
    Real(f32),
}

impl StoreValue {
    pub fn as_count(self) -> Option<u32> {
        match self {
            StoreValue::Count(n) => Some(n),
            StoreValue::Real(_) => None,
        }
    }

    pub fn as_real(self) -> Option<f32> {
        match self {
            StoreValue::Real(v) => Some(v),
            StoreValue::Count(_) => None,
        }
    }
}

/// Persistent field store, durable across power loss.
///
/// Contract: a `write` must be durable before the next `read` observes it;
/// no write buffering is visible to the core. `read` returns `Ok(None)` for
/// a field that has never been written.
pub trait Store {
    fn read(&mut self, field: StoreField) -> Result<Option<StoreValue>, BoxError>;
    fn write(&mut self, field: StoreField, value: StoreValue) -> Result<(), BoxError>;
}

/// Discrete operator input, at most one per loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    // Idle alphabet
    Tare,
    Store,
    Reset,
    BeginCalibration,
    // Calibration alphabet
    Digit(char),
    DecimalPoint,
    Clear,
    Enter,
}

/// Snapshot pushed to the panel while monitoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleView {
    pub current_kg: f32,
    pub load_count: u32,
    pub total_kg: f32,
}

/// Snapshot pushed to the panel while calibrating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationView<'a> {
    /// Digits entered so far (possibly empty).
    pub entry: &'a str,
}

/// One-shot operator confirmations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notice {
    /// Ledger written to the store ("Values Stored").
    Stored,
    /// Ledger zeroed and written ("All Values Reset").
    Reset,
    /// Calibration committed with the given known weight and derived factor.
    Calibrated { known_kg: f32, factor: f32 },
}

/// Operator panel port: rendering plus one polled input event per cycle.
///
/// Rendering has no feedback into core state, so the render methods are
/// infallible; a panel that loses its display simply shows nothing.
pub trait Panel {
    fn render_idle(&mut self, view: &IdleView);
    fn render_calibration(&mut self, view: &CalibrationView<'_>);
    fn notify(&mut self, notice: Notice);

    /// Return the next pending input event, if any. Called once per loop
    /// iteration; the iteration interval is the debounce period.
    fn poll(&mut self) -> Option<InputEvent>;
}

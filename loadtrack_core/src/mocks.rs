//! Test and helper doubles for loadtrack_core.
//!
//! Public (not test-gated) so downstream crates can drive the tracker
//! without hardware: `self-check` and integration tests both use these.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use loadtrack_traits::{
    BoxError, CalibrationView, IdleView, InputEvent, Notice, Panel, Scale, Store, StoreField,
    StoreValue,
};

/// In-memory field store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    fields: HashMap<StoreField, StoreValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a field, as if a previous run had written it.
    pub fn seed(mut self, field: StoreField, value: StoreValue) -> Self {
        self.fields.insert(field, value);
        self
    }

    pub fn get(&self, field: StoreField) -> Option<StoreValue> {
        self.fields.get(&field).copied()
    }
}

impl Store for MemoryStore {
    fn read(&mut self, field: StoreField) -> Result<Option<StoreValue>, BoxError> {
        Ok(self.fields.get(&field).copied())
    }

    fn write(&mut self, field: StoreField, value: StoreValue) -> Result<(), BoxError> {
        self.fields.insert(field, value);
        Ok(())
    }
}

/// Scale that replays a fixed sequence of calibrated readings, then repeats
/// the last one. Records tare and scale-factor side effects for assertions.
#[derive(Debug, Default)]
pub struct ScriptScale {
    readings: Vec<f32>,
    idx: usize,
    raw_average: f32,
    pub factors_set: Vec<f32>,
    pub zero_calls: u32,
}

impl ScriptScale {
    pub fn new(readings: impl Into<Vec<f32>>) -> Self {
        Self {
            readings: readings.into(),
            ..Self::default()
        }
    }

    /// Raw-count average returned during calibration.
    pub fn with_raw_average(mut self, raw: f32) -> Self {
        self.raw_average = raw;
        self
    }
}

impl Scale for ScriptScale {
    fn read(&mut self, _timeout: Duration) -> Result<f32, BoxError> {
        let v = if self.idx < self.readings.len() {
            let x = self.readings[self.idx];
            self.idx += 1;
            x
        } else {
            self.readings.last().copied().unwrap_or(0.0)
        };
        Ok(v)
    }

    fn read_raw_average(&mut self, _samples: u32, _timeout: Duration) -> Result<f32, BoxError> {
        Ok(self.raw_average)
    }

    fn set_scale_factor(&mut self, factor: f32) -> Result<(), BoxError> {
        self.factors_set.push(factor);
        Ok(())
    }

    fn zero(&mut self) -> Result<(), BoxError> {
        self.zero_calls += 1;
        Ok(())
    }
}

/// Panel double: events are scripted in, renders and notices are recorded.
///
/// The script is positional: each `poll()` consumes one slot, and a `None`
/// slot is an iteration with no operator input. That lets tests place an
/// event on an exact loop iteration.
#[derive(Debug, Default)]
pub struct ScriptPanel {
    events: VecDeque<Option<InputEvent>>,
    pub idle_views: Vec<IdleView>,
    pub cal_entries: Vec<String>,
    pub notices: Vec<Notice>,
}

impl ScriptPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(mut self, events: impl IntoIterator<Item = InputEvent>) -> Self {
        self.events.extend(events.into_iter().map(Some));
        self
    }

    /// Append `n` iterations with no input.
    pub fn idle_for(mut self, n: usize) -> Self {
        self.events.extend(std::iter::repeat_n(None, n));
        self
    }

    pub fn push_event(&mut self, event: InputEvent) {
        self.events.push_back(Some(event));
    }

    pub fn last_idle_view(&self) -> Option<&IdleView> {
        self.idle_views.last()
    }
}

impl Panel for ScriptPanel {
    fn render_idle(&mut self, view: &IdleView) {
        self.idle_views.push(*view);
    }

    fn render_calibration(&mut self, view: &CalibrationView<'_>) {
        self.cal_entries.push(view.entry.to_string());
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn poll(&mut self) -> Option<InputEvent> {
        self.events.pop_front().flatten()
    }
}

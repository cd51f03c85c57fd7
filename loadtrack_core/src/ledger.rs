//! The persistent ledger: aggregate load count and total weight.
//!
//! Fields are private so the two invariant-preserving mutations — `commit`
//! (one event, count +1, weight added) and `reset` (both zeroed) — are the
//! only way the numbers change. In-memory state reaches the store only on
//! explicit `store()` / `reset()`.

use loadtrack_traits::{Store, StoreField, StoreValue};

use crate::error::Result;
use crate::hw_error::map_store_error;
use crate::monitor::LoadEvent;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    load_count: u32,
    total_kg: f32,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_count(&self) -> u32 {
        self.load_count
    }

    pub fn total_kg(&self) -> f32 {
        self.total_kg
    }

    /// Read persisted count and total at startup.
    ///
    /// Missing fields, wrong-typed values, and non-finite or negative totals
    /// all recover to zero locally; corrupted storage is never surfaced as a
    /// failure here. Only an I/O error from the store propagates.
    pub fn load<S: Store + ?Sized>(store: &mut S) -> Result<Self> {
        let load_count = store
            .read(StoreField::LoadCount)
            .map_err(|e| eyre::Report::new(map_store_error(&*e)))?
            .and_then(StoreValue::as_count)
            .unwrap_or(0);
        let total_kg = store
            .read(StoreField::TotalWeight)
            .map_err(|e| eyre::Report::new(map_store_error(&*e)))?
            .and_then(StoreValue::as_real)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(0.0);
        Ok(Self {
            load_count,
            total_kg,
        })
    }

    /// Commit one load event: count += 1, total += weight.
    pub fn commit(&mut self, event: LoadEvent) {
        // Detector emits positive weights; clamp keeps the total
        // non-negative regardless of the caller.
        let w = event.weight_kg.max(0.0);
        self.load_count = self.load_count.saturating_add(1);
        self.total_kg += w;
        tracing::info!(
            weight_kg = w,
            load_count = self.load_count,
            total_kg = self.total_kg,
            "load event committed"
        );
    }

    /// Write current count and total to the store. In-memory state is
    /// unchanged.
    pub fn store<S: Store + ?Sized>(&self, store: &mut S) -> Result<()> {
        store
            .write(StoreField::LoadCount, StoreValue::Count(self.load_count))
            .map_err(|e| eyre::Report::new(map_store_error(&*e)))?;
        store
            .write(StoreField::TotalWeight, StoreValue::Real(self.total_kg))
            .map_err(|e| eyre::Report::new(map_store_error(&*e)))?;
        tracing::debug!(
            load_count = self.load_count,
            total_kg = self.total_kg,
            "ledger stored"
        );
        Ok(())
    }

    /// Zero both aggregates and store immediately; a reset is durable the
    /// moment it returns.
    pub fn reset<S: Store + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        self.load_count = 0;
        self.total_kg = 0.0;
        self.store(store)
    }
}

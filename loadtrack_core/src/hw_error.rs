//! Maps `Box<dyn Error>` from trait boundaries to typed `TrackerError`.
//!
//! The traits in `loadtrack_traits` use `Box<dyn Error + Send + Sync>` for
//! maximum flexibility; this module converts those to our typed error enum,
//! with an optional feature-gated path for `loadtrack_hardware::HwError`
//! downcasting.

use crate::error::TrackerError;

/// Map a sensor trait-boundary error to a typed `TrackerError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> TrackerError {
    // Feature-gated: try to downcast to HwError for precise mapping
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<loadtrack_hardware::error::HwError>() {
            return match hw {
                loadtrack_hardware::error::HwError::Timeout => TrackerError::Timeout,
                loadtrack_hardware::error::HwError::DataReadyTimeout => TrackerError::Timeout,
                other => TrackerError::HardwareFault(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        TrackerError::Timeout
    } else {
        TrackerError::Hardware(s)
    }
}

/// Map a store trait-boundary error to a typed `TrackerError`.
pub fn map_store_error(e: &(dyn std::error::Error + 'static)) -> TrackerError {
    TrackerError::Storage(e.to_string())
}

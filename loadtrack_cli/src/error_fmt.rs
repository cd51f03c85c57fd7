//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use loadtrack_core::error::{BuildError, TrackerError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingScale => {
                "What happened: No scale was provided to the tracker.\nLikely causes: Hardware scale failed to initialize or was not wired into the builder.\nHow to fix: Ensure the HX711 scale is created successfully and passed via with_scale(...).".to_string()
            }
            BuildError::MissingStore => {
                "What happened: No persistent store was provided to the tracker.\nLikely causes: The store file failed to open or was not wired into the builder.\nHow to fix: Check storage.path in the config and filesystem permissions.".to_string()
            }
            BuildError::MissingPanel => {
                "What happened: No operator panel was provided to the tracker.\nLikely causes: Host wiring bug.\nHow to fix: Pass a panel via with_panel(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<TrackerError>() {
        if matches!(te, TrackerError::Timeout) {
            return "What happened: Scale read timed out.\nLikely causes: HX711 not wired correctly, no power/ground, or timeout too low.\nHow to fix: Verify DT/SCK pins and power, and consider increasing hardware.sensor_read_timeout_ms in the config.".to_string();
        }
        if let TrackerError::Storage(msg) = te {
            return format!(
                "What happened: The persistent store failed ({msg}).\nLikely causes: Disk full, bad permissions, or the store path points at a directory.\nHow to fix: Check storage.path and the filesystem, then rerun."
            );
        }
        return format!(
            "What happened: {te}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if (lower.contains("hx711") && lower.contains("timeout")) || lower.contains("datareadytimeout")
    {
        return "What happened: HX711 did not produce data within the configured timeout.\nLikely causes: Wrong DT/SCK pins, wiring/power issues, or timeout configured too low.\nHow to fix: Check [pins] in the config, verify 5V/GND, and raise hardware.sensor_read_timeout_ms.".to_string();
    }

    if lower.contains("invalid configuration") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: sensor timeout and storage failures are distinguishable
/// for supervisors; everything else exits 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use loadtrack_core::error::TrackerError;
    match err.downcast_ref::<TrackerError>() {
        Some(TrackerError::Timeout) => 3,
        Some(TrackerError::Storage(_)) => 4,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use loadtrack_core::error::TrackerError;
    use serde_json::json;

    let reason = match err.downcast_ref::<TrackerError>() {
        Some(TrackerError::Timeout) => "Timeout",
        Some(TrackerError::Storage(_)) => "Storage",
        Some(TrackerError::Hardware(_)) | Some(TrackerError::HardwareFault(_)) => "Hardware",
        Some(TrackerError::Config(_)) => "Config",
        Some(TrackerError::State(_)) => "State",
        None => "Error",
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadtrack_core::error::TrackerError;

    #[test]
    fn timeout_gets_dedicated_exit_code() {
        let err = eyre::Report::new(TrackerError::Timeout);
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("timed out"));
    }

    #[test]
    fn json_error_is_valid_json_with_reason() {
        let err = eyre::Report::new(TrackerError::Storage("disk full".into()));
        let v: serde_json::Value =
            serde_json::from_str(&format_error_json(&err)).expect("valid json");
        assert_eq!(v["reason"], "Storage");
    }
}

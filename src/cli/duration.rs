//! Time-lock parsing.
//!
//! Accepts human-readable durations ("30s", "48h", "7 days") via the
//! humantime crate, with "0" and "none" meaning no time-lock. Bounded
//! above so an operator typo cannot lock a proposal for years.

use std::time::Duration;

/// Longest accepted time-lock (30 days).
const MAX_TIME_LOCK_SECS: u64 = 30 * 24 * 3600;

/// Parse a time-lock string into a duration.
pub fn parse_time_lock(input: &str) -> Result<Duration, String> {
    if input == "0" || input == "none" {
        return Ok(Duration::ZERO);
    }

    let parsed = humantime::parse_duration(input)
        .map_err(|e| format!("Invalid time-lock '{}': {}", input, e))?;

    if parsed.as_secs() > MAX_TIME_LOCK_SECS {
        return Err(format!(
            "Time-lock '{}' exceeds the {}-day maximum",
            input,
            MAX_TIME_LOCK_SECS / 86400
        ));
    }
    Ok(parsed)
}

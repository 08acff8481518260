//! Duration strings for CLI flags.

use anyhow::Context;
use std::time::Duration;

// Longest suffix first so "ms" is not read as "m".
const UNITS: [(&str, u64); 4] = [("ms", 1), ("h", 3_600_000), ("m", 60_000), ("s", 1_000)];

/// Parse `"500ms"`, `"2s"`, `"30m"`, `"1h"` or a bare number of seconds.
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty duration string");
    }

    let (digits, millis_per_unit) = UNITS
        .iter()
        .find_map(|(suffix, millis)| s.strip_suffix(suffix).map(|d| (d, *millis)))
        .unwrap_or((s, 1_000));

    let count: u64 = digits
        .parse()
        .with_context(|| format!("Invalid duration '{s}'"))?;
    let millis = count
        .checked_mul(millis_per_unit)
        .with_context(|| format!("Duration '{s}' is too large"))?;
    Ok(Duration::from_millis(millis))
}

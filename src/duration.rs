//! Human formatting for backend-reported timings.
//!
//! The backend reports every duration in nanoseconds, but two endpoint
//! families are rendered differently:
//!
//! * per-query timings (`parse_time`, `query_time`, `total_time`) go through
//!   [`format_duration`]: `ns` below 1μs, then `μs`, then `ms`.
//! * aggregate optimizer timings (`AverageOptimizationTime`,
//!   `TotalOptimizationTime`, `AverageTime`) go through
//!   [`format_aggregate_duration`]: `μs` below 1ms, then `ms`, then `s`.

use serde::{Deserialize, Serialize};
use std::fmt;

const NANOS_PER_MICRO: f64 = 1_000.0;
const NANOS_PER_MILLI: f64 = 1_000_000.0;
const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// A duration as the backend sent it: a raw nanosecond count, or a string
/// the backend already formatted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportedDuration {
    Nanos(i64),
    /// Non-integral JSON numbers. Kept as-is rather than rejected.
    Fractional(f64),
    Formatted(String),
}

impl Default for ReportedDuration {
    fn default() -> Self {
        ReportedDuration::Nanos(0)
    }
}

impl ReportedDuration {
    /// Raw nanosecond value, if the backend sent a number.
    pub fn as_nanos(&self) -> Option<f64> {
        match self {
            ReportedDuration::Nanos(n) => Some(*n as f64),
            ReportedDuration::Fractional(n) => Some(*n),
            ReportedDuration::Formatted(_) => None,
        }
    }

    fn is_zero(&self) -> bool {
        self.as_nanos() == Some(0.0)
    }
}

impl From<i64> for ReportedDuration {
    fn from(nanos: i64) -> Self {
        ReportedDuration::Nanos(nanos)
    }
}

impl From<&str> for ReportedDuration {
    fn from(s: &str) -> Self {
        ReportedDuration::Formatted(s.to_string())
    }
}

impl fmt::Display for ReportedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self))
    }
}

/// Formats a per-query timing. Strings pass through untouched.
pub fn format_duration(duration: &ReportedDuration) -> String {
    match duration {
        ReportedDuration::Formatted(s) => s.clone(),
        ReportedDuration::Nanos(n) if (*n as f64) < NANOS_PER_MICRO => format!("{}ns", n),
        ReportedDuration::Fractional(n) if *n < NANOS_PER_MICRO => format!("{}ns", n),
        other => {
            let nanos = other.as_nanos().unwrap_or_default();
            if nanos < NANOS_PER_MILLI {
                format!("{:.2}μs", nanos / NANOS_PER_MICRO)
            } else {
                format!("{:.2}ms", nanos / NANOS_PER_MILLI)
            }
        }
    }
}

/// Formats an aggregate optimizer timing. Absent, zero or empty reads as `0ms`.
pub fn format_aggregate_duration(duration: Option<&ReportedDuration>) -> String {
    let duration = match duration {
        None => return "0ms".to_string(),
        Some(d) if d.is_zero() => return "0ms".to_string(),
        Some(ReportedDuration::Formatted(s)) if s.trim().is_empty() => return "0ms".to_string(),
        Some(d) => d,
    };

    let nanos = match duration {
        ReportedDuration::Formatted(s) => return s.clone(),
        other => other.as_nanos().unwrap_or_default(),
    };

    if nanos < NANOS_PER_MILLI {
        format!("{:.2}μs", nanos / NANOS_PER_MICRO)
    } else if nanos < NANOS_PER_SEC {
        format!("{:.2}ms", nanos / NANOS_PER_MILLI)
    } else {
        format!("{:.2}s", nanos / NANOS_PER_SEC)
    }
}

//! Throughput humanization

use crate::error::{HandlerError, Result};
use std::fmt;
use std::str::FromStr;

/// Base unit of a throughput metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedUnit {
    BitPerSecond,
    KbitPerSecond,
}

impl SpeedUnit {
    /// Scale thresholds, largest first
    fn thresholds(self) -> &'static [(f64, &'static str)] {
        match self {
            SpeedUnit::BitPerSecond => &[
                (1_000_000_000.0, "Gbit/s"),
                (1_000_000.0, "Mbit/s"),
                (1_000.0, "kbit/s"),
            ],
            SpeedUnit::KbitPerSecond => &[(1_000_000.0, "Gbit/s"), (1_000.0, "Mbit/s")],
        }
    }
}

impl FromStr for SpeedUnit {
    type Err = HandlerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "bit/s" => Ok(SpeedUnit::BitPerSecond),
            "kbit/s" => Ok(SpeedUnit::KbitPerSecond),
            other => Err(HandlerError::UnsupportedMeasure(other.to_string())),
        }
    }
}

impl fmt::Display for SpeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeedUnit::BitPerSecond => write!(f, "bit/s"),
            SpeedUnit::KbitPerSecond => write!(f, "kbit/s"),
        }
    }
}

/// Format a rate for humans
///
/// Rates below 1000 are returned bare with a trailing space. Larger rates are
/// scaled to the biggest unit they reach: whole multiples print as integers,
/// anything else with two decimals.
pub fn humanize_speed(speed: f64, unit: SpeedUnit) -> Result<String> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(HandlerError::InvalidRate(speed));
    }

    if speed < 1000.0 {
        return Ok(format!("{} ", bare(speed)));
    }

    for &(threshold, name) in unit.thresholds() {
        if speed >= threshold {
            let scaled = speed / threshold;
            return Ok(if scaled.floor() * threshold == speed {
                format!("{:.0} {}", scaled, name)
            } else {
                format!("{:.2} {}", scaled, name)
            });
        }
    }

    Err(HandlerError::InvalidRate(speed))
}

fn bare(speed: f64) -> String {
    if speed.fract() == 0.0 {
        format!("{}", speed as u64)
    } else {
        format!("{}", speed)
    }
}

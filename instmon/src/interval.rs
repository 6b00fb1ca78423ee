//! Look-back windows a metrics fetch can ask for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IntervalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInterval {
    #[default]
    #[serde(rename = "60mins")]
    SixtyMins,
    #[serde(rename = "30mins")]
    ThirtyMins,
    #[serde(rename = "15mins")]
    FifteenMins,
    #[serde(rename = "5mins")]
    FiveMins,
    #[serde(rename = "1min")]
    OneMin,
}

impl TimeInterval {
    pub const ALL: [TimeInterval; 5] = [
        TimeInterval::SixtyMins,
        TimeInterval::ThirtyMins,
        TimeInterval::FifteenMins,
        TimeInterval::FiveMins,
        TimeInterval::OneMin,
    ];

    /// Query-string token, e.g. `30mins`.
    pub fn as_str(self) -> &'static str {
        match self {
            TimeInterval::SixtyMins => "60mins",
            TimeInterval::ThirtyMins => "30mins",
            TimeInterval::FifteenMins => "15mins",
            TimeInterval::FiveMins => "5mins",
            TimeInterval::OneMin => "1min",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeInterval::SixtyMins => "1 Hour",
            TimeInterval::ThirtyMins => "30 Minutes",
            TimeInterval::FifteenMins => "15 Minutes",
            TimeInterval::FiveMins => "5 Minutes",
            TimeInterval::OneMin => "1 Minute",
        }
    }

    pub fn minutes(self) -> u32 {
        match self {
            TimeInterval::SixtyMins => 60,
            TimeInterval::ThirtyMins => 30,
            TimeInterval::FifteenMins => 15,
            TimeInterval::FiveMins => 5,
            TimeInterval::OneMin => 1,
        }
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeInterval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeInterval::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or(IntervalError::Format)
    }
}

/// Parse `<n>mins` or `<n>min` into minutes. Accepts any `n`, not only the
/// enumerated options.
pub fn lookback_minutes(s: &str) -> Result<u32, IntervalError> {
    let digits = s
        .strip_suffix("mins")
        .or_else(|| s.strip_suffix("min"))
        .ok_or(IntervalError::Format)?;
    digits
        .parse::<u32>()
        .map_err(|e| IntervalError::Number(format!("{e} ({digits:?})")))
}

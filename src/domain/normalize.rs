//! Indicator normalization: raw metric value to a 0-100 "goodness" score.

use serde::{Deserialize, Serialize};

/// Neutral score used whenever a range or weight set is degenerate.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Polarity of an indicator relative to favourable market timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

impl Direction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "higher" | "higher_is_better" | "high" => Some(Direction::HigherIsBetter),
            "lower" | "lower_is_better" | "low" => Some(Direction::LowerIsBetter),
            _ => None,
        }
    }

    pub fn is_higher_better(self) -> bool {
        self == Direction::HigherIsBetter
    }
}

/// Two-threshold piecewise-linear scoring.
///
/// `good` maps to 100 and `bad` maps to 0, with linear interpolation between
/// them. Both boundaries are inclusive. A degenerate range (`good == bad`)
/// yields [`NEUTRAL_SCORE`].
///
/// Callers must reject NaN before calling; the function is total over finite input.
pub fn normalize(value: f64, good: f64, bad: f64, direction: Direction) -> f64 {
    if good == bad {
        return NEUTRAL_SCORE;
    }

    match direction {
        Direction::HigherIsBetter => {
            if value >= good {
                100.0
            } else if value <= bad {
                0.0
            } else {
                (value - bad) / (good - bad) * 100.0
            }
        }
        Direction::LowerIsBetter => {
            if value <= good {
                100.0
            } else if value >= bad {
                0.0
            } else {
                100.0 - (value - good) / (bad - good) * 100.0
            }
        }
    }
}

/// Round to two decimals for presentation. Values too large to scale are returned as-is.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value
    }
}

//! Additive rule-based score for the technical indicator bundle.
//!
//! The bundle starts at a neutral 50 and moves by fixed increments:
//! - RSI inside [30, 70]: +20, outside: -20
//! - MACD above zero: +15, otherwise: -15
//! - Bollinger band deviation with |x| <= 1: +15, otherwise: -15
//!
//! The result is clamped to [0, 100].

use serde::{Deserialize, Serialize};

use super::normalize::NEUTRAL_SCORE;

pub const RSI_KEY: &str = "rsi";
pub const MACD_KEY: &str = "macd";
pub const BOLLINGER_KEY: &str = "bollinger_bands";

const RSI_LOWER: f64 = 30.0;
const RSI_UPPER: f64 = 70.0;
const RSI_STEP: f64 = 20.0;
const MACD_STEP: f64 = 15.0;
const BOLLINGER_LIMIT: f64 = 1.0;
const BOLLINGER_STEP: f64 = 15.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub bollinger_bands: Option<f64>,
}

impl TechnicalIndicators {
    /// True when at least one component is present.
    pub fn is_present(&self) -> bool {
        self.rsi.is_some() || self.macd.is_some() || self.bollinger_bands.is_some()
    }

    pub fn score(&self) -> f64 {
        let mut score = NEUTRAL_SCORE;

        if let Some(rsi) = self.rsi {
            if (RSI_LOWER..=RSI_UPPER).contains(&rsi) {
                score += RSI_STEP;
            } else {
                score -= RSI_STEP;
            }
        }

        if let Some(macd) = self.macd {
            if macd > 0.0 {
                score += MACD_STEP;
            } else {
                score -= MACD_STEP;
            }
        }

        if let Some(deviation) = self.bollinger_bands {
            if deviation.abs() <= BOLLINGER_LIMIT {
                score += BOLLINGER_STEP;
            } else {
                score -= BOLLINGER_STEP;
            }
        }

        score.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(rsi: Option<f64>, macd: Option<f64>, bb: Option<f64>) -> TechnicalIndicators {
        TechnicalIndicators {
            rsi,
            macd,
            bollinger_bands: bb,
        }
    }

    #[test]
    fn empty_bundle_is_neutral_and_absent() {
        let t = TechnicalIndicators::default();
        assert!(!t.is_present());
        assert_eq!(t.score(), 50.0);
    }

    #[test]
    fn all_bullish_caps_at_hundred() {
        assert_eq!(bundle(Some(55.0), Some(2.5), Some(0.4)).score(), 100.0);
    }

    #[test]
    fn all_bearish_floors_at_zero() {
        assert_eq!(bundle(Some(85.0), Some(-1.0), Some(-2.0)).score(), 0.0);
    }

    #[test]
    fn rsi_bounds_are_inclusive() {
        assert_eq!(bundle(Some(30.0), None, None).score(), 70.0);
        assert_eq!(bundle(Some(70.0), None, None).score(), 70.0);
        assert_eq!(bundle(Some(29.9), None, None).score(), 30.0);
    }

    #[test]
    fn macd_zero_counts_as_bearish() {
        assert_eq!(bundle(None, Some(0.0), None).score(), 35.0);
    }

    #[test]
    fn mixed_signals() {
        // rsi +20, macd +15, band deviation 1.2 -> -15
        assert_eq!(bundle(Some(55.0), Some(2.5), Some(1.2)).score(), 70.0);
        assert!(bundle(None, None, Some(1.2)).is_present());
    }
}

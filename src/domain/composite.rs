//! Composite timing score and the canonical output record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::dimension::DimensionScore;
use super::normalize::round2;
use super::rules::Dimension;
use super::strength::{StrengthLevel, StrengthThresholds};

pub const DEFAULT_MACRO_WEIGHT: f64 = 0.4;
pub const DEFAULT_INDUSTRY_WEIGHT: f64 = 0.3;
pub const DEFAULT_SENTIMENT_WEIGHT: f64 = 0.3;

/// Top-level dimension weights. Expected to sum to 1; not renormalized here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionWeights {
    #[serde(rename = "macro_fundamental")]
    pub macro_weight: f64,
    #[serde(rename = "industry_fundamental")]
    pub industry_weight: f64,
    #[serde(rename = "market_sentiment")]
    pub sentiment_weight: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            macro_weight: DEFAULT_MACRO_WEIGHT,
            industry_weight: DEFAULT_INDUSTRY_WEIGHT,
            sentiment_weight: DEFAULT_SENTIMENT_WEIGHT,
        }
    }
}

impl DimensionWeights {
    pub fn new(macro_weight: f64, industry_weight: f64, sentiment_weight: f64) -> Self {
        Self {
            macro_weight,
            industry_weight,
            sentiment_weight,
        }
    }

    pub fn for_dimension(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Macro => self.macro_weight,
            Dimension::Industry => self.industry_weight,
            Dimension::Sentiment => self.sentiment_weight,
        }
    }

    pub fn sum(&self) -> f64 {
        self.macro_weight + self.industry_weight + self.sentiment_weight
    }
}

/// `macro * w_macro + industry * w_industry + sentiment * w_sentiment`.
///
/// Malformed weights can push the result outside [0, 100]; it is returned as-is.
pub fn composite_score(
    macro_score: f64,
    industry_score: f64,
    sentiment_score: f64,
    weights: &DimensionWeights,
) -> f64 {
    macro_score * weights.macro_weight
        + industry_score * weights.industry_weight
        + sentiment_score * weights.sentiment_weight
}

/// The unit of output: one immutable record per (market, date) scoring request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingIndicatorRecord {
    pub market: String,
    pub date: NaiveDate,
    pub overall_score: f64,
    pub macro_score: f64,
    pub industry_score: f64,
    pub sentiment_score: f64,
    pub weights: DimensionWeights,
    pub strength_level: StrengthLevel,
    pub calculated_at: DateTime<Utc>,
}

impl TimingIndicatorRecord {
    /// Build the record from unrounded dimension scores.
    ///
    /// Classification uses the unrounded overall score; only the stored scores are rounded.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        market: &str,
        date: NaiveDate,
        macro_score: &DimensionScore,
        industry_score: &DimensionScore,
        sentiment_score: &DimensionScore,
        weights: DimensionWeights,
        thresholds: &StrengthThresholds,
        calculated_at: DateTime<Utc>,
    ) -> Self {
        let overall = composite_score(
            macro_score.score,
            industry_score.score,
            sentiment_score.score,
            &weights,
        );

        Self {
            market: market.to_string(),
            date,
            overall_score: round2(overall),
            macro_score: round2(macro_score.score),
            industry_score: round2(industry_score.score),
            sentiment_score: round2(sentiment_score.score),
            weights,
            strength_level: thresholds.classify(overall),
            calculated_at,
        }
    }

    pub fn score_for(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Macro => self.macro_score,
            Dimension::Industry => self.industry_score,
            Dimension::Sentiment => self.sentiment_score,
        }
    }
}

//! Scoring engine facade: configuration plus a clock, exposing the scoring operations.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::composite::{DimensionWeights, TimingIndicatorRecord};
use super::dimension::{DimensionScore, RawIndicators, compute_dimension_score};
use super::error::TimingError;
use super::position::{PositionSizingResult, SizingRequest, size_position, sizing_sweep};
use super::rules::Dimension;
use super::scoring_config::ScoringConfig;
use super::snapshot::MarketSnapshot;

/// Stateless between calls: two calls with the same inputs and clock reading
/// produce identical results.
pub struct TimingEngine {
    config: ScoringConfig,
    clock: Arc<dyn Clock>,
}

impl Default for TimingEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl TimingEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ScoringConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn compute_dimension_score(
        &self,
        dimension: Dimension,
        raw: &RawIndicators,
    ) -> Result<DimensionScore, TimingError> {
        compute_dimension_score(dimension, raw, self.config.rules(dimension))
    }

    pub fn compute_timing_indicator(
        &self,
        market: &str,
        date: NaiveDate,
        macro_data: &RawIndicators,
        industry_data: &RawIndicators,
        market_sentiment: &RawIndicators,
    ) -> Result<TimingIndicatorRecord, TimingError> {
        self.compute_timing_indicator_with_weights(
            market,
            date,
            macro_data,
            industry_data,
            market_sentiment,
            self.config.weights,
        )
    }

    /// Same as `compute_timing_indicator`, with dimension weights for this call only.
    /// The weights are stored on the record.
    pub fn compute_timing_indicator_with_weights(
        &self,
        market: &str,
        date: NaiveDate,
        macro_data: &RawIndicators,
        industry_data: &RawIndicators,
        market_sentiment: &RawIndicators,
        weights: DimensionWeights,
    ) -> Result<TimingIndicatorRecord, TimingError> {
        for dimension in Dimension::ALL {
            let weight = weights.for_dimension(dimension);
            if !weight.is_finite() {
                return Err(TimingError::InvalidInput {
                    field: format!("weights.{}", dimension),
                    reason: format!("weight must be finite, got {}", weight),
                });
            }
        }
        if market.trim().is_empty() {
            return Err(TimingError::InvalidInput {
                field: "market".into(),
                reason: "market must not be empty".into(),
            });
        }

        let macro_score = self.compute_dimension_score(Dimension::Macro, macro_data)?;
        let industry_score = self.compute_dimension_score(Dimension::Industry, industry_data)?;
        let sentiment_score =
            self.compute_dimension_score(Dimension::Sentiment, market_sentiment)?;

        for score in [&macro_score, &industry_score, &sentiment_score] {
            if score.is_neutral_fallback() {
                debug!(market, dimension = %score.dimension, "no indicators present, using neutral score");
            }
        }

        let record = TimingIndicatorRecord::assemble(
            market,
            date,
            &macro_score,
            &industry_score,
            &sentiment_score,
            weights,
            &self.config.thresholds,
            self.clock.now(),
        );

        debug!(
            market,
            %date,
            overall = record.overall_score,
            strength = %record.strength_level,
            "computed timing indicator"
        );
        Ok(record)
    }

    pub fn score_snapshot(&self, snapshot: &MarketSnapshot) -> Result<TimingIndicatorRecord, TimingError> {
        self.compute_timing_indicator(
            &snapshot.market,
            snapshot.date,
            &snapshot.macro_data,
            &snapshot.industry_data,
            &snapshot.market_sentiment,
        )
    }

    pub fn compute_position_sizing(
        &self,
        request: &SizingRequest,
    ) -> Result<PositionSizingResult, TimingError> {
        let result = size_position(
            request,
            &self.config.thresholds,
            &self.config.position_table,
            self.clock.now(),
        )?;
        debug!(
            market = request.market.as_str(),
            score = request.timing_score,
            percentage = result.position_percentage,
            "computed position sizing"
        );
        Ok(result)
    }

    /// Sizing for scores 0, 10, ..., 100 with the capital and risk of `base`.
    pub fn position_sizing_sweep(
        &self,
        base: &SizingRequest,
    ) -> Result<Vec<PositionSizingResult>, TimingError> {
        sizing_sweep(
            base,
            &self.config.thresholds,
            &self.config.position_table,
            self.clock.now(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::ManualClock;
    use crate::domain::strength::StrengthLevel;
    use approx::assert_relative_eq;
    use chrono::{DateTime, TimeZone, Utc};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn engine() -> TimingEngine {
        TimingEngine::with_clock(ScoringConfig::default(), Arc::new(ManualClock::new(at())))
    }

    #[test]
    fn all_absent_inputs_score_neutral() {
        let empty = RawIndicators::new();
        let r = engine()
            .compute_timing_indicator("a_share", day(), &empty, &empty, &empty)
            .unwrap();
        assert_relative_eq!(r.overall_score, 50.0);
        assert_eq!(r.strength_level, StrengthLevel::Neutral);
        assert_eq!(r.calculated_at, at());
    }

    #[test]
    fn passthrough_only_dimensions() {
        let empty = RawIndicators::new();
        let industry = RawIndicators::new().with("industry_sentiment", 70.0);
        let sentiment = RawIndicators::new().with("investor_sentiment", 65.0);
        let r = engine()
            .compute_timing_indicator("a_share", day(), &empty, &industry, &sentiment)
            .unwrap();
        // 50*0.4 + 70*0.3 + 65*0.3
        assert_relative_eq!(r.overall_score, 60.5);
        assert_eq!(r.strength_level, StrengthLevel::Strong);
    }

    #[test]
    fn per_call_weights_override_config() {
        let e = engine();
        let empty = RawIndicators::new();
        let industry = RawIndicators::new().with("industry_sentiment", 70.0);
        let sentiment = RawIndicators::new().with("investor_sentiment", 90.0);
        let weights = DimensionWeights {
            macro_weight: 0.2,
            industry_weight: 0.2,
            sentiment_weight: 0.6,
        };
        let r = e
            .compute_timing_indicator_with_weights("nasdaq", day(), &empty, &industry, &sentiment, weights)
            .unwrap();
        // 50*0.2 + 70*0.2 + 90*0.6
        assert_relative_eq!(r.overall_score, 78.0);
        assert_eq!(r.weights, weights);

        let default = e
            .compute_timing_indicator("nasdaq", day(), &empty, &industry, &sentiment)
            .unwrap();
        assert_eq!(default.weights, e.config().weights);
        assert_relative_eq!(default.overall_score, 68.0);
    }

    #[test]
    fn non_finite_override_weight_is_rejected() {
        let empty = RawIndicators::new();
        let weights = DimensionWeights {
            sentiment_weight: f64::INFINITY,
            ..DimensionWeights::default()
        };
        let err = engine()
            .compute_timing_indicator_with_weights("a_share", day(), &empty, &empty, &empty, weights)
            .unwrap_err();
        assert!(matches!(err, TimingError::InvalidInput { field, .. } if field == "weights.sentiment"));
    }

    #[test]
    fn empty_market_is_invalid_input() {
        let empty = RawIndicators::new();
        let err = engine()
            .compute_timing_indicator(" ", day(), &empty, &empty, &empty)
            .unwrap_err();
        assert!(matches!(err, TimingError::InvalidInput { field, .. } if field == "market"));
    }

    #[test]
    fn nan_input_is_rejected() {
        let bad = RawIndicators::new().with("pmi", f64::NAN);
        let empty = RawIndicators::new();
        assert!(
            engine()
                .compute_timing_indicator("a_share", day(), &bad, &empty, &empty)
                .is_err()
        );
    }

    #[test]
    fn repeated_calls_are_identical_with_fixed_clock() {
        let e = engine();
        let snapshot = MarketSnapshot::new("nasdaq", day())
            .with(Dimension::Macro, "pmi", 52.0)
            .with(Dimension::Sentiment, "rsi", 55.0);
        assert_eq!(e.score_snapshot(&snapshot).unwrap(), e.score_snapshot(&snapshot).unwrap());
    }

    #[test]
    fn sizing_stamps_clock_time() {
        let r = engine()
            .compute_position_sizing(&SizingRequest::new("a_share", day(), 82.0))
            .unwrap();
        assert_eq!(r.calculated_at, at());
        assert_relative_eq!(r.position_amount, 80_000.0);
    }

    #[test]
    fn sweep_uses_engine_config() {
        let results = engine()
            .position_sizing_sweep(&SizingRequest::new("a_share", day(), 0.0))
            .unwrap();
        assert_eq!(results.len(), 11);
        assert_eq!(results[6].strength_level, StrengthLevel::Strong);
    }
}

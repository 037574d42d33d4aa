//! Position sizing: strength level and capital to a recommended allocation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::TimingError;
use super::normalize::round2;
use super::strength::{StrengthLevel, StrengthThresholds};

pub const DEFAULT_AVAILABLE_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_RISK_PER_TRADE_PCT: f64 = 2.0;

/// Allocation percentage per strength level. Unmapped levels size to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionTable {
    percentages: BTreeMap<StrengthLevel, f64>,
}

impl Default for PositionTable {
    fn default() -> Self {
        Self::empty()
            .with(StrengthLevel::VeryStrong, 80.0)
            .with(StrengthLevel::Strong, 60.0)
            .with(StrengthLevel::Neutral, 40.0)
            .with(StrengthLevel::Weak, 20.0)
            .with(StrengthLevel::VeryWeak, 0.0)
    }
}

impl PositionTable {
    pub fn empty() -> Self {
        Self {
            percentages: BTreeMap::new(),
        }
    }

    pub fn with(mut self, level: StrengthLevel, percentage: f64) -> Self {
        self.percentages.insert(level, percentage);
        self
    }

    pub fn percentage(&self, level: StrengthLevel) -> f64 {
        self.percentages.get(&level).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StrengthLevel, f64)> + '_ {
        self.percentages.iter().map(|(l, p)| (*l, *p))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSizingResult {
    pub market: String,
    pub date: NaiveDate,
    pub timing_score: f64,
    pub strength_level: StrengthLevel,
    pub position_percentage: f64,
    pub position_amount: f64,
    pub available_capital: f64,
    pub risk_per_trade_percentage: f64,
    pub risk_amount: f64,
    pub calculated_at: DateTime<Utc>,
}

/// Inputs for a sizing request. Market and date only label the result.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingRequest {
    pub market: String,
    pub date: NaiveDate,
    pub timing_score: f64,
    pub available_capital: f64,
    pub risk_per_trade_pct: f64,
}

impl SizingRequest {
    pub fn new(market: &str, date: NaiveDate, timing_score: f64) -> Self {
        Self {
            market: market.to_string(),
            date,
            timing_score,
            available_capital: DEFAULT_AVAILABLE_CAPITAL,
            risk_per_trade_pct: DEFAULT_RISK_PER_TRADE_PCT,
        }
    }

    pub fn with_capital(mut self, available_capital: f64) -> Self {
        self.available_capital = available_capital;
        self
    }

    pub fn with_risk_pct(mut self, risk_per_trade_pct: f64) -> Self {
        self.risk_per_trade_pct = risk_per_trade_pct;
        self
    }

    fn ensure_finite(&self) -> Result<(), TimingError> {
        for (field, value) in [
            ("timing_score", self.timing_score),
            ("available_capital", self.available_capital),
            ("risk_per_trade_percentage", self.risk_per_trade_pct),
        ] {
            if !value.is_finite() {
                return Err(TimingError::non_finite(field, value));
            }
        }
        Ok(())
    }
}

/// Size a position for the given request.
///
/// Capital is not validated: zero or negative capital propagates proportionally.
/// The risk amount is a fixed fraction of capital, independent of strength.
pub fn size_position(
    request: &SizingRequest,
    thresholds: &StrengthThresholds,
    table: &PositionTable,
    calculated_at: DateTime<Utc>,
) -> Result<PositionSizingResult, TimingError> {
    request.ensure_finite()?;

    let strength_level = thresholds.classify(request.timing_score);
    let position_percentage = table.percentage(strength_level);
    let position_amount = position_percentage / 100.0 * request.available_capital;
    let risk_amount = request.risk_per_trade_pct / 100.0 * request.available_capital;

    Ok(PositionSizingResult {
        market: request.market.clone(),
        date: request.date,
        timing_score: request.timing_score,
        strength_level,
        position_percentage,
        position_amount: round2(position_amount),
        available_capital: request.available_capital,
        risk_per_trade_percentage: request.risk_per_trade_pct,
        risk_amount: round2(risk_amount),
        calculated_at,
    })
}

/// Scores swept by [`sizing_sweep`]: 0, 10, ..., 100.
pub fn sweep_scores() -> impl Iterator<Item = f64> {
    (0..=100).step_by(10).map(f64::from)
}

/// Sizing for each sweep score, reusing capital and risk from `base`.
pub fn sizing_sweep(
    base: &SizingRequest,
    thresholds: &StrengthThresholds,
    table: &PositionTable,
    calculated_at: DateTime<Utc>,
) -> Result<Vec<PositionSizingResult>, TimingError> {
    sweep_scores()
        .map(|score| {
            let request = SizingRequest {
                timing_score: score,
                ..base.clone()
            };
            size_position(&request, thresholds, table, calculated_at)
        })
        .collect()
}

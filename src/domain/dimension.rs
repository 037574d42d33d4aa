//! Dimension aggregation: weighted average over the indicators that are present.
//!
//! Absent indicators contribute to neither the weighted sum nor the weight total,
//! so a dimension with a single populated indicator is scored entirely on it.
//! With nothing present the dimension falls back to the neutral score.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::TimingError;
use super::normalize::{NEUTRAL_SCORE, normalize};
use super::rules::{Dimension, IndicatorRule, RuleTable, ScoringMethod};
use super::technical::{BOLLINGER_KEY, MACD_KEY, RSI_KEY, TechnicalIndicators};

/// Raw metric values for one dimension of one (market, date) pair.
///
/// A key mapped to `None`, or not mapped at all, is absent. Absence is never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawIndicators {
    values: BTreeMap<String, Option<f64>>,
}

impl RawIndicators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.set(key, Some(value));
        self
    }

    pub fn with_absent(mut self, key: &str) -> Self {
        self.set(key, None);
        self
    }

    pub fn set(&mut self, key: &str, value: Option<f64>) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(Option::is_none)
    }

    pub fn technical(&self) -> TechnicalIndicators {
        TechnicalIndicators {
            rsi: self.get(RSI_KEY),
            macd: self.get(MACD_KEY),
            bollinger_bands: self.get(BOLLINGER_KEY),
        }
    }

    /// Reject NaN and infinities before any value reaches the normalizer.
    pub fn ensure_finite(&self, dimension: Dimension) -> Result<(), TimingError> {
        for (key, value) in self.iter() {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(TimingError::non_finite(&format!("{dimension}.{key}"), v));
                }
            }
        }
        Ok(())
    }
}

/// How a single indicator fed into its dimension score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorContribution {
    pub key: String,
    pub raw_value: Option<f64>,
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub score: f64,
    /// Sum of the weights of the indicators actually present.
    pub effective_weight: f64,
    pub contributions: Vec<IndicatorContribution>,
}

impl DimensionScore {
    pub fn is_neutral_fallback(&self) -> bool {
        self.effective_weight == 0.0
    }
}

/// Score a single rule against the raw inputs, or `None` if its input is absent.
fn score_rule(rule: &IndicatorRule, raw: &RawIndicators) -> Option<(Option<f64>, f64)> {
    match rule.method {
        ScoringMethod::Threshold {
            good,
            bad,
            direction,
        } => raw
            .get(&rule.key)
            .map(|v| (Some(v), normalize(v, good, bad, direction))),
        ScoringMethod::Passthrough => raw.get(&rule.key).map(|v| (Some(v), v)),
        ScoringMethod::Technical => {
            let bundle = raw.technical();
            bundle.is_present().then(|| (None, bundle.score()))
        }
    }
}

/// Combine the present indicators of one dimension into a single score.
pub fn compute_dimension_score(
    dimension: Dimension,
    raw: &RawIndicators,
    rules: &RuleTable,
) -> Result<DimensionScore, TimingError> {
    raw.ensure_finite(dimension)?;

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut contributions = Vec::new();

    for rule in rules.iter() {
        let Some((raw_value, score)) = score_rule(rule, raw) else {
            continue;
        };
        weighted_sum += score * rule.weight;
        total_weight += rule.weight;
        contributions.push(IndicatorContribution {
            key: rule.key.clone(),
            raw_value,
            score,
            weight: rule.weight,
        });
    }

    let score = if total_weight == 0.0 {
        NEUTRAL_SCORE
    } else {
        weighted_sum / total_weight
    };

    Ok(DimensionScore {
        dimension,
        score,
        effective_weight: total_weight,
        contributions,
    })
}

//! Per-indicator scoring rules, held as data rather than code.
//!
//! Each dimension owns a [`RuleTable`] mapping an indicator key to an immutable
//! [`IndicatorRule`]. The aggregator iterates the table uniformly, so adding an
//! indicator is a configuration change.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::normalize::Direction;
use super::normalize::Direction::{HigherIsBetter, LowerIsBetter};

/// One of the three top-level analytical categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Macro,
    Industry,
    Sentiment,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Macro, Dimension::Industry, Dimension::Sentiment];

    /// Section/column prefix used by config files and CSV headers.
    pub fn prefix(self) -> &'static str {
        match self {
            Dimension::Macro => "macro",
            Dimension::Industry => "industry",
            Dimension::Sentiment => "sentiment",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.trim().to_lowercase().as_str() {
            "macro" => Some(Dimension::Macro),
            "industry" => Some(Dimension::Industry),
            "sentiment" => Some(Dimension::Sentiment),
            _ => None,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ScoringMethod {
    /// Two-threshold piecewise-linear normalization.
    Threshold {
        good: f64,
        bad: f64,
        direction: Direction,
    },
    /// Input is already a 0-100 score.
    Passthrough,
    /// RSI / MACD / band-deviation bundle read from sibling keys.
    Technical,
}

impl ScoringMethod {
    pub fn threshold(good: f64, bad: f64, direction: Direction) -> Self {
        ScoringMethod::Threshold {
            good,
            bad,
            direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRule {
    pub key: String,
    pub method: ScoringMethod,
    pub weight: f64,
}

impl IndicatorRule {
    pub fn new(key: &str, method: ScoringMethod, weight: f64) -> Self {
        Self {
            key: key.to_string(),
            method,
            weight,
        }
    }
}

/// Ordered rule set for a single dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleTable {
    rules: Vec<IndicatorRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<IndicatorRule>) -> Self {
        let mut table = Self::default();
        for rule in rules {
            table.upsert(rule);
        }
        table
    }

    pub fn get(&self, key: &str) -> Option<&IndicatorRule> {
        self.rules.iter().find(|r| r.key == key)
    }

    /// Replace the rule with the same key, or append it.
    pub fn upsert(&mut self, rule: IndicatorRule) {
        match self.rules.iter_mut().find(|r| r.key == rule.key) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn default_for(dimension: Dimension) -> Self {
        match dimension {
            Dimension::Macro => default_macro_rules(),
            Dimension::Industry => default_industry_rules(),
            Dimension::Sentiment => default_sentiment_rules(),
        }
    }
}

pub fn default_macro_rules() -> RuleTable {
    RuleTable::new(vec![
        IndicatorRule::new("pmi", ScoringMethod::threshold(50.0, 45.0, HigherIsBetter), 0.2),
        IndicatorRule::new("cpi", ScoringMethod::threshold(2.0, 5.0, LowerIsBetter), 0.2),
        IndicatorRule::new("ppi", ScoringMethod::threshold(1.5, 4.0, LowerIsBetter), 0.15),
        IndicatorRule::new("m2", ScoringMethod::threshold(8.0, 15.0, LowerIsBetter), 0.15),
        IndicatorRule::new(
            "interest_rate",
            ScoringMethod::threshold(2.0, 5.0, LowerIsBetter),
            0.15,
        ),
    ])
}

pub fn default_industry_rules() -> RuleTable {
    RuleTable::new(vec![
        IndicatorRule::new(
            "free_cash_flow",
            ScoringMethod::threshold(10.0, 0.0, HigherIsBetter),
            0.6,
        ),
        IndicatorRule::new("industry_sentiment", ScoringMethod::Passthrough, 0.4),
    ])
}

pub fn default_sentiment_rules() -> RuleTable {
    RuleTable::new(vec![
        IndicatorRule::new(
            "volatility",
            ScoringMethod::threshold(10.0, 30.0, LowerIsBetter),
            0.3,
        ),
        IndicatorRule::new("investor_sentiment", ScoringMethod::Passthrough, 0.4),
        IndicatorRule::new("technical_indicators", ScoringMethod::Technical, 0.3),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_macro_table_has_five_rules() {
        let t = default_macro_rules();
        assert_eq!(t.len(), 5);
        let pmi = t.get("pmi").unwrap();
        assert_eq!(pmi.weight, 0.2);
        assert_eq!(
            pmi.method,
            ScoringMethod::threshold(50.0, 45.0, Direction::HigherIsBetter)
        );
    }

    #[test]
    fn upsert_replaces_existing_key_in_place() {
        let mut t = default_industry_rules();
        t.upsert(IndicatorRule::new("free_cash_flow", ScoringMethod::Passthrough, 0.5));
        assert_eq!(t.len(), 2);
        assert_eq!(t.iter().next().unwrap().method, ScoringMethod::Passthrough);
    }

    #[test]
    fn upsert_appends_new_key() {
        let mut t = default_industry_rules();
        t.upsert(IndicatorRule::new(
            "capex_growth",
            ScoringMethod::threshold(5.0, -5.0, Direction::HigherIsBetter),
            0.2,
        ));
        assert_eq!(t.len(), 3);
        assert!(t.get("capex_growth").is_some());
    }

    #[test]
    fn dimension_prefix_round_trip() {
        for d in Dimension::ALL {
            assert_eq!(Dimension::from_prefix(d.prefix()), Some(d));
        }
        assert_eq!(Dimension::from_prefix("micro"), None);
    }

    #[test]
    fn sentiment_defaults_include_technical_bundle() {
        let t = RuleTable::default_for(Dimension::Sentiment);
        assert_eq!(
            t.get("technical_indicators").map(|r| r.method),
            Some(ScoringMethod::Technical)
        );
    }
}

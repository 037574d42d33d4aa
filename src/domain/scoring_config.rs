//! Scoring configuration assembled from a [`ConfigPort`] over built-in defaults.
//!
//! Missing or unparsable entries never fail the load; they fall back to the
//! documented defaults and are reported through `tracing` instead.

use serde::Serialize;
use tracing::warn;

use super::composite::DimensionWeights;
use super::normalize::Direction;
use super::position::PositionTable;
use super::rules::{Dimension, IndicatorRule, RuleTable, ScoringMethod};
use super::strength::{StrengthLevel, StrengthThresholds};
use crate::ports::config_port::ConfigPort;

pub const WEIGHTS_SECTION: &str = "weights";
pub const THRESHOLDS_SECTION: &str = "strength_thresholds";
pub const POSITION_SECTION: &str = "position_sizes";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringConfig {
    pub macro_rules: RuleTable,
    pub industry_rules: RuleTable,
    pub sentiment_rules: RuleTable,
    pub weights: DimensionWeights,
    pub thresholds: StrengthThresholds,
    pub position_table: PositionTable,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            macro_rules: RuleTable::default_for(Dimension::Macro),
            industry_rules: RuleTable::default_for(Dimension::Industry),
            sentiment_rules: RuleTable::default_for(Dimension::Sentiment),
            weights: DimensionWeights::default(),
            thresholds: StrengthThresholds::default(),
            position_table: PositionTable::default(),
        }
    }
}

impl ScoringConfig {
    pub fn rules(&self, dimension: Dimension) -> &RuleTable {
        match dimension {
            Dimension::Macro => &self.macro_rules,
            Dimension::Industry => &self.industry_rules,
            Dimension::Sentiment => &self.sentiment_rules,
        }
    }

    fn rules_mut(&mut self, dimension: Dimension) -> &mut RuleTable {
        match dimension {
            Dimension::Macro => &mut self.macro_rules,
            Dimension::Industry => &mut self.industry_rules,
            Dimension::Sentiment => &mut self.sentiment_rules,
        }
    }

    pub fn from_port(config: &dyn ConfigPort) -> Self {
        let defaults = Self::default();

        let weights = DimensionWeights {
            macro_weight: finite_double(config, WEIGHTS_SECTION, "macro", defaults.weights.macro_weight),
            industry_weight: finite_double(
                config,
                WEIGHTS_SECTION,
                "industry",
                defaults.weights.industry_weight,
            ),
            sentiment_weight: finite_double(
                config,
                WEIGHTS_SECTION,
                "sentiment",
                defaults.weights.sentiment_weight,
            ),
        };

        let t = defaults.thresholds;
        let thresholds = StrengthThresholds {
            very_strong: finite_double(config, THRESHOLDS_SECTION, "very_strong", t.very_strong),
            strong: finite_double(config, THRESHOLDS_SECTION, "strong", t.strong),
            neutral: finite_double(config, THRESHOLDS_SECTION, "neutral", t.neutral),
            weak: finite_double(config, THRESHOLDS_SECTION, "weak", t.weak),
        };

        let position_table = if config.has_section(POSITION_SECTION) {
            load_position_table(config)
        } else {
            defaults.position_table.clone()
        };

        let mut loaded = Self {
            weights,
            thresholds,
            position_table,
            ..defaults
        };

        let mut sections = config.sections();
        sections.sort();
        for section in sections {
            let Some((prefix, key)) = section.split_once('.') else {
                continue;
            };
            let Some(dimension) = Dimension::from_prefix(prefix) else {
                continue;
            };
            let existing = loaded.rules(dimension).get(key).cloned();
            if let Some(rule) = load_rule(config, &section, key, existing) {
                loaded.rules_mut(dimension).upsert(rule);
            }
        }

        loaded
    }
}

/// `get_double` that also rejects `nan` and `inf`, which the INI parser accepts.
fn finite_double(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> f64 {
    let value = config.get_double(section, key, default);
    if value.is_finite() {
        value
    } else {
        warn!(section, key, "non-finite value, using default {}", default);
        default
    }
}

/// Only listed levels are mapped; the rest size to zero.
fn load_position_table(config: &dyn ConfigPort) -> PositionTable {
    let defaults = PositionTable::default();
    StrengthLevel::ALL
        .into_iter()
        .filter(|level| config.has_key(POSITION_SECTION, level.as_str()))
        .fold(PositionTable::empty(), |table, level| {
            let pct = finite_double(
                config,
                POSITION_SECTION,
                level.as_str(),
                defaults.percentage(level),
            );
            table.with(level, pct)
        })
}

fn load_rule(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    existing: Option<IndicatorRule>,
) -> Option<IndicatorRule> {
    let weight = finite_double(
        config,
        section,
        "weight",
        existing.as_ref().map(|r| r.weight).unwrap_or(0.0),
    );

    let has_thresholds = config.has_key(section, "good") || config.has_key(section, "bad");
    let method_name = config.get_string(section, "method").map(|m| m.trim().to_lowercase());

    let method = match method_name.as_deref() {
        Some("passthrough") => ScoringMethod::Passthrough,
        Some("technical") => ScoringMethod::Technical,
        Some("threshold") => load_threshold(config, section, existing.as_ref())?,
        Some(other) => {
            warn!(section, method = other, "unknown scoring method, keeping previous rule");
            return existing;
        }
        None if has_thresholds => load_threshold(config, section, existing.as_ref())?,
        None => match existing.as_ref() {
            Some(rule) => rule.method,
            None => ScoringMethod::Passthrough,
        },
    };

    if existing.is_none() && !config.has_key(section, "weight") {
        warn!(section, "new indicator has no weight and will not affect its dimension");
    }

    Some(IndicatorRule::new(key, method, weight))
}

fn load_threshold(
    config: &dyn ConfigPort,
    section: &str,
    existing: Option<&IndicatorRule>,
) -> Option<ScoringMethod> {
    let (def_good, def_bad, def_direction) = match existing.map(|r| r.method) {
        Some(ScoringMethod::Threshold {
            good,
            bad,
            direction,
        }) => (Some(good), Some(bad), Some(direction)),
        _ => (None, None, None),
    };

    let good = config
        .has_key(section, "good")
        .then(|| config.get_double(section, "good", f64::NAN))
        .filter(|v| v.is_finite())
        .or(def_good);
    let bad = config
        .has_key(section, "bad")
        .then(|| config.get_double(section, "bad", f64::NAN))
        .filter(|v| v.is_finite())
        .or(def_bad);

    let direction = match config.get_string(section, "direction") {
        Some(raw) => match Direction::parse(&raw) {
            Some(d) => Some(d),
            None => {
                warn!(section, direction = raw.as_str(), "unknown direction");
                def_direction
            }
        },
        None => def_direction,
    };

    match (good, bad, direction) {
        (Some(good), Some(bad), Some(direction)) => Some(ScoringMethod::threshold(good, bad, direction)),
        (Some(good), Some(bad), None) => {
            warn!(section, "no direction given, assuming higher is better");
            Some(ScoringMethod::threshold(good, bad, Direction::HigherIsBetter))
        }
        _ => {
            warn!(section, "threshold rule needs both good and bad values, skipping");
            None
        }
    }
}

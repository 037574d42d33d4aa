//! Scoring configuration validation.
//!
//! Warnings describe configurations that still score but probably not as intended.
//! Errors describe configurations that cannot classify scores consistently.

use serde::Serialize;

use super::rules::{Dimension, ScoringMethod};
use super::scoring_config::ScoringConfig;

pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate_scoring_config(config: &ScoringConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_finite(config, &mut report);
    validate_weight_sum(config, &mut report);
    validate_dimension_weights(config, &mut report);
    validate_indicator_rules(config, &mut report);
    validate_thresholds(config, &mut report);
    validate_position_table(config, &mut report);
    report
}

fn validate_finite(config: &ScoringConfig, report: &mut ValidationReport) {
    let mut check = |name: String, value: f64| {
        if !value.is_finite() {
            report.errors.push(format!("{} must be a finite number, got {}", name, value));
        }
    };

    for dimension in Dimension::ALL {
        check(format!("{} dimension weight", dimension), config.weights.for_dimension(dimension));
        for rule in config.rules(dimension).iter() {
            check(format!("{}.{} weight", dimension, rule.key), rule.weight);
            if let ScoringMethod::Threshold { good, bad, .. } = rule.method {
                check(format!("{}.{} good", dimension, rule.key), good);
                check(format!("{}.{} bad", dimension, rule.key), bad);
            }
        }
    }

    let t = &config.thresholds;
    for (name, value) in [
        ("very_strong", t.very_strong),
        ("strong", t.strong),
        ("neutral", t.neutral),
        ("weak", t.weak),
    ] {
        check(format!("strength threshold {}", name), value);
    }

    for (level, percentage) in config.position_table.iter() {
        check(format!("position percentage for {}", level), percentage);
    }
}

fn validate_weight_sum(config: &ScoringConfig, report: &mut ValidationReport) {
    let sum = config.weights.sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        report.warnings.push(format!(
            "dimension weights sum to {:.4}, expected 1.0; composite scores may leave [0, 100]",
            sum
        ));
    }
}

fn validate_dimension_weights(config: &ScoringConfig, report: &mut ValidationReport) {
    for dimension in Dimension::ALL {
        let weight = config.weights.for_dimension(dimension);
        if weight < 0.0 {
            report
                .warnings
                .push(format!("{} dimension weight is negative: {}", dimension, weight));
        }
    }
}

fn validate_indicator_rules(config: &ScoringConfig, report: &mut ValidationReport) {
    for dimension in Dimension::ALL {
        for rule in config.rules(dimension).iter() {
            if rule.weight < 0.0 {
                report.warnings.push(format!(
                    "{}.{} has negative weight: {}",
                    dimension, rule.key, rule.weight
                ));
            }
            if let ScoringMethod::Threshold { good, bad, .. } = rule.method {
                if good == bad {
                    report.warnings.push(format!(
                        "{}.{} has good == bad ({}); it always scores 50",
                        dimension, rule.key, good
                    ));
                }
            }
        }
    }
}

fn validate_thresholds(config: &ScoringConfig, report: &mut ValidationReport) {
    let t = &config.thresholds;
    if !t.is_strictly_descending() {
        report.errors.push(format!(
            "strength thresholds must be strictly descending: very_strong {} > strong {} > neutral {} > weak {}",
            t.very_strong, t.strong, t.neutral, t.weak
        ));
    }
}

fn validate_position_table(config: &ScoringConfig, report: &mut ValidationReport) {
    for (level, percentage) in config.position_table.iter() {
        if !(0.0..=100.0).contains(&percentage) {
            report.warnings.push(format!(
                "position percentage for {} is outside [0, 100]: {}",
                level, percentage
            ));
        }
    }
}

//! Read-side views over stored timing records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::composite::TimingIndicatorRecord;
use super::rules::Dimension;
use super::strength::StrengthLevel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketEntry {
    pub market: String,
    pub date: NaiveDate,
    pub overall_score: f64,
    pub macro_score: f64,
    pub industry_score: f64,
    pub sentiment_score: f64,
    pub strength_level: StrengthLevel,
}

impl From<&TimingIndicatorRecord> for MarketEntry {
    fn from(r: &TimingIndicatorRecord) -> Self {
        Self {
            market: r.market.clone(),
            date: r.date,
            overall_score: r.overall_score,
            macro_score: r.macro_score,
            industry_score: r.industry_score,
            sentiment_score: r.sentiment_score,
            strength_level: r.strength_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketComparison {
    /// Best first.
    pub markets: Vec<MarketEntry>,
    pub best_market: Option<String>,
    pub comparison_date: NaiveDate,
}

/// Rank markets by the overall score of their most recent record.
///
/// Ties keep market-name order.
pub fn compare_markets(records: &[TimingIndicatorRecord], comparison_date: NaiveDate) -> MarketComparison {
    let mut latest: BTreeMap<&str, &TimingIndicatorRecord> = BTreeMap::new();
    for record in records {
        latest
            .entry(record.market.as_str())
            .and_modify(|current| {
                if (record.date, record.calculated_at) > (current.date, current.calculated_at) {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    let mut markets: Vec<MarketEntry> = latest.values().map(|r| MarketEntry::from(*r)).collect();
    markets.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));

    MarketComparison {
        best_market: markets.first().map(|m| m.market.clone()),
        markets,
        comparison_date,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    #[default]
    Overall,
    Macro,
    Industry,
    Sentiment,
}

impl ScoreKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "overall" => Some(ScoreKind::Overall),
            "macro" => Some(ScoreKind::Macro),
            "industry" => Some(ScoreKind::Industry),
            "sentiment" => Some(ScoreKind::Sentiment),
            _ => None,
        }
    }

    pub fn score_of(self, record: &TimingIndicatorRecord) -> f64 {
        match self {
            ScoreKind::Overall => record.overall_score,
            ScoreKind::Macro => record.score_for(Dimension::Macro),
            ScoreKind::Industry => record.score_for(Dimension::Industry),
            ScoreKind::Sentiment => record.score_for(Dimension::Sentiment),
        }
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScoreKind::Overall => "overall",
            ScoreKind::Macro => "macro",
            ScoreKind::Industry => "industry",
            ScoreKind::Sentiment => "sentiment",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub score: f64,
    pub strength_level: StrengthLevel,
}

/// One point per record, in the order given.
pub fn score_trend(records: &[TimingIndicatorRecord], kind: ScoreKind) -> Vec<TrendPoint> {
    records
        .iter()
        .map(|r| TrendPoint {
            date: r.date,
            score: kind.score_of(r),
            strength_level: r.strength_level,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DimensionBreakdown {
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorBreakdown {
    #[serde(rename = "macro")]
    pub macro_dimension: DimensionBreakdown,
    pub industry: DimensionBreakdown,
    pub sentiment: DimensionBreakdown,
}

pub fn indicator_breakdown(record: &TimingIndicatorRecord) -> IndicatorBreakdown {
    let part = |dimension: Dimension| DimensionBreakdown {
        score: record.score_for(dimension),
        weight: record.weights.for_dimension(dimension),
    };
    IndicatorBreakdown {
        macro_dimension: part(Dimension::Macro),
        industry: part(Dimension::Industry),
        sentiment: part(Dimension::Sentiment),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentScores {
    #[serde(rename = "macro")]
    pub macro_score: f64,
    pub industry: f64,
    pub sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub market: String,
    pub analysis_date: NaiveDate,
    pub overall_score: f64,
    pub strength_level: StrengthLevel,
    pub component_scores: ComponentScores,
    pub recommendation: String,
}

pub fn analysis_summary(record: &TimingIndicatorRecord) -> AnalysisSummary {
    AnalysisSummary {
        market: record.market.clone(),
        analysis_date: record.date,
        overall_score: record.overall_score,
        strength_level: record.strength_level,
        component_scores: ComponentScores {
            macro_score: record.macro_score,
            industry: record.industry_score,
            sentiment: record.sentiment_score,
        },
        recommendation: record.strength_level.recommendation().to_string(),
    }
}

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::cell::RefCell;
use std::sync::Arc;
use timescore::domain::clock::ManualClock;
use timescore::domain::composite::TimingIndicatorRecord;
use timescore::domain::engine::TimingEngine;
use timescore::domain::error::TimingError;
use timescore::domain::rules::Dimension;
use timescore::domain::scoring_config::ScoringConfig;
use timescore::domain::snapshot::MarketSnapshot;
use timescore::ports::history_port::HistoryPort;
use timescore::ports::snapshot_port::SnapshotPort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
}

pub fn fixed_engine() -> TimingEngine {
    TimingEngine::with_clock(ScoringConfig::default(), Arc::new(ManualClock::new(fixed_now())))
}

/// A snapshot with every default indicator populated.
pub fn full_snapshot(market: &str, day: NaiveDate) -> MarketSnapshot {
    MarketSnapshot::new(market, day)
        .with(Dimension::Macro, "pmi", 50.5)
        .with(Dimension::Macro, "cpi", 2.1)
        .with(Dimension::Macro, "ppi", 1.8)
        .with(Dimension::Macro, "m2", 8.5)
        .with(Dimension::Macro, "interest_rate", 3.45)
        .with(Dimension::Industry, "free_cash_flow", 7.5)
        .with(Dimension::Industry, "industry_sentiment", 70.0)
        .with(Dimension::Sentiment, "volatility", 18.0)
        .with(Dimension::Sentiment, "investor_sentiment", 65.0)
        .with(Dimension::Sentiment, "rsi", 55.0)
        .with(Dimension::Sentiment, "macd", 0.5)
        .with(Dimension::Sentiment, "bollinger_bands", 0.3)
}

pub struct MockSnapshotPort {
    pub snapshots: Vec<MarketSnapshot>,
    pub error: Option<String>,
}

impl MockSnapshotPort {
    pub fn new() -> Self {
        Self {
            snapshots: Vec::new(),
            error: None,
        }
    }

    pub fn with_snapshot(mut self, snapshot: MarketSnapshot) -> Self {
        self.snapshots.push(snapshot);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl SnapshotPort for MockSnapshotPort {
    fn fetch_snapshots(&self, market: Option<&str>) -> Result<Vec<MarketSnapshot>, TimingError> {
        if let Some(reason) = &self.error {
            return Err(TimingError::InvalidInput {
                field: "input".into(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .snapshots
            .iter()
            .filter(|s| market.is_none_or(|m| s.market == m))
            .cloned()
            .collect())
    }
}

pub struct MemoryHistory {
    pub records: RefCell<Vec<TimingIndicatorRecord>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self {
            records: RefCell::new(Vec::new()),
        }
    }
}

impl HistoryPort for MemoryHistory {
    fn append(&self, record: &TimingIndicatorRecord) -> Result<String, TimingError> {
        let mut records = self.records.borrow_mut();
        records.push(record.clone());
        Ok(format!("mem_{}", records.len()))
    }

    fn list(
        &self,
        market: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<TimingIndicatorRecord>, TimingError> {
        let mut out: Vec<TimingIndicatorRecord> = self
            .records
            .borrow()
            .iter()
            .filter(|r| r.market == market)
            .filter(|r| start_date.is_none_or(|s| r.date >= s))
            .filter(|r| end_date.is_none_or(|e| r.date <= e))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(out)
    }
}

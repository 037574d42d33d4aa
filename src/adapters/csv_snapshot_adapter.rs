//! CSV file snapshot adapter.
//!
//! Expected header: `market,date,<dimension>.<key>,...`, e.g.
//! `market,date,macro.pmi,macro.cpi,sentiment.rsi`. Empty cells are absent values.

use crate::domain::error::TimingError;
use crate::domain::rules::Dimension;
use crate::domain::snapshot::MarketSnapshot;
use crate::ports::snapshot_port::SnapshotPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct CsvSnapshotAdapter {
    path: PathBuf,
}

enum Column {
    Market,
    Date,
    Indicator(Dimension, String),
    Ignored,
}

impl CsvSnapshotAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn classify_header(name: &str) -> Column {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "market" => Column::Market,
            "date" => Column::Date,
            _ => match name.split_once('.') {
                Some((prefix, key)) if !key.is_empty() => match Dimension::from_prefix(prefix) {
                    Some(dimension) => Column::Indicator(dimension, key.to_string()),
                    None => {
                        warn!(column = name.as_str(), "unknown dimension prefix, ignoring column");
                        Column::Ignored
                    }
                },
                _ => {
                    warn!(column = name.as_str(), "column is not <dimension>.<key>, ignoring");
                    Column::Ignored
                }
            },
        }
    }

    pub fn parse(content: &str, market_filter: Option<&str>) -> Result<Vec<MarketSnapshot>, TimingError> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let columns: Vec<Column> = rdr
            .headers()
            .map_err(|e| TimingError::InvalidInput {
                field: "header".into(),
                reason: format!("CSV parse error: {}", e),
            })?
            .iter()
            .map(Self::classify_header)
            .collect();

        if !columns.iter().any(|c| matches!(c, Column::Market))
            || !columns.iter().any(|c| matches!(c, Column::Date))
        {
            return Err(TimingError::InvalidInput {
                field: "header".into(),
                reason: "CSV must have market and date columns".into(),
            });
        }

        let mut snapshots = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let line = row + 2;
            let record = result.map_err(|e| TimingError::InvalidInput {
                field: format!("line {}", line),
                reason: format!("CSV parse error: {}", e),
            })?;

            let mut market = None;
            let mut date = None;
            let mut values = Vec::new();

            for (column, cell) in columns.iter().zip(record.iter()) {
                let cell = cell.trim();
                match column {
                    Column::Market => market = Some(cell.to_string()),
                    Column::Date => {
                        date = Some(NaiveDate::parse_from_str(cell, "%Y-%m-%d").map_err(|e| {
                            TimingError::InvalidInput {
                                field: format!("line {} date", line),
                                reason: format!("invalid date format: {}", e),
                            }
                        })?)
                    }
                    Column::Indicator(dimension, key) => {
                        let value = if cell.is_empty() {
                            None
                        } else {
                            Some(cell.parse::<f64>().map_err(|e| TimingError::InvalidInput {
                                field: format!("line {} {}.{}", line, dimension, key),
                                reason: format!("invalid number '{}': {}", cell, e),
                            })?)
                        };
                        values.push((*dimension, key.as_str(), value));
                    }
                    Column::Ignored => {}
                }
            }

            let (Some(market), Some(date)) = (market.filter(|m| !m.is_empty()), date) else {
                return Err(TimingError::InvalidInput {
                    field: format!("line {}", line),
                    reason: "missing market or date".into(),
                });
            };

            if market_filter.is_some_and(|m| m != market) {
                continue;
            }

            let mut snapshot = MarketSnapshot::new(&market, date);
            for (dimension, key, value) in values {
                snapshot.raw_mut(dimension).set(key, value);
            }
            snapshots.push(snapshot);
        }

        Ok(snapshots)
    }
}

impl SnapshotPort for CsvSnapshotAdapter {
    fn fetch_snapshots(&self, market: Option<&str>) -> Result<Vec<MarketSnapshot>, TimingError> {
        let content = fs::read_to_string(&self.path).map_err(|e| TimingError::InvalidInput {
            field: "input".into(),
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let snapshots = Self::parse(&content, market)?;
        debug!(path = %self.path.display(), count = snapshots.len(), "loaded snapshots");
        Ok(snapshots)
    }
}

//! Append-only JSON file history adapter.
//!
//! File layout:
//! ```json
//! { "timing_indicators": [ { "id": "...", "created_at": "...", ...record } ],
//!   "metadata": { "created_at": "...", "last_updated": "..." } }
//! ```

use crate::domain::composite::TimingIndicatorRecord;
use crate::domain::error::TimingError;
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

pub const DEFAULT_HISTORY_PATH: &str = "data/timing_history.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    id: String,
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    record: TimingIndicatorRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Metadata {
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    timing_indicators: Vec<StoredRecord>,
    metadata: Metadata,
}

impl HistoryFile {
    fn empty(now: DateTime<Utc>) -> Self {
        Self {
            timing_indicators: Vec::new(),
            metadata: Metadata {
                created_at: now,
                last_updated: now,
            },
        }
    }
}

pub struct JsonHistoryAdapter {
    path: PathBuf,
    // serializes read-modify-write cycles from this process
    write_lock: Mutex<()>,
}

impl JsonHistoryAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let path = config
            .get_string("history", "path")
            .unwrap_or_else(|| DEFAULT_HISTORY_PATH.to_string());
        Self::new(PathBuf::from(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_err(&self, action: &str, e: impl std::fmt::Display) -> TimingError {
        TimingError::Storage {
            reason: format!("failed to {} {}: {}", action, self.path.display(), e),
        }
    }

    fn load(&self) -> Result<Option<HistoryFile>, TimingError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.storage_err("read", e))?;
        let file = serde_json::from_str(&content).map_err(|e| self.storage_err("parse", e))?;
        Ok(Some(file))
    }

    fn save(&self, file: &HistoryFile) -> Result<(), TimingError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.storage_err("create directory for", e))?;
        }
        let content = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, content).map_err(|e| self.storage_err("write", e))
    }
}

/// serde_json writes NaN and infinities as `null`, which the file then fails to parse.
fn check_finite(record: &TimingIndicatorRecord) -> Result<(), TimingError> {
    let fields = [
        ("overall_score", record.overall_score),
        ("macro_score", record.macro_score),
        ("industry_score", record.industry_score),
        ("sentiment_score", record.sentiment_score),
        ("weights.macro_fundamental", record.weights.macro_weight),
        ("weights.industry_fundamental", record.weights.industry_weight),
        ("weights.market_sentiment", record.weights.sentiment_weight),
    ];
    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, value)) => Err(TimingError::Storage {
            reason: format!(
                "refusing to store {} record for {}: {} is {}",
                record.market, record.date, name, value
            ),
        }),
        None => Ok(()),
    }
}

impl HistoryPort for JsonHistoryAdapter {
    fn append(&self, record: &TimingIndicatorRecord) -> Result<String, TimingError> {
        check_finite(record)?;
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now();

        let mut file = match self.load()? {
            Some(file) => file,
            None => {
                info!(path = %self.path.display(), "creating history file");
                HistoryFile::empty(now)
            }
        };

        let id = format!(
            "timing_{}_{}",
            now.format("%Y%m%d_%H%M%S"),
            file.timing_indicators.len() + 1
        );
        file.timing_indicators.push(StoredRecord {
            id: id.clone(),
            created_at: now,
            record: record.clone(),
        });
        file.metadata.last_updated = now;

        self.save(&file)?;
        debug!(id = id.as_str(), market = record.market.as_str(), "appended timing record");
        Ok(id)
    }

    fn list(
        &self,
        market: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<TimingIndicatorRecord>, TimingError> {
        let Some(file) = self.load()? else {
            return Ok(Vec::new());
        };

        let mut records: Vec<TimingIndicatorRecord> = file
            .timing_indicators
            .into_iter()
            .map(|stored| stored.record)
            .filter(|r| r.market == market)
            .filter(|r| start_date.is_none_or(|start| r.date >= start))
            .filter(|r| end_date.is_none_or(|end| r.date <= end))
            .collect();

        // stable sort keeps later appends ahead within the same date after reverse
        records.sort_by(|a, b| (a.date, a.calculated_at).cmp(&(b.date, b.calculated_at)));
        records.reverse();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::composite::DimensionWeights;
    use crate::domain::strength::StrengthLevel;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn record(market: &str, date: (i32, u32, u32), overall: f64) -> TimingIndicatorRecord {
        TimingIndicatorRecord {
            market: market.to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            overall_score: overall,
            macro_score: overall,
            industry_score: overall,
            sentiment_score: overall,
            weights: DimensionWeights::default(),
            strength_level: StrengthLevel::Neutral,
            calculated_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        }
    }

    fn adapter(dir: &TempDir) -> JsonHistoryAdapter {
        JsonHistoryAdapter::new(dir.path().join("nested").join("history.json"))
    }

    #[test]
    fn list_on_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(adapter(&dir).list("a_share", None, None).unwrap().is_empty());
    }

    #[test]
    fn append_creates_file_and_returns_id() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);
        let id = store.append(&record("a_share", (2024, 1, 15), 55.0)).unwrap();
        assert!(id.starts_with("timing_"));
        assert!(id.ends_with("_1"));
        assert!(store.path().exists());
    }

    #[test]
    fn list_filters_by_market_and_sorts_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);
        store.append(&record("a_share", (2024, 1, 10), 40.0)).unwrap();
        store.append(&record("nasdaq", (2024, 1, 12), 70.0)).unwrap();
        store.append(&record("a_share", (2024, 1, 15), 55.0)).unwrap();

        let records = store.list("a_share", None, None).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].overall_score, 55.0);
        assert_eq!(records[1].overall_score, 40.0);
    }

    #[test]
    fn list_applies_inclusive_date_range() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);
        for day in [5, 10, 15, 20] {
            store.append(&record("a_share", (2024, 1, day), day as f64)).unwrap();
        }
        let records = store
            .list(
                "a_share",
                NaiveDate::from_ymd_opt(2024, 1, 10),
                NaiveDate::from_ymd_opt(2024, 1, 15),
            )
            .unwrap();
        let days: Vec<f64> = records.iter().map(|r| r.overall_score).collect();
        assert_eq!(days, vec![15.0, 10.0]);
    }

    #[test]
    fn records_are_never_mutated_by_later_appends() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);
        let first = record("a_share", (2024, 1, 15), 55.0);
        store.append(&first).unwrap();
        store.append(&record("a_share", (2024, 1, 16), 65.0)).unwrap();
        let records = store.list("a_share", None, None).unwrap();
        assert_eq!(records[1], first);
    }

    #[test]
    fn latest_returns_newest() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);
        assert!(store.latest("a_share").unwrap().is_none());
        store.append(&record("a_share", (2024, 1, 10), 40.0)).unwrap();
        store.append(&record("a_share", (2024, 1, 15), 55.0)).unwrap();
        assert_eq!(store.latest("a_share").unwrap().unwrap().overall_score, 55.0);
    }

    #[test]
    fn non_finite_record_is_refused_and_file_stays_readable() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);
        assert!(matches!(
            store.append(&record("a_share", (2024, 1, 10), f64::NAN)),
            Err(TimingError::Storage { .. })
        ));
        assert!(!store.path().exists());

        store.append(&record("a_share", (2024, 1, 15), 55.0)).unwrap();
        let mut bad = record("a_share", (2024, 1, 16), 60.0);
        bad.sentiment_score = f64::INFINITY;
        assert!(store.append(&bad).is_err());

        let records = store.list("a_share", None, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].overall_score, 55.0);
    }

    #[test]
    fn corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "not json").unwrap();
        let store = JsonHistoryAdapter::new(path);
        assert!(matches!(
            store.list("a_share", None, None),
            Err(TimingError::Storage { .. })
        ));
    }
}

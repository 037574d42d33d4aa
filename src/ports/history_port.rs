//! Append-only timing history port trait.

use chrono::NaiveDate;

use crate::domain::composite::TimingIndicatorRecord;
use crate::domain::error::TimingError;

pub trait HistoryPort {
    /// Append a record and return the id it was stored under.
    fn append(&self, record: &TimingIndicatorRecord) -> Result<String, TimingError>;

    /// Records for `market` within the inclusive date range, newest first.
    fn list(
        &self,
        market: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<TimingIndicatorRecord>, TimingError>;

    fn latest(&self, market: &str) -> Result<Option<TimingIndicatorRecord>, TimingError> {
        Ok(self.list(market, None, None)?.into_iter().next())
    }
}

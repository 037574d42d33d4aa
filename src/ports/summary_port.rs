//! Narrative summary port trait.

use crate::domain::composite::TimingIndicatorRecord;
use crate::domain::error::TimingError;
use crate::domain::summary::Narrative;

pub trait SummaryPort {
    fn summarize(&self, record: &TimingIndicatorRecord) -> Result<Narrative, TimingError>;
}

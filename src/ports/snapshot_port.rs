//! Raw input access port trait.

use crate::domain::error::TimingError;
use crate::domain::snapshot::MarketSnapshot;

pub trait SnapshotPort {
    /// All snapshots, optionally restricted to one market, in source order.
    fn fetch_snapshots(&self, market: Option<&str>) -> Result<Vec<MarketSnapshot>, TimingError>;
}

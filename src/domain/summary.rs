//! Narrative summaries of timing records, with a TTL cache keyed by (market, date).

use chrono::{DateTime, Duration, NaiveDate, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::clock::Clock;
use super::composite::TimingIndicatorRecord;
use super::error::TimingError;
use crate::ports::config_port::ConfigPort;
use crate::ports::summary_port::SummaryPort;

pub const SUMMARY_SECTION: &str = "summary";
pub const DEFAULT_CACHE_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub market: String,
    pub date: NaiveDate,
    pub analysis: String,
    pub summary: String,
    pub recommendation: String,
    pub risk_level: RiskLevel,
    pub time_horizon: String,
    pub is_fallback: bool,
    pub calculated_at: DateTime<Utc>,
}

/// Deterministic narrative from fixed score bands 80/60/40/20.
pub struct RuleBasedSummarizer {
    clock: Arc<dyn Clock>,
}

impl RuleBasedSummarizer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn band(score: f64) -> (&'static str, &'static str, RiskLevel) {
        if score >= 80.0 {
            (
                "Timing signal is very strong; build positions actively. Macro, industry and sentiment all look favourable.",
                "Strong buy",
                RiskLevel::Low,
            )
        } else if score >= 60.0 {
            (
                "Timing signal is strong; allocate moderately while watching for emerging risks.",
                "Buy",
                RiskLevel::Medium,
            )
        } else if score >= 40.0 {
            (
                "Timing signal is neutral; wait or hold a light position until more data arrives.",
                "Hold",
                RiskLevel::Medium,
            )
        } else if score >= 20.0 {
            (
                "Timing signal is weak; trade cautiously or reduce exposure.",
                "Caution",
                RiskLevel::High,
            )
        } else {
            (
                "Timing signal is very weak; avoid the market or stay in cash.",
                "Avoid",
                RiskLevel::High,
            )
        }
    }
}

impl SummaryPort for RuleBasedSummarizer {
    fn summarize(&self, record: &TimingIndicatorRecord) -> Result<Narrative, TimingError> {
        let (analysis, recommendation, risk_level) = Self::band(record.overall_score);
        Ok(Narrative {
            market: record.market.clone(),
            date: record.date,
            analysis: analysis.to_string(),
            summary: format!(
                "Timing score {:.2}, strength {}",
                record.overall_score, record.strength_level
            ),
            recommendation: recommendation.to_string(),
            risk_level,
            time_horizon: "short_term".to_string(),
            is_fallback: true,
            calculated_at: self.clock.now(),
        })
    }
}

struct CacheEntry {
    narrative: Narrative,
    cached_at: DateTime<Utc>,
}

/// Narratives keyed by (market, date). Expired entries are evicted on read.
pub struct SummaryCache {
    entries: DashMap<(String, NaiveDate), CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SummaryCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn get(&self, market: &str, date: NaiveDate) -> Option<Narrative> {
        let key = (market.to_string(), date);
        let now = self.clock.now();
        // remove_if re-checks expiry under the shard lock
        if self.entries.remove_if(&key, |_, e| now - e.cached_at >= self.ttl).is_some() {
            debug!(market, %date, "evicted expired summary");
            return None;
        }
        self.entries
            .get(&key)
            .filter(|e| now - e.cached_at < self.ttl)
            .map(|e| e.narrative.clone())
    }

    /// Drops every expired entry.
    pub fn cleanup(&self) {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, e| now - e.cached_at < self.ttl);
        debug!(removed = before.saturating_sub(self.entries.len()), "summary cache cleanup");
    }

    pub fn insert(&self, narrative: Narrative) {
        let key = (narrative.market.clone(), narrative.date);
        self.entries.insert(
            key,
            CacheEntry {
                narrative,
                cached_at: self.clock.now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummarySettings {
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl: Duration::minutes(DEFAULT_CACHE_TTL_MINUTES),
        }
    }
}

impl SummarySettings {
    pub fn from_port(config: &dyn ConfigPort) -> Self {
        let minutes = config.get_int(SUMMARY_SECTION, "cache_ttl_minutes", DEFAULT_CACHE_TTL_MINUTES);
        let cache_ttl = Duration::try_minutes(minutes.max(0)).unwrap_or_else(|| {
            warn!(minutes, "cache_ttl_minutes out of range, using default {}", DEFAULT_CACHE_TTL_MINUTES);
            Duration::minutes(DEFAULT_CACHE_TTL_MINUTES)
        });
        Self {
            cache_enabled: config.get_bool(SUMMARY_SECTION, "cache_enabled", true),
            cache_ttl,
        }
    }
}

/// Wraps a summary source with the cache and the rule-based fallback.
///
/// Fallback narratives are returned but never cached.
pub struct CachedSummarizer<P: SummaryPort> {
    inner: P,
    fallback: RuleBasedSummarizer,
    cache: Option<SummaryCache>,
}

impl<P: SummaryPort> CachedSummarizer<P> {
    pub fn new(inner: P, settings: SummarySettings, clock: Arc<dyn Clock>) -> Self {
        let cache = settings
            .cache_enabled
            .then(|| SummaryCache::new(settings.cache_ttl, Arc::clone(&clock)));
        Self {
            inner,
            fallback: RuleBasedSummarizer::new(clock),
            cache,
        }
    }

    pub fn cache(&self) -> Option<&SummaryCache> {
        self.cache.as_ref()
    }
}

impl<P: SummaryPort> SummaryPort for CachedSummarizer<P> {
    fn summarize(&self, record: &TimingIndicatorRecord) -> Result<Narrative, TimingError> {
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(&record.market, record.date)) {
            debug!(market = record.market.as_str(), date = %record.date, "summary cache hit");
            return Ok(hit);
        }

        match self.inner.summarize(record) {
            Ok(narrative) => {
                if let Some(cache) = &self.cache {
                    cache.insert(narrative.clone());
                }
                Ok(narrative)
            }
            Err(e) => {
                warn!(market = record.market.as_str(), error = %e, "summary source failed, using rule-based fallback");
                self.fallback.summarize(record)
            }
        }
    }
}

//! Raw inputs for one (market, date) scoring request.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dimension::RawIndicators;
use super::rules::Dimension;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub market: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub macro_data: RawIndicators,
    #[serde(default)]
    pub industry_data: RawIndicators,
    #[serde(default)]
    pub market_sentiment: RawIndicators,
}

impl MarketSnapshot {
    pub fn new(market: &str, date: NaiveDate) -> Self {
        Self {
            market: market.to_string(),
            date,
            macro_data: RawIndicators::new(),
            industry_data: RawIndicators::new(),
            market_sentiment: RawIndicators::new(),
        }
    }

    pub fn raw(&self, dimension: Dimension) -> &RawIndicators {
        match dimension {
            Dimension::Macro => &self.macro_data,
            Dimension::Industry => &self.industry_data,
            Dimension::Sentiment => &self.market_sentiment,
        }
    }

    pub fn raw_mut(&mut self, dimension: Dimension) -> &mut RawIndicators {
        match dimension {
            Dimension::Macro => &mut self.macro_data,
            Dimension::Industry => &mut self.industry_data,
            Dimension::Sentiment => &mut self.market_sentiment,
        }
    }

    pub fn with(mut self, dimension: Dimension, key: &str, value: f64) -> Self {
        self.raw_mut(dimension).set(key, Some(value));
        self
    }
}

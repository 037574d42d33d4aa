//! Five-way strength classification of an overall timing score.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLevel {
    VeryWeak,
    Weak,
    Neutral,
    Strong,
    VeryStrong,
}

impl StrengthLevel {
    /// All levels, weakest first.
    pub const ALL: [StrengthLevel; 5] = [
        StrengthLevel::VeryWeak,
        StrengthLevel::Weak,
        StrengthLevel::Neutral,
        StrengthLevel::Strong,
        StrengthLevel::VeryStrong,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrengthLevel::VeryWeak => "very_weak",
            StrengthLevel::Weak => "weak",
            StrengthLevel::Neutral => "neutral",
            StrengthLevel::Strong => "strong",
            StrengthLevel::VeryStrong => "very_strong",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == value.trim().to_lowercase())
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            StrengthLevel::VeryStrong => "Strong buy - timing signal is very strong",
            StrengthLevel::Strong => "Buy - timing signal is strong",
            StrengthLevel::Neutral => "Hold - timing signal is neutral",
            StrengthLevel::Weak => "Caution - timing signal is weak",
            StrengthLevel::VeryWeak => "Avoid - timing signal is very weak",
        }
    }
}

impl fmt::Display for StrengthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive lower bounds for each level above `VeryWeak`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthThresholds {
    pub very_strong: f64,
    pub strong: f64,
    pub neutral: f64,
    pub weak: f64,
}

impl Default for StrengthThresholds {
    fn default() -> Self {
        Self {
            very_strong: 80.0,
            strong: 60.0,
            neutral: 40.0,
            weak: 20.0,
        }
    }
}

impl StrengthThresholds {
    /// Checked from highest to lowest, so every real score lands in exactly one band.
    pub fn classify(&self, score: f64) -> StrengthLevel {
        if score >= self.very_strong {
            StrengthLevel::VeryStrong
        } else if score >= self.strong {
            StrengthLevel::Strong
        } else if score >= self.neutral {
            StrengthLevel::Neutral
        } else if score >= self.weak {
            StrengthLevel::Weak
        } else {
            StrengthLevel::VeryWeak
        }
    }

    pub fn is_strictly_descending(&self) -> bool {
        self.very_strong > self.strong && self.strong > self.neutral && self.neutral > self.weak
    }
}

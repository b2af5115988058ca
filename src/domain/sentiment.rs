use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// External sentiment for one instrument, clamped to [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore(f64);

impl SentimentScore {
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(-1.0, 1.0))
        } else {
            Self(0.0)
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn impact(&self) -> SentimentImpact {
        SentimentImpact::from_score(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentImpact {
    Low,
    Medium,
    High,
}

impl SentimentImpact {
    pub fn from_score(score: f64) -> Self {
        let magnitude = score.abs();
        if magnitude > 0.7 {
            Self::High
        } else if magnitude > 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for SentimentImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

#[async_trait]
pub trait SentimentSource: Send + Sync {
    /// Current sentiment for a ticker, `None` when the source has nothing on it
    async fn sentiment_for(&self, ticker: &str) -> anyhow::Result<Option<SentimentScore>>;
}

//! Headline sentiment scored locally with VADER.
//!
//! VADER's general lexicon misses a lot of market jargon ("beats estimates",
//! "guidance cut"), so the compound score is boosted by a small table of
//! equity keywords before clamping to [-1, 1].

use crate::domain::sentiment::{SentimentScore, SentimentSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};
use vader_sentiment::SentimentIntensityAnalyzer;

const BULLISH_KEYWORDS: &[(&str, f64)] = &[
    ("beats estimates", 0.5),
    ("beat estimates", 0.5),
    ("record revenue", 0.5),
    ("record high", 0.4),
    ("raises guidance", 0.5),
    ("raised guidance", 0.5),
    ("upgrade", 0.3),
    ("upgraded", 0.3),
    ("outperform", 0.3),
    ("buyback", 0.3),
    ("surge", 0.4),
    ("surges", 0.4),
    ("rally", 0.4),
    ("rallies", 0.4),
    ("soars", 0.5),
    ("breakout", 0.3),
    ("bullish", 0.5),
    ("partnership", 0.2),
    ("approval", 0.3),
    ("dividend increase", 0.3),
];

const BEARISH_KEYWORDS: &[(&str, f64)] = &[
    ("misses estimates", -0.5),
    ("missed estimates", -0.5),
    ("cuts guidance", -0.5),
    ("lowers guidance", -0.5),
    ("downgrade", -0.3),
    ("downgraded", -0.3),
    ("underperform", -0.3),
    ("plunge", -0.5),
    ("plunges", -0.5),
    ("crash", -0.5),
    ("bearish", -0.5),
    ("lawsuit", -0.4),
    ("investigation", -0.3),
    ("recall", -0.3),
    ("bankruptcy", -0.6),
    ("layoffs", -0.3),
    ("fraud", -0.5),
    ("sell-off", -0.4),
    ("selloff", -0.4),
    ("dividend cut", -0.4),
];

/// Thread-safe VADER scorer with equity keyword boosting
pub struct HeadlineAnalyzer {
    analyzer: SentimentIntensityAnalyzer<'static>,
    keyword_weight: f64,
}

impl HeadlineAnalyzer {
    pub fn new(keyword_weight: f64) -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
            keyword_weight,
        }
    }

    fn keyword_boost(&self, text: &str) -> f64 {
        let text_lower = text.to_lowercase();
        BULLISH_KEYWORDS
            .iter()
            .chain(BEARISH_KEYWORDS.iter())
            .filter(|(keyword, _)| text_lower.contains(keyword))
            .map(|(_, score)| score)
            .sum()
    }

    /// Score in [-1, 1]; blank text is neutral
    pub fn analyze(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }

        let scores = self.analyzer.polarity_scores(text);
        let compound = scores.get("compound").copied().unwrap_or(0.0);
        let combined = compound + self.keyword_boost(text) * self.keyword_weight;
        combined.clamp(-1.0, 1.0)
    }

    /// Mean headline score, `None` when there are no headlines
    pub fn analyze_all<S: AsRef<str>>(&self, headlines: &[S]) -> Option<f64> {
        if headlines.is_empty() {
            return None;
        }
        let total: f64 = headlines.iter().map(|h| self.analyze(h.as_ref())).sum();
        Some(total / headlines.len() as f64)
    }
}

/// Sentiment source backed by per-ticker headline lists, e.g. a daily
/// news dump saved as `{"AAPL": ["...", "..."], ...}`
pub struct HeadlineSentimentSource {
    analyzer: HeadlineAnalyzer,
    headlines: HashMap<String, Vec<String>>,
}

impl HeadlineSentimentSource {
    pub fn new(analyzer: HeadlineAnalyzer, headlines: HashMap<String, Vec<String>>) -> Self {
        let headlines = headlines
            .into_iter()
            .map(|(ticker, lines)| (ticker.to_uppercase(), lines))
            .collect();
        Self {
            analyzer,
            headlines,
        }
    }

    pub fn from_json_file(path: &Path, keyword_weight: f64) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read headlines from {:?}", path))?;
        let headlines: HashMap<String, Vec<String>> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse headlines file {:?}", path))?;
        info!(
            "Loaded headlines for {} tickers from {:?}",
            headlines.len(),
            path
        );
        Ok(Self::new(HeadlineAnalyzer::new(keyword_weight), headlines))
    }
}

#[async_trait]
impl SentimentSource for HeadlineSentimentSource {
    async fn sentiment_for(&self, ticker: &str) -> Result<Option<SentimentScore>> {
        let Some(lines) = self.headlines.get(&ticker.to_uppercase()) else {
            debug!("No headlines for {}", ticker);
            return Ok(None);
        };
        Ok(self.analyzer.analyze_all(lines).map(SentimentScore::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> HeadlineAnalyzer {
        HeadlineAnalyzer::new(0.5)
    }

    #[test]
    fn test_bullish_headlines() {
        let analyzer = analyzer();
        for headline in [
            "Acme beats estimates and raises guidance for the full year",
            "Shares surge after analyst upgrade",
            "Chipmaker rallies on record revenue",
        ] {
            let score = analyzer.analyze(headline);
            assert!(score > 0.0, "Expected bullish score for '{}', got {}", headline, score);
        }
    }

    #[test]
    fn test_bearish_headlines() {
        let analyzer = analyzer();
        for headline in [
            "Retailer misses estimates, cuts guidance",
            "Regulators open fraud investigation into lender",
            "Stock plunges after downgrade and layoffs",
        ] {
            let score = analyzer.analyze(headline);
            assert!(score < 0.0, "Expected bearish score for '{}', got {}", headline, score);
        }
    }

    #[test]
    fn test_empty_text_is_neutral() {
        let analyzer = analyzer();
        assert_eq!(analyzer.analyze(""), 0.0);
        assert_eq!(analyzer.analyze("   "), 0.0);
        assert_eq!(analyzer.analyze_all::<&str>(&[]), None);
    }

    #[test]
    fn test_keyword_boost_raises_score() {
        let analyzer = analyzer();
        let generic = analyzer.analyze("This is good news");
        let boosted = analyzer.analyze("This is good news, shares surge on breakout");
        assert!(boosted > generic);
    }

    #[tokio::test]
    async fn test_source_averages_headlines_per_ticker() {
        let headlines = HashMap::from([(
            "acme".to_string(),
            vec![
                "Acme shares surge after upgrade".to_string(),
                "Acme beats estimates".to_string(),
            ],
        )]);
        let source = HeadlineSentimentSource::new(analyzer(), headlines);

        let score = source.sentiment_for("ACME").await.unwrap().unwrap();
        assert!(score.value() > 0.0);
        assert!(source.sentiment_for("ZZZZ").await.unwrap().is_none());
    }

    #[test]
    fn test_load_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headlines.json");
        std::fs::write(&path, r#"{"XYZ": ["XYZ crash deepens"]}"#).unwrap();

        let source = HeadlineSentimentSource::from_json_file(&path, 0.5).unwrap();
        assert!(source.headlines.contains_key("XYZ"));
    }
}

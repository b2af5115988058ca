pub mod headline;

pub use headline::{HeadlineAnalyzer, HeadlineSentimentSource};

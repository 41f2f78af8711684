pub mod scorecard;

pub use scorecard::{QualityScoreCard, ScoreAggregator, Trend};

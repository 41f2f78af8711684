// qualis-core/src/application/scoring.rs

use std::sync::Arc;
use tracing::instrument;

use crate::domain::catalog::Catalog;
use crate::domain::scoring::{QualityScoreCard, ScoreAggregator};
use crate::error::QualisError;
use crate::ports::store::ResultStore;

/// Score cards computed from the full persisted result history.
pub struct ScoreCardService {
    catalog: Arc<Catalog>,
    results: Arc<dyn ResultStore>,
}

impl ScoreCardService {
    pub fn new(catalog: Arc<Catalog>, results: Arc<dyn ResultStore>) -> Self {
        Self { catalog, results }
    }

    #[instrument(skip(self))]
    pub async fn score_cards(&self) -> Result<Vec<QualityScoreCard>, QualisError> {
        let history = self.results.all().await?;
        Ok(ScoreAggregator::score_cards(&self.catalog, &history))
    }
}

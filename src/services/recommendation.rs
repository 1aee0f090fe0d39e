use crate::config::RecommendSettings;
use crate::error::Result;
use crate::models::{MetadataResponse, Preference, Recommendation, ValidatedPreference};
use crate::services::data_store::RestaurantDataStore;
use crate::services::llm_client::LlmClient;
use crate::services::recommender::recommend_with_explanations;
use crate::services::retrieval::{dedupe_by_name, retrieve};
use std::sync::Arc;
use tracing::info;

/// Request-scoped entry point shared by the HTTP handlers.
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<RestaurantDataStore>,
    client: Arc<dyn LlmClient>,
    settings: RecommendSettings,
}

impl RecommendationService {
    pub fn new(
        store: Arc<RestaurantDataStore>,
        client: Arc<dyn LlmClient>,
        settings: RecommendSettings,
    ) -> Self {
        Self {
            store,
            client,
            settings,
        }
    }

    /// Model identifier reported back to callers.
    pub fn model(&self) -> &str {
        &self.settings.model
    }

    pub fn metadata(&self) -> MetadataResponse {
        self.store.metadata()
    }

    /// Retrieve, dedupe and rank restaurants for a validated preference.
    ///
    /// Dedup runs on the full rating-sorted pool before the top-k cut, so the
    /// model only sees one record per name and that record is the best rated.
    /// Records below the cut are never normalized.
    pub async fn recommend(&self, preference: &ValidatedPreference) -> Result<Vec<Recommendation>> {
        let filters = Preference::from(preference);
        let unique = dedupe_by_name(retrieve(&self.store, &filters, true, None));
        let matches = unique.len();
        let pool: Vec<_> = unique
            .into_iter()
            .take(self.settings.top_k_candidates.max(1))
            .collect();

        info!(
            "Recommending from top {} of {} unique matches (pool size {})",
            pool.len(),
            matches,
            self.store.len()
        );

        let recommendations =
            recommend_with_explanations(preference, &pool, self.client.as_ref(), &self.settings)
                .await?;
        Ok(recommendations)
    }
}

use serde::Serialize;
use tracing::{debug, info};

use crate::config::RecommendSettings;
use crate::error::DataError;
use crate::models::Recommendation;
use crate::services::candidate::{coerce_candidates, Candidate, RestaurantLike};
use crate::services::llm_client::{CompletionRequest, LlmClient};
use crate::services::parser::parse_recommendations;
use crate::services::prompting::build_messages;
use crate::services::reconciler::{reconcile, RankingFailure, RankingOutcome};

/// Result count requested by the preference itself, if any.
fn requested_results<P>(preference: &P) -> Option<usize>
where
    P: Serialize + ?Sized,
{
    serde_json::to_value(preference)
        .ok()?
        .get("max_results")?
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .filter(|&n| n > 0)
}

/// Ask the model to rank `candidates`; every failure is returned as a value.
async fn rank_candidates<P>(
    preference: &P,
    candidates: &[Candidate],
    desired: usize,
    client: &dyn LlmClient,
    settings: &RecommendSettings,
) -> RankingOutcome
where
    P: Serialize + ?Sized,
{
    let messages = match build_messages(preference, candidates, desired) {
        Ok(messages) => messages,
        Err(e) => return RankingOutcome::Failed(RankingFailure::Prompt(e.to_string())),
    };

    let request = CompletionRequest {
        model: settings.model.clone(),
        messages,
        timeout: settings.timeout,
    };

    let text = match client.generate(&request).await {
        Ok(text) => text,
        Err(e) => return e.into(),
    };

    match parse_recommendations(&text) {
        Ok(parsed) => RankingOutcome::Ranked(parsed),
        Err(e) => e.into(),
    }
}

/// Rank a retrieval-ordered candidate pool and explain each pick.
///
/// Only the first `settings.top_k_candidates` sources are shown to the model.
/// Generation and parse failures never surface here: the result then follows
/// retrieval order with template explanations. A source without a name fails
/// the whole call.
pub async fn recommend_with_explanations<P, I>(
    preference: &P,
    candidates: I,
    client: &dyn LlmClient,
    settings: &RecommendSettings,
) -> Result<Vec<Recommendation>, DataError>
where
    P: Serialize + ?Sized,
    I: IntoIterator,
    I::Item: RestaurantLike,
{
    let mut candidates = coerce_candidates(candidates)?;
    if candidates.is_empty() {
        debug!("No candidates to rank");
        return Ok(Vec::new());
    }
    candidates.truncate(settings.top_k_candidates.max(1));

    let desired = requested_results(preference)
        .unwrap_or(settings.max_results)
        .clamp(1, candidates.len());

    info!(
        "Ranking {} candidates for {} results with model {}",
        candidates.len(),
        desired,
        settings.model
    );

    let outcome = rank_candidates(preference, &candidates, desired, client, settings).await;
    Ok(reconcile(&candidates, outcome, desired))
}

pub mod candidate;
pub mod data_store;
pub mod llm_client;
pub mod loader;
pub mod parser;
pub mod prompting;
pub mod recommendation;
pub mod recommender;
pub mod reconciler;
pub mod retrieval;

// Re-export public types
pub use candidate::{coerce_candidates, Candidate, RestaurantLike};
pub use data_store::RestaurantDataStore;
pub use llm_client::{ChatCompletionsClient, CompletionRequest, LlmClient};
pub use recommendation::RecommendationService;
pub use recommender::recommend_with_explanations;
pub use reconciler::{reconcile, RankingFailure, RankingOutcome};

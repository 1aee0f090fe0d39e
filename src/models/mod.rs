use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use preference::{validate_preference, Preference, ValidatedPreference};
pub use restaurant::{parse_cost, parse_rating, RestaurantRecord};

pub mod preference;
mod restaurant;

/// A single ranked, explained recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Contiguous rank starting at 1.
    pub rank: usize,
    /// Canonical candidate name, never the raw model output.
    pub restaurant_name: String,
    pub explanation: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Response structure for `POST /api/recommend`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub request_id: String,
    /// Model identifier configured for the text-generation step
    pub model_used: String,
    /// Validated filters, absent fields omitted
    pub filters_applied: ValidatedPreference,
    pub recommendations: Vec<Recommendation>,
}

/// Health check response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
}

/// Distinct areas and cuisines for populating client-side filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub areas: Vec<String>,
    pub cuisines: Vec<String>,
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error category, e.g. "Validation error"
    pub error: String,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

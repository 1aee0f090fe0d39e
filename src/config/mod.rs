use serde::Deserialize;
use std::time::Duration;

use crate::error::{ApiError, Result};

pub const DEFAULT_MODEL: &str = "grok-2-latest";
pub const DEFAULT_XAI_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_DATASET_ID: &str = "ManikaSaini/zomato-restaurant-recommendation";

/// Service configuration.
///
/// Built from defaults overlaid with `APP_*` environment variables, e.g.
/// `APP_PORT=9000` or `APP_LLM_MODEL=grok-beta`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    #[serde(default)]
    pub xai_api_key: Option<String>,
    pub xai_base_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: f64,
    pub llm_temperature: f32,

    pub top_k_candidates: usize,
    pub max_results: usize,

    pub dataset_id: String,
    pub dataset_split: String,
    /// Local JSON dump; takes precedence over the remote dataset when set.
    #[serde(default)]
    pub dataset_path: Option<String>,
    pub dataset_page_size: usize,
    #[serde(default)]
    pub dataset_max_rows: Option<usize>,
}

/// Ranking knobs threaded explicitly into the recommendation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendSettings {
    pub model: String,
    /// Upper bound on candidates shown to the model.
    pub top_k_candidates: usize,
    /// Result count used when the preference does not request one.
    pub max_results: usize,
    pub timeout: Duration,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            top_k_candidates: 12,
            max_results: 5,
            timeout: Duration::from_secs(20),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080_i64)?
            .set_default("xai_base_url", DEFAULT_XAI_BASE_URL)?
            .set_default("llm_model", DEFAULT_MODEL)?
            .set_default("llm_timeout_secs", 20.0_f64)?
            .set_default("llm_temperature", 0.2_f64)?
            .set_default("top_k_candidates", 12_i64)?
            .set_default("max_results", 5_i64)?
            .set_default("dataset_id", DEFAULT_DATASET_ID)?
            .set_default("dataset_split", "train")?
            .set_default("dataset_page_size", 100_i64)?
            .add_source(config::Environment::with_prefix("APP").try_parsing(true))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k_candidates == 0 {
            return Err(ApiError::Config("top_k_candidates must be >= 1".into()));
        }
        if self.max_results == 0 {
            return Err(ApiError::Config("max_results must be >= 1".into()));
        }
        if !(self.llm_timeout_secs.is_finite() && self.llm_timeout_secs > 0.0) {
            return Err(ApiError::Config("llm_timeout_secs must be positive".into()));
        }
        if self.dataset_page_size == 0 {
            return Err(ApiError::Config("dataset_page_size must be >= 1".into()));
        }
        Ok(())
    }

    pub fn recommend_settings(&self) -> RecommendSettings {
        RecommendSettings {
            model: self.llm_model.clone(),
            top_k_candidates: self.top_k_candidates,
            max_results: self.max_results,
            timeout: Duration::from_secs_f64(self.llm_timeout_secs),
        }
    }

    /// API key with blank values treated as unset.
    pub fn api_key(&self) -> Option<&str> {
        self.xai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            host: "127.0.0.1".into(),
            port: 8080,
            xai_api_key: Some("  ".into()),
            xai_base_url: DEFAULT_XAI_BASE_URL.into(),
            llm_model: "test-model".into(),
            llm_timeout_secs: 2.5,
            llm_temperature: 0.2,
            top_k_candidates: 10,
            max_results: 3,
            dataset_id: DEFAULT_DATASET_ID.into(),
            dataset_split: "train".into(),
            dataset_path: None,
            dataset_page_size: 100,
            dataset_max_rows: None,
        }
    }

    #[test]
    fn test_recommend_settings_from_config() {
        let settings = sample().recommend_settings();
        assert_eq!(settings.model, "test-model");
        assert_eq!(settings.top_k_candidates, 10);
        assert_eq!(settings.max_results, 3);
        assert_eq!(settings.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        assert_eq!(sample().api_key(), None);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = sample();
        config.top_k_candidates = 0;
        assert!(config.validate().is_err());

        let mut config = sample();
        config.llm_timeout_secs = 0.0;
        assert!(config.validate().is_err());

        assert!(sample().validate().is_ok());
    }
}

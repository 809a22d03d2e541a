use serde::Deserialize;
use std::time::Duration;

use crate::services::scoring::ScoringWeights;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Normalized catalog JSON produced by the ETL step
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// PostgreSQL URL. When set, the catalog is read from the `movies` table instead of `catalog_path`
    #[serde(default)]
    pub database_url: Option<String>,

    /// Precomputed tag → vector table. A missing file runs without semantic re-scoring
    #[serde(default = "default_tag_vectors_path")]
    pub tag_vectors_path: String,

    /// Redis URL for the query embedding cache. Caching is disabled when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Base URL of the embedding service
    #[serde(default = "default_embedding_api_url")]
    pub embedding_api_url: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Upper bound on a single vibe embedding call
    #[serde(default = "default_embedding_timeout_ms")]
    pub embedding_timeout_ms: u64,

    #[serde(default = "default_embedding_cache_ttl_secs")]
    pub embedding_cache_ttl_secs: u64,

    #[serde(default = "default_decade_match_weight")]
    pub decade_match_weight: f64,

    #[serde(default = "default_rating_multiplier")]
    pub rating_multiplier: f64,

    #[serde(default = "default_popularity_log_weight")]
    pub popularity_log_weight: f64,

    #[serde(default = "default_semantic_match_weight")]
    pub semantic_match_weight: f64,

    /// Number of stage-1 survivors passed to semantic re-scoring
    #[serde(default = "default_candidate_budget")]
    pub candidate_budget: usize,

    /// Result count used when a recommendation request omits `limit`
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Largest `limit` a recommendation request may ask for
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Allowed CORS origin. Any origin is allowed when unset
    #[serde(default)]
    pub frontend_url: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_catalog_path() -> String {
    "data/moviesFull.json".to_string()
}

fn default_tag_vectors_path() -> String {
    "data/tagEmbeddings.json".to_string()
}

fn default_embedding_api_url() -> String {
    "http://127.0.0.1:8085".to_string()
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_embedding_timeout_ms() -> u64 {
    2_000
}

fn default_embedding_cache_ttl_secs() -> u64 {
    86_400 // 1 day
}

fn default_decade_match_weight() -> f64 {
    ScoringWeights::default().decade_match_weight
}

fn default_rating_multiplier() -> f64 {
    ScoringWeights::default().rating_multiplier
}

fn default_popularity_log_weight() -> f64 {
    ScoringWeights::default().popularity_log_weight
}

fn default_semantic_match_weight() -> f64 {
    ScoringWeights::default().semantic_match_weight
}

fn default_candidate_budget() -> usize {
    ScoringWeights::default().candidate_budget
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    100
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.candidate_budget == 0 {
            anyhow::bail!("CANDIDATE_BUDGET must be at least 1");
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            anyhow::bail!(
                "DEFAULT_LIMIT must be between 1 and MAX_LIMIT ({})",
                self.max_limit
            );
        }
        Ok(())
    }

    /// Scoring weights assembled from the individual weight variables
    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights {
            decade_match_weight: self.decade_match_weight,
            rating_multiplier: self.rating_multiplier,
            popularity_log_weight: self.popularity_log_weight,
            semantic_match_weight: self.semantic_match_weight,
            candidate_budget: self.candidate_budget,
        }
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(vars: Vec<(&str, &str)>) -> Config {
        envy::from_iter::<_, Config>(
            vars.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = config_from(vec![]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.catalog_path, "data/moviesFull.json");
        assert!(config.database_url.is_none());
        assert!(config.redis_url.is_none());
        assert_eq!(config.default_limit, 10);

        let weights = config.scoring_weights();
        assert_eq!(weights.decade_match_weight, 30.0);
        assert_eq!(weights.rating_multiplier, 5.0);
        assert_eq!(weights.popularity_log_weight, 3.0);
        assert_eq!(weights.semantic_match_weight, 100.0);
        assert_eq!(weights.candidate_budget, 50);
    }

    #[test]
    fn test_weight_overrides() {
        let config = config_from(vec![
            ("DECADE_MATCH_WEIGHT", "12.5"),
            ("CANDIDATE_BUDGET", "20"),
            ("EMBEDDING_TIMEOUT_MS", "250"),
        ]);
        assert_eq!(config.scoring_weights().decade_match_weight, 12.5);
        assert_eq!(config.scoring_weights().candidate_budget, 20);
        assert_eq!(config.embedding_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let config = config_from(vec![("CANDIDATE_BUDGET", "0")]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_default_limit_above_max() {
        let config = config_from(vec![("DEFAULT_LIMIT", "50"), ("MAX_LIMIT", "20")]);
        assert!(config.validate().is_err());
    }
}

use serde::Serialize;

use super::Movie;

/// A movie in a recommendation response, with its score when ranking was applied
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedMovie {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// How the result list was produced
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    /// Scored by the two-stage pipeline
    Ranked,
    /// Empty query: uniform random sample of the catalog
    Discovery,
}

/// Outcome of the semantic stage for one request
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SemanticStatus {
    NotRequested,
    Applied,
    /// A vibe was given but no query vector could be produced in time
    Unavailable,
}

/// Ranked result slice plus the counts around the candidate truncation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub mode: RankingMode,
    pub semantic: SemanticStatus,
    /// Candidates that passed filtering, before the candidate budget was applied
    pub total_matched: usize,
    /// Stage-1 survivors after the candidate budget was applied
    pub total_candidates: usize,
    pub results: Vec<RankedMovie>,
}

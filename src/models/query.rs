use serde::Deserialize;
use std::collections::BTreeSet;

use crate::error::{AppError, AppResult};

/// Latest decade a request may target
const MAX_DECADE: f64 = 9990.0;

/// A JSON value that should hold a number but may arrive as a string
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl LooseNumber {
    /// Numeric value, or `None` when the input cannot be coerced
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            LooseNumber::Number(n) => *n,
            LooseNumber::Text(s) => {
                let trimmed = s.trim();
                let trimmed = trimmed
                    .strip_suffix("'s")
                    .or_else(|| trimmed.strip_suffix('s'))
                    .unwrap_or(trimmed);
                trimmed.parse::<f64>().ok()?
            }
            LooseNumber::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

/// Raw recommendation request body as sent by clients
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub decade: Option<LooseNumber>,
    #[serde(default)]
    pub min_rating: Option<LooseNumber>,
    #[serde(default)]
    pub vibe: Option<String>,
    #[serde(default)]
    pub limit: Option<LooseNumber>,
}

/// Bounds applied while validating a request
#[derive(Debug, Clone, Copy)]
pub struct QueryLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// Validated, immutable recommendation query
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationQuery {
    /// Lowercased mood label, not yet resolved against the mood table
    pub mood: Option<String>,
    pub genres: BTreeSet<String>,
    pub decade: Option<i32>,
    pub min_rating: Option<f64>,
    pub vibe: Option<String>,
    pub limit: usize,
}

impl RecommendationQuery {
    /// Query with no preferences at all
    pub fn with_limit(limit: usize) -> Self {
        Self {
            mood: None,
            genres: BTreeSet::new(),
            decade: None,
            min_rating: None,
            vibe: None,
            limit,
        }
    }
}

impl RecommendationRequest {
    /// Validates the request. Fails fast on values that are present but out of range;
    /// values that cannot be read as numbers are treated as absent.
    pub fn into_query(self, limits: QueryLimits) -> AppResult<RecommendationQuery> {
        let limit = parse_limit(self.limit.as_ref(), limits)?;
        let decade = parse_decade(self.decade.as_ref())?;
        let min_rating = parse_min_rating(self.min_rating.as_ref())?;

        let genres = self
            .genres
            .unwrap_or_default()
            .into_iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();

        Ok(RecommendationQuery {
            mood: non_blank(self.mood).map(|m| m.to_lowercase()),
            genres,
            decade,
            min_rating,
            vibe: non_blank(self.vibe),
            limit,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_limit(raw: Option<&LooseNumber>, limits: QueryLimits) -> AppResult<usize> {
    let Some(value) = raw.and_then(LooseNumber::as_f64) else {
        return Ok(limits.default_limit);
    };

    if value.fract() != 0.0 {
        return Err(AppError::InvalidRequest(format!(
            "limit must be a whole number, got {}",
            value
        )));
    }
    if value <= 0.0 {
        return Err(AppError::InvalidRequest(format!(
            "limit must be positive, got {}",
            value
        )));
    }
    if value > limits.max_limit as f64 {
        return Err(AppError::InvalidRequest(format!(
            "limit must not exceed {}, got {}",
            limits.max_limit, value
        )));
    }

    Ok(value as usize)
}

fn parse_decade(raw: Option<&LooseNumber>) -> AppResult<Option<i32>> {
    let Some(value) = raw.and_then(LooseNumber::as_f64) else {
        if let Some(raw) = raw {
            tracing::debug!(decade = ?raw, "Ignoring non-numeric decade");
        }
        return Ok(None);
    };

    if value.fract() != 0.0 || !(0.0..=MAX_DECADE).contains(&value) {
        return Err(AppError::InvalidRequest(format!(
            "decade must be a year between 0 and {}, got {}",
            MAX_DECADE, value
        )));
    }

    let decade = value as i32;
    if decade % 10 != 0 {
        return Err(AppError::InvalidRequest(format!(
            "decade must be a multiple of 10 (e.g. 1990), got {}",
            decade
        )));
    }

    Ok(Some(decade))
}

fn parse_min_rating(raw: Option<&LooseNumber>) -> AppResult<Option<f64>> {
    let Some(value) = raw.and_then(LooseNumber::as_f64) else {
        return Ok(None);
    };

    if !(0.0..=10.0).contains(&value) {
        return Err(AppError::InvalidRequest(format!(
            "minRating must be between 0 and 10, got {}",
            value
        )));
    }

    Ok(Some(value))
}

//! Two-stage candidate scoring
//!
//! Stage 1 gives every filtered candidate an additive structured score (decade alignment,
//! rating quality, popularity), sorts, and keeps the top `candidate_budget`. Stage 2 adds a
//! semantic term to the survivors: the best cosine similarity between the query vibe and
//! any of the movie's tags. The final pass re-sorts and cuts to the requested limit.

use std::cmp::Ordering;

use serde::Serialize;

use super::{embedding::TagVectors, vector_math::cosine_similarity};
use crate::models::{Movie, RankedMovie};

/// Tunable weights of the scoring pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringWeights {
    /// Awarded for an exact decade match, halved for a one-decade miss
    pub decade_match_weight: f64,
    pub rating_multiplier: f64,
    /// Multiplies `ln(numRatings)`
    pub popularity_log_weight: f64,
    /// Multiplies the best tag similarity
    pub semantic_match_weight: f64,
    /// Stage-1 survivors kept for semantic re-scoring
    pub candidate_budget: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            decade_match_weight: 30.0,
            rating_multiplier: 5.0,
            popularity_log_weight: 3.0,
            semantic_match_weight: 100.0,
            candidate_budget: 50,
        }
    }
}

/// A movie being ranked for one request
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub movie: &'a Movie,
    /// Position among the filtered candidates, which follow catalog order
    pub position: usize,
    pub score: f64,
}

impl ScoredCandidate<'_> {
    pub fn to_ranked(&self) -> RankedMovie {
        RankedMovie {
            movie: self.movie.clone(),
            score: Some(self.score),
        }
    }
}

/// Stage-1 result
#[derive(Debug)]
pub struct StructuredStage<'a> {
    /// Best candidates by structured score, at most `candidate_budget` of them
    pub survivors: Vec<ScoredCandidate<'a>>,
    /// Number of candidates scored before truncation
    pub matched: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    weights: ScoringWeights,
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Decade alignment term. Zero when either side is unknown.
    pub fn decade_score(&self, movie: &Movie, target_decade: Option<i32>) -> f64 {
        let (Some(target), Some(decade)) = (target_decade, movie.decade()) else {
            return 0.0;
        };

        match decade.abs_diff(target) {
            0 => self.weights.decade_match_weight,
            10 => self.weights.decade_match_weight / 2.0,
            _ => 0.0,
        }
    }

    /// Structured score: decade alignment + rating quality + dampened popularity
    pub fn base_score(&self, movie: &Movie, target_decade: Option<i32>) -> f64 {
        let rating = movie
            .avg_rating
            .map_or(0.0, |r| r * self.weights.rating_multiplier);

        let popularity = if movie.num_ratings > 0 {
            f64::from(movie.num_ratings).ln() * self.weights.popularity_log_weight
        } else {
            0.0
        };

        self.decade_score(movie, target_decade) + rating + popularity
    }

    /// Scores every candidate and keeps the strongest `candidate_budget`.
    /// `candidates` must be in catalog order.
    pub fn structured_stage<'a>(
        &self,
        candidates: &[&'a Movie],
        target_decade: Option<i32>,
    ) -> StructuredStage<'a> {
        let mut survivors: Vec<ScoredCandidate<'a>> = candidates
            .iter()
            .copied()
            .enumerate()
            .map(|(position, movie)| ScoredCandidate {
                movie,
                position,
                score: self.base_score(movie, target_decade),
            })
            .collect();

        rank(&mut survivors);
        survivors.truncate(self.weights.candidate_budget);

        tracing::debug!(
            matched = candidates.len(),
            survivors = survivors.len(),
            "Structured scoring complete"
        );

        StructuredStage {
            survivors,
            matched: candidates.len(),
        }
    }

    /// Adds the semantic term to each survivor.
    ///
    /// The term is the highest similarity between `query` and the vectors of the movie's
    /// tags, floored at zero. Tags missing from the table are skipped.
    pub fn semantic_stage(
        &self,
        survivors: &mut [ScoredCandidate<'_>],
        query: &[f32],
        tag_vectors: &TagVectors,
    ) {
        for candidate in survivors.iter_mut() {
            let best = candidate
                .movie
                .tags
                .iter()
                .filter_map(|tag| tag_vectors.get(tag))
                .map(|vector| cosine_similarity(query, vector))
                .fold(0.0_f64, f64::max);

            candidate.score += best * self.weights.semantic_match_weight;
        }
    }

    /// Final ordering, cut to `limit`
    pub fn finalize<'a>(
        &self,
        mut survivors: Vec<ScoredCandidate<'a>>,
        limit: usize,
    ) -> Vec<ScoredCandidate<'a>> {
        rank(&mut survivors);
        survivors.truncate(limit);
        survivors
    }
}

/// Descending by score; equal scores keep catalog order
fn rank(candidates: &mut [ScoredCandidate<'_>]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.position.cmp(&b.position))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: i64, year: Option<i32>, avg_rating: Option<f64>, num_ratings: u32) -> Movie {
        Movie {
            movie_id: id,
            title: format!("Movie {}", id),
            year,
            genres: vec!["Drama".to_string()],
            tags: vec![],
            avg_rating,
            num_ratings,
            imdb_id: None,
            tmdb_id: None,
        }
    }

    fn tagged(id: i64, tags: &[&str]) -> Movie {
        let mut m = movie(id, None, None, 0);
        m.tags = tags.iter().map(|t| t.to_string()).collect();
        m
    }

    fn table(entries: &[(&str, Vec<f32>)]) -> TagVectors {
        TagVectors::from_entries(
            entries
                .iter()
                .map(|(tag, vector)| (tag.to_string(), vector.clone())),
        )
        .unwrap()
    }

    #[test]
    fn test_decade_alignment() {
        let engine = ScoringEngine::default();
        let m = movie(1, Some(1999), None, 0);

        assert_eq!(engine.decade_score(&m, Some(1990)), 30.0);
        assert_eq!(engine.decade_score(&m, Some(1980)), 15.0);
        assert_eq!(engine.decade_score(&m, Some(2000)), 15.0);
        assert_eq!(engine.decade_score(&m, Some(1950)), 0.0);
        assert_eq!(engine.decade_score(&m, None), 0.0);
        assert_eq!(engine.decade_score(&movie(2, None, None, 0), Some(1990)), 0.0);
    }

    #[test]
    fn test_decade_alignment_with_extreme_years() {
        let engine = ScoringEngine::default();

        let ancient = movie(1, Some(-5), None, 0);
        assert_eq!(engine.decade_score(&ancient, Some(2_147_483_640)), 0.0);
        assert_eq!(engine.decade_score(&ancient, Some(0)), 15.0);

        let far_future = movie(2, Some(i32::MAX), None, 0);
        assert_eq!(engine.decade_score(&far_future, Some(i32::MIN)), 0.0);
        assert_eq!(engine.decade_score(&movie(3, Some(i32::MIN), None, 0), Some(1990)), 0.0);
    }

    #[test]
    fn test_base_score_components() {
        let engine = ScoringEngine::default();

        let unrated = movie(1, Some(2010), None, 0);
        assert_eq!(engine.base_score(&unrated, None), 0.0);

        let rated = movie(2, Some(1994), Some(8.5), 1000);
        let expected = 30.0 + 8.5 * 5.0 + (1000f64).ln() * 3.0;
        assert!((engine.base_score(&rated, Some(1990)) - expected).abs() < 1e-9);

        // ln(1) == 0: a single rating adds nothing for popularity
        let single = movie(3, None, Some(4.0), 1);
        assert!((engine.base_score(&single, None) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_rating_and_popularity_outrank_near_decade() {
        let engine = ScoringEngine::default();
        let first = movie(1, Some(1994), Some(8.5), 1000);
        let second = movie(2, Some(1999), Some(6.0), 10);

        let stage = engine.structured_stage(&[&first, &second], Some(1990));
        let ids: Vec<i64> = stage.survivors.iter().map(|c| c.movie.movie_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(stage.matched, 2);
    }

    #[test]
    fn test_structured_stage_respects_budget() {
        let engine = ScoringEngine::new(ScoringWeights {
            candidate_budget: 3,
            ..ScoringWeights::default()
        });
        let movies: Vec<Movie> = (1..=10)
            .map(|i| movie(i, Some(2000), Some(i as f64 / 2.0), i as u32))
            .collect();
        let candidates: Vec<&Movie> = movies.iter().collect();

        let stage = engine.structured_stage(&candidates, None);
        assert_eq!(stage.matched, 10);
        assert_eq!(stage.survivors.len(), 3);

        let ids: Vec<i64> = stage.survivors.iter().map(|c| c.movie.movie_id).collect();
        assert_eq!(ids, vec![10, 9, 8]);
        assert!(stage
            .survivors
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_structured_stage_of_nothing() {
        let stage = ScoringEngine::default().structured_stage(&[], Some(1990));
        assert!(stage.survivors.is_empty());
        assert_eq!(stage.matched, 0);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let engine = ScoringEngine::default();
        let movies: Vec<Movie> = (1..=5).map(|i| movie(i, None, None, 0)).collect();
        let candidates: Vec<&Movie> = movies.iter().collect();

        let stage = engine.structured_stage(&candidates, None);
        let finals = engine.finalize(stage.survivors, 4);
        let ids: Vec<i64> = finals.iter().map(|c| c.movie.movie_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_semantic_stage_uses_best_tag() {
        let engine = ScoringEngine::default();
        let vectors = table(&[
            ("prison", vec![1.0, 0.0]),
            ("escape", vec![0.6, 0.8]),
            ("office", vec![0.0, 1.0]),
        ]);
        let a = tagged(1, &["escape", "prison", "unknown tag"]);
        let b = tagged(2, &["office"]);
        let c = tagged(3, &[]);

        let mut survivors = engine.structured_stage(&[&a, &b, &c], None).survivors;
        engine.semantic_stage(&mut survivors, &[1.0, 0.0], &vectors);

        let scores: Vec<(i64, f64)> = survivors
            .iter()
            .map(|s| (s.movie.movie_id, s.score))
            .collect();
        assert!((scores[0].1 - 100.0).abs() < 1e-6);
        assert!(scores[1].1.abs() < 1e-6);
        assert_eq!(scores[2].1, 0.0);

        let finals = engine.finalize(survivors, 1);
        assert_eq!(finals[0].movie.movie_id, 1);
    }

    #[test]
    fn test_negative_similarity_is_floored() {
        let engine = ScoringEngine::default();
        let vectors = table(&[("bleak", vec![-1.0, 0.0])]);
        let m = tagged(1, &["bleak"]);

        let mut survivors = engine.structured_stage(&[&m], None).survivors;
        engine.semantic_stage(&mut survivors, &[1.0, 0.0], &vectors);
        assert_eq!(survivors[0].score, 0.0);
    }

    #[test]
    fn test_empty_tag_table_keeps_structured_ranking() {
        let engine = ScoringEngine::default();
        let movies = vec![
            movie(1, Some(1985), Some(3.0), 20),
            movie(2, Some(1994), Some(8.5), 1000),
            movie(3, Some(1999), Some(6.0), 10),
        ];
        let candidates: Vec<&Movie> = movies.iter().collect();

        let structured = engine.structured_stage(&candidates, Some(1990)).survivors;
        let expected = engine.finalize(structured.clone(), 2);

        let mut rescored = structured;
        engine.semantic_stage(&mut rescored, &[0.3, 0.7], &TagVectors::empty());
        let actual = engine.finalize(rescored, 2);

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_finalize_truncates_to_limit() {
        let engine = ScoringEngine::default();
        let movies: Vec<Movie> = (1..=4).map(|i| movie(i, None, Some(1.0), 1)).collect();
        let candidates: Vec<&Movie> = movies.iter().collect();

        let survivors = engine.structured_stage(&candidates, None).survivors;
        assert_eq!(engine.finalize(survivors.clone(), 10).len(), 4);
        assert_eq!(engine.finalize(survivors, 2).len(), 2);
    }
}

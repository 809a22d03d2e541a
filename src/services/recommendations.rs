use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;

use super::{
    catalog::CatalogIndex,
    embedding::{EmbeddingGateway, TagVectors},
    moods::MoodTable,
    scoring::{ScoredCandidate, ScoringEngine},
};
use crate::models::{
    Movie, RankedMovie, RankingMode, RecommendationQuery, Recommendations, SemanticStatus,
};

const DEFAULT_EMBEDDING_TIMEOUT: Duration = Duration::from_secs(2);

/// Answers recommendation queries against the shared catalog
///
/// Resolves the mood into genres, embeds the vibe (bounded by a timeout), filters the
/// catalog and runs the scoring pipeline. A query without any preference skips scoring and
/// returns a random sample of the catalog instead.
pub struct RecommendationService {
    catalog: Arc<CatalogIndex>,
    tag_vectors: Arc<TagVectors>,
    embeddings: Arc<EmbeddingGateway>,
    engine: ScoringEngine,
    moods: MoodTable,
    embedding_timeout: Duration,
}

impl RecommendationService {
    pub fn new(
        catalog: Arc<CatalogIndex>,
        tag_vectors: Arc<TagVectors>,
        embeddings: Arc<EmbeddingGateway>,
        engine: ScoringEngine,
    ) -> Self {
        Self {
            catalog,
            tag_vectors,
            embeddings,
            engine,
            moods: MoodTable::default(),
            embedding_timeout: DEFAULT_EMBEDDING_TIMEOUT,
        }
    }

    pub fn with_moods(mut self, moods: MoodTable) -> Self {
        self.moods = moods;
        self
    }

    pub fn with_embedding_timeout(mut self, timeout: Duration) -> Self {
        self.embedding_timeout = timeout;
        self
    }

    pub fn moods(&self) -> &MoodTable {
        &self.moods
    }

    pub fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    pub fn tag_vectors(&self) -> &TagVectors {
        &self.tag_vectors
    }

    pub fn embeddings(&self) -> &EmbeddingGateway {
        &self.embeddings
    }

    /// Ranks the catalog for `query`. Never fails: a missing vibe vector only drops the
    /// semantic stage.
    pub async fn recommend(&self, query: &RecommendationQuery) -> Recommendations {
        let mut categories = query.genres.clone();
        if let Some(genres) = query.mood.as_deref().and_then(|m| self.moods.resolve(m)) {
            categories.extend(genres.iter().cloned());
        }

        let is_empty_query = categories.is_empty()
            && query.decade.is_none()
            && query.min_rating.is_none()
            && query.vibe.is_none();

        if is_empty_query {
            let results = self.discover(query.limit);
            tracing::info!(returned = results.len(), "Serving discovery sample");
            return Recommendations {
                mode: RankingMode::Discovery,
                semantic: SemanticStatus::NotRequested,
                total_matched: self.catalog.len(),
                total_candidates: self.catalog.len(),
                results,
            };
        }

        let (query_vector, semantic) = match query.vibe.as_deref() {
            None => (None, SemanticStatus::NotRequested),
            Some(vibe) => match self.vibe_vector(vibe).await {
                Some(vector) if self.fits_tag_table(&vector) => {
                    (Some(vector), SemanticStatus::Applied)
                }
                _ => (None, SemanticStatus::Unavailable),
            },
        };

        let candidates: Vec<&Movie> = self
            .catalog
            .filter_by_categories(&categories)
            .into_iter()
            .filter(|movie| meets_min_rating(movie, query.min_rating))
            .collect();

        let stage = self.engine.structured_stage(&candidates, query.decade);
        let total_candidates = stage.survivors.len();
        let mut survivors = stage.survivors;

        if let Some(vector) = &query_vector {
            self.engine
                .semantic_stage(&mut survivors, vector, &self.tag_vectors);
        }

        let results: Vec<RankedMovie> = self
            .engine
            .finalize(survivors, query.limit)
            .iter()
            .map(ScoredCandidate::to_ranked)
            .collect();

        tracing::info!(
            categories = categories.len(),
            decade = ?query.decade,
            matched = stage.matched,
            candidates = total_candidates,
            semantic = ?semantic,
            returned = results.len(),
            "Ranked recommendations"
        );

        Recommendations {
            mode: RankingMode::Ranked,
            semantic,
            total_matched: stage.matched,
            total_candidates,
            results,
        }
    }

    /// Uniform random sample without replacement, fresh randomness per call
    fn discover(&self, limit: usize) -> Vec<RankedMovie> {
        let mut rng = rand::thread_rng();
        self.catalog
            .all()
            .choose_multiple(&mut rng, limit)
            .map(|movie| RankedMovie {
                movie: movie.clone(),
                score: None,
            })
            .collect()
    }

    /// Single bounded attempt at embedding the vibe. `None` means degrade to structured only.
    async fn vibe_vector(&self, vibe: &str) -> Option<Vec<f32>> {
        match tokio::time::timeout(self.embedding_timeout, self.embeddings.embed(vibe)).await {
            Ok(Ok(vector)) => vector,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Vibe embedding unavailable, using structured score only");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.embedding_timeout.as_millis() as u64,
                    "Vibe embedding timed out, using structured score only"
                );
                None
            }
        }
    }

    /// A vibe vector of another dimension than the tag table scores zero against every tag
    fn fits_tag_table(&self, vector: &[f32]) -> bool {
        match self.tag_vectors.dimension() {
            Some(dimension) if dimension != vector.len() => {
                tracing::warn!(
                    vibe_dimension = vector.len(),
                    tag_dimension = dimension,
                    "Vibe embedding does not match the tag vector table, using structured score only"
                );
                false
            }
            _ => true,
        }
    }
}

/// Unrated movies only pass a threshold of zero
fn meets_min_rating(movie: &Movie, min_rating: Option<f64>) -> bool {
    match (min_rating, movie.avg_rating) {
        (None, _) => true,
        (Some(min), Some(rating)) => rating >= min,
        (Some(min), None) => min <= 0.0,
    }
}

pub mod browse;
pub mod catalog;
pub mod embedding;
pub mod moods;
pub mod recommendations;
pub mod scoring;
pub mod vector_math;

pub use catalog::{load_catalog, CatalogIndex, CatalogSource};
pub use embedding::{BackendHandle, EmbeddingGateway, TagVectors};
pub use moods::MoodTable;
pub use recommendations::RecommendationService;
pub use scoring::{ScoringEngine, ScoringWeights};

mod movie;
mod page;
mod query;
mod recommendation;

pub use movie::{normalize_tag, Movie};
pub use page::{GenrePage, MoviePage, PageParams, Pagination, SearchPage};
pub use query::{LooseNumber, QueryLimits, RecommendationQuery, RecommendationRequest};
pub use recommendation::{RankedMovie, RankingMode, Recommendations, SemanticStatus};

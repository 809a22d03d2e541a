use serde::{Deserialize, Serialize};

/// A catalog entry as produced by the ETL step (`moviesFull.json` / `movies` table)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub movie_id: i64,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// 0–10 scale, two decimals. `None` iff `num_ratings == 0`
    #[serde(default)]
    pub avg_rating: Option<f64>,
    #[serde(default)]
    pub num_ratings: u32,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub tmdb_id: Option<i64>,
}

impl Movie {
    /// Decade the release year falls in, e.g. 1999 → 1990
    pub fn decade(&self) -> Option<i32> {
        self.year
            .and_then(|year| year.div_euclid(10).checked_mul(10))
    }

    pub fn has_genre_ignore_case(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }

    /// Checks the rating invariant: an average exists exactly when ratings exist
    pub fn rating_is_consistent(&self) -> bool {
        self.avg_rating.is_some() == (self.num_ratings > 0)
    }
}

/// Normalizes a free-text tag the way the tag vector table keys are built.
/// Returns `None` for tags that are too short to carry meaning.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let normalized = tag.trim().to_lowercase();
    (normalized.chars().count() > 1).then_some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(year: Option<i32>) -> Movie {
        Movie {
            movie_id: 1,
            title: "Heat (1995)".to_string(),
            year,
            genres: vec!["Action".to_string(), "Crime".to_string()],
            tags: vec![],
            avg_rating: None,
            num_ratings: 0,
            imdb_id: None,
            tmdb_id: None,
        }
    }

    #[test]
    fn test_decade_floors_year() {
        assert_eq!(movie(Some(1999)).decade(), Some(1990));
        assert_eq!(movie(Some(2000)).decade(), Some(2000));
        assert_eq!(movie(None).decade(), None);
    }

    #[test]
    fn test_decade_of_extreme_years() {
        assert_eq!(movie(Some(-5)).decade(), Some(-10));
        assert_eq!(movie(Some(i32::MAX)).decade(), Some(2_147_483_640));
        assert_eq!(movie(Some(i32::MIN)).decade(), None);
    }

    #[test]
    fn test_deserialize_etl_record() {
        let json = r#"{
            "movieId": 318,
            "title": "Shawshank Redemption, The (1994)",
            "year": 1994,
            "genres": ["Crime", "Drama"],
            "tags": ["prison", "morgan freeman"],
            "avgRating": 4.43,
            "numRatings": 317,
            "imdbId": "0111161",
            "tmdbId": 278
        }"#;

        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.movie_id, 318);
        assert_eq!(movie.year, Some(1994));
        assert_eq!(movie.avg_rating, Some(4.43));
        assert_eq!(movie.num_ratings, 317);
        assert_eq!(movie.tmdb_id, Some(278));
        assert!(movie.rating_is_consistent());
    }

    #[test]
    fn test_deserialize_sparse_record() {
        let json = r#"{"movieId": 2, "title": "Untitled", "year": null, "avgRating": null}"#;
        let movie: Movie = serde_json::from_str(json).unwrap();
        assert!(movie.genres.is_empty());
        assert_eq!(movie.num_ratings, 0);
        assert!(movie.rating_is_consistent());
    }

    #[test]
    fn test_rating_invariant_violation() {
        let mut m = movie(Some(2001));
        m.num_ratings = 4;
        assert!(!m.rating_is_consistent());
    }

    #[test]
    fn test_genre_matching() {
        let m = movie(Some(1995));
        assert!(m.has_genre_ignore_case("crime"));
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("  Dark Comedy "), Some("dark comedy".to_string()));
        assert_eq!(normalize_tag("a"), None);
        assert_eq!(normalize_tag("   "), None);
    }
}

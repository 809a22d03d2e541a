use serde::Serialize;
use std::collections::BTreeMap;

/// Mood label → genres it implies
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct MoodTable {
    moods: BTreeMap<String, Vec<String>>,
}

impl MoodTable {
    /// Builds a table from explicit entries. Mood labels are matched case-insensitively.
    pub fn new<I, M, G>(entries: I) -> Self
    where
        I: IntoIterator<Item = (M, Vec<G>)>,
        M: Into<String>,
        G: Into<String>,
    {
        let moods = entries
            .into_iter()
            .map(|(mood, genres)| {
                (
                    mood.into().trim().to_lowercase(),
                    genres.into_iter().map(Into::into).collect(),
                )
            })
            .collect();
        Self { moods }
    }

    /// Genres implied by `mood`, or `None` for an unknown mood
    pub fn resolve(&self, mood: &str) -> Option<&[String]> {
        self.moods
            .get(&mood.trim().to_lowercase())
            .map(Vec::as_slice)
    }

    pub fn entries(&self) -> &BTreeMap<String, Vec<String>> {
        &self.moods
    }
}

impl Default for MoodTable {
    fn default() -> Self {
        Self::new([
            ("happy", vec!["Comedy", "Adventure", "Animation"]),
            ("sad", vec!["Drama", "Romance"]),
            ("excited", vec!["Action", "Thriller", "Sci-Fi"]),
            ("chill", vec!["Documentary", "Fantasy"]),
            ("scared", vec!["Horror", "Thriller", "Mystery"]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_mood() {
        let table = MoodTable::default();
        assert_eq!(
            table.resolve("happy").unwrap(),
            &["Comedy", "Adventure", "Animation"]
        );
        assert_eq!(table.resolve(" Sad ").unwrap(), &["Drama", "Romance"]);
    }

    #[test]
    fn test_unknown_mood_is_none() {
        assert!(MoodTable::default().resolve("furious").is_none());
        assert!(MoodTable::default().resolve("").is_none());
    }

    #[test]
    fn test_custom_table() {
        let table = MoodTable::new([("Nostalgic", vec!["Western".to_string()])]);
        assert_eq!(table.resolve("nostalgic").unwrap(), &["Western"]);
        assert_eq!(table.entries().len(), 1);
    }

    #[test]
    fn test_serializes_as_map() {
        let json = serde_json::to_value(MoodTable::default()).unwrap();
        assert_eq!(json["chill"][1], "Fantasy");
        assert_eq!(json.as_object().unwrap().len(), 5);
    }
}

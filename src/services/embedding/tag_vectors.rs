use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::{
    error::{AppError, AppResult},
    models::normalize_tag,
};

/// Precomputed tag → embedding table, immutable once loaded
#[derive(Debug, Clone, Default)]
pub struct TagVectors {
    vectors: HashMap<String, Vec<f32>>,
    dimension: Option<usize>,
}

impl TagVectors {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the table from raw entries.
    ///
    /// Keys are trimmed and lowercased; keys of one character or less are dropped.
    /// Every vector must be non-empty and share one dimensionality.
    pub fn from_entries<I>(entries: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        let mut vectors = HashMap::new();
        let mut dimension: Option<usize> = None;
        let mut skipped = 0usize;

        for (raw_tag, vector) in entries {
            let Some(tag) = normalize_tag(&raw_tag) else {
                skipped += 1;
                continue;
            };

            if vector.is_empty() {
                return Err(AppError::Configuration(format!(
                    "tag vector for '{}' is empty",
                    tag
                )));
            }

            match dimension {
                None => dimension = Some(vector.len()),
                Some(expected) if expected != vector.len() => {
                    return Err(AppError::Configuration(format!(
                        "tag vector for '{}' has dimension {}, expected {}",
                        tag,
                        vector.len(),
                        expected
                    )));
                }
                Some(_) => {}
            }

            vectors.insert(tag, vector);
        }

        if skipped > 0 {
            tracing::warn!(skipped, "Dropped tag vectors with unusable keys");
        }

        Ok(Self { vectors, dimension })
    }

    /// Vector for a catalog tag, if one was precomputed
    pub fn get(&self, tag: &str) -> Option<&[f32]> {
        if let Some(vector) = self.vectors.get(tag) {
            return Some(vector.as_slice());
        }
        normalize_tag(tag)
            .and_then(|normalized| self.vectors.get(&normalized))
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

/// Source of the precomputed tag vector table
#[async_trait::async_trait]
pub trait TagVectorSource: Send + Sync {
    /// Raw entries, or `None` when the source does not exist
    async fn load(&self) -> AppResult<Option<HashMap<String, Vec<f32>>>>;

    /// Human-readable location for logging
    fn describe(&self) -> String;
}

/// Tag vectors stored as a single JSON object: `{ "tag": [f32, ...], ... }`
#[derive(Debug, Clone)]
pub struct JsonTagVectorFile {
    path: PathBuf,
}

impl JsonTagVectorFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Writes a table in the format `load` reads. Keys are written in sorted order
    pub async fn save(&self, vectors: &BTreeMap<String, Vec<f32>>) -> AppResult<()> {
        let json = serde_json::to_string(vectors)
            .map_err(|e| AppError::Internal(format!("Tag vector serialization error: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Cannot create {}: {}", parent.display(), e)))?;
        }

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| AppError::Internal(format!("Cannot write {}: {}", self.path.display(), e)))
    }
}

#[async_trait::async_trait]
impl TagVectorSource for JsonTagVectorFile {
    async fn load(&self) -> AppResult<Option<HashMap<String, Vec<f32>>>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Configuration(format!(
                    "Cannot read tag vectors from {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let raw = serde_json::from_str(&contents).map_err(|e| {
            AppError::Configuration(format!(
                "Malformed tag vectors in {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(Some(raw))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Loads the tag vector table. A missing source yields an empty table, which disables
/// semantic re-scoring without failing startup; a malformed one is a configuration error.
pub async fn load_tag_vectors(source: &dyn TagVectorSource) -> AppResult<TagVectors> {
    match source.load().await? {
        Some(raw) => {
            let vectors = TagVectors::from_entries(raw)?;
            tracing::info!(
                source = %source.describe(),
                tags = vectors.len(),
                dimension = ?vectors.dimension(),
                "Loaded tag vectors"
            );
            Ok(vectors)
        }
        None => {
            tracing::warn!(
                source = %source.describe(),
                "Tag vectors not found, semantic re-scoring disabled"
            );
            Ok(TagVectors::empty())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_keys_are_normalized() {
        let vectors = TagVectors::from_entries(vec![
            ("  Dark Comedy ".to_string(), vec![1.0, 0.0]),
            ("x".to_string(), vec![0.0, 1.0]),
        ])
        .unwrap();

        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors.dimension(), Some(2));
        assert_eq!(vectors.get("dark comedy"), Some(&[1.0, 0.0][..]));
        assert_eq!(vectors.get("Dark Comedy"), Some(&[1.0, 0.0][..]));
        assert_eq!(vectors.get("x"), None);
    }

    #[test]
    fn test_dimension_mismatch_is_configuration_error() {
        let err = TagVectors::from_entries(vec![
            ("heist".to_string(), vec![1.0, 0.0]),
            ("noir".to_string(), vec![1.0, 0.0, 0.5]),
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_empty_vector_is_configuration_error() {
        let err = TagVectors::from_entries(vec![("heist".to_string(), vec![])]).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_missing_file_yields_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonTagVectorFile::new(dir.path().join("tagEmbeddings.json"));

        let vectors = load_tag_vectors(&source).await.unwrap();
        assert!(vectors.is_empty());
        assert_eq!(vectors.dimension(), None);
    }

    #[tokio::test]
    async fn test_malformed_file_is_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"heist\": [1.0, \"oops\"]}}").unwrap();

        let source = JsonTagVectorFile::new(file.path());
        let err = load_tag_vectors(&source).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonTagVectorFile::new(dir.path().join("nested").join("tags.json"));

        let mut table = BTreeMap::new();
        table.insert("time travel".to_string(), vec![0.5, 0.5, 0.0]);
        table.insert("space".to_string(), vec![0.0, 1.0, 0.0]);
        source.save(&table).await.unwrap();

        let vectors = load_tag_vectors(&source).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors.dimension(), Some(3));
        assert_eq!(vectors.get("space"), Some(&[0.0, 1.0, 0.0][..]));
    }
}

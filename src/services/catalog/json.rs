use std::path::PathBuf;

use super::CatalogSource;
use crate::{
    error::{AppError, AppResult},
    models::Movie,
};

/// Catalog stored as a JSON array of movie records (`moviesFull.json`)
#[derive(Debug, Clone)]
pub struct JsonCatalogFile {
    path: PathBuf,
}

impl JsonCatalogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl CatalogSource for JsonCatalogFile {
    async fn load(&self) -> AppResult<Vec<Movie>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::Configuration(format!(
                "Cannot read catalog {}: {}",
                self.path.display(),
                e
            ))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            AppError::Configuration(format!(
                "Malformed catalog {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

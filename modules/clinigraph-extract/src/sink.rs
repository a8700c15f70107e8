use std::path::{Path, PathBuf};

use async_trait::async_trait;
use clinigraph_common::GraphDocument;
use tracing::info;

use crate::error::PersistError;
use crate::schema::validate_document;

/// Destination for a finished document.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Persist `document`, returning where it went.
    async fn write(&self, document: &GraphDocument) -> Result<PathBuf, PersistError>;
}

/// Writes the document as pretty-printed JSON in a single write.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentSink for JsonFileSink {
    async fn write(&self, document: &GraphDocument) -> Result<PathBuf, PersistError> {
        validate_document(document)?;
        let json = serde_json::to_string_pretty(document)?;

        let io_error = |source: std::io::Error| PersistError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(&self.path, json).await.map_err(io_error)?;

        info!(path = %self.path.display(), nodes = document.nodes.len(), "Wrote knowledge graph");
        Ok(self.path.clone())
    }
}

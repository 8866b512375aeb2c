use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::document::DocumentError;
use crate::error::{IndexError, LoadError};
use crate::index::{IndexBuilder, VectorIndex};
use crate::storage;

/// A named collection: where its index lives and which files it is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    pub persist_dir: PathBuf,
    pub sources: Vec<PathBuf>,
}

impl CollectionSpec {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        persist_dir: impl Into<PathBuf>,
        sources: Vec<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            persist_dir: persist_dir.into(),
            sources,
        }
    }
}

/// How the returned indexes were obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Every collection was loaded from its persist directory.
    Loaded,
    /// Every collection was rebuilt from sources and persisted again.
    Rebuilt { reason: String },
}

#[derive(Debug)]
pub struct AcquiredIndexes {
    pub indexes: BTreeMap<String, VectorIndex>,
    pub outcome: AcquireOutcome,
}

/// Fatal acquisition failures. Load misses never surface here.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("duplicate collection name: {0}")]
    DuplicateCollection(String),

    #[error("failed to read sources for collection {collection}: {source}")]
    Documents {
        collection: String,
        source: DocumentError,
    },

    #[error("failed to build index for collection {collection}: {source}")]
    Build {
        collection: String,
        source: IndexError,
    },

    #[error("failed to persist index for collection {collection}: {source}")]
    Persist {
        collection: String,
        source: IndexError,
    },
}

/// Produce one index per collection.
///
/// Tries to load every collection from its persist directory, in order. If all loads
/// succeed those indexes are returned untouched. If any load misses, everything loaded
/// so far is dropped and every collection is rebuilt from its sources and persisted,
/// overwriting what was on disk. With `force_rebuild` the load phase is skipped.
///
/// # Errors
///
/// Returns an error if collection names repeat, or if reading sources, embedding, or
/// writing the persist directory fails during a rebuild. No partial result is returned.
pub async fn acquire(
    specs: &[CollectionSpec],
    builder: &IndexBuilder,
    force_rebuild: bool,
) -> Result<AcquiredIndexes, AcquireError> {
    let mut seen = BTreeSet::new();
    for spec in specs {
        if !seen.insert(spec.name.as_str()) {
            return Err(AcquireError::DuplicateCollection(spec.name.clone()));
        }
    }

    let reason = if force_rebuild {
        "rebuild requested".to_owned()
    } else {
        match load_all(specs, builder.embedding_model()).await {
            Ok(indexes) => {
                tracing::info!(collections = indexes.len(), "loaded indexes from storage");
                return Ok(AcquiredIndexes {
                    indexes,
                    outcome: AcquireOutcome::Loaded,
                });
            }
            Err((collection, e)) => {
                tracing::warn!(%collection, "index load failed, rebuilding all collections: {e}");
                format!("{collection}: {e}")
            }
        }
    };

    let indexes = rebuild_all(specs, builder).await?;
    tracing::info!(collections = indexes.len(), "rebuilt and persisted indexes");
    Ok(AcquiredIndexes {
        indexes,
        outcome: AcquireOutcome::Rebuilt { reason },
    })
}

async fn load_all(
    specs: &[CollectionSpec],
    embedding_model: &str,
) -> Result<BTreeMap<String, VectorIndex>, (String, LoadError)> {
    let mut indexes = BTreeMap::new();
    for spec in specs {
        let index = storage::load(&spec.persist_dir, &spec.name, embedding_model)
            .await
            .map_err(|e| (spec.name.clone(), e))?;
        tracing::debug!(collection = %spec.name, nodes = index.len(), "index loaded");
        indexes.insert(spec.name.clone(), index);
    }
    Ok(indexes)
}

async fn rebuild_all(
    specs: &[CollectionSpec],
    builder: &IndexBuilder,
) -> Result<BTreeMap<String, VectorIndex>, AcquireError> {
    let mut indexes = BTreeMap::new();
    for spec in specs {
        let documents =
            builder
                .load_sources(&spec.sources)
                .await
                .map_err(|source| AcquireError::Documents {
                    collection: spec.name.clone(),
                    source,
                })?;

        let index = builder
            .build(&spec.name, &documents)
            .await
            .map_err(|source| AcquireError::Build {
                collection: spec.name.clone(),
                source,
            })?;

        storage::persist(&index, &spec.persist_dir)
            .await
            .map_err(|source| AcquireError::Persist {
                collection: spec.name.clone(),
                source,
            })?;

        tracing::info!(
            collection = %spec.name,
            nodes = index.len(),
            dir = %spec.persist_dir.display(),
            "index persisted"
        );
        indexes.insert(spec.name.clone(), index);
    }
    Ok(indexes)
}
